pub mod orchestrator;
pub mod parser;
pub mod provider;

pub use orchestrator::{Orchestrator, PassReport};
pub use parser::{parse_findings, ResearchFindings};
pub use provider::{GeminiProvider, ResearchProvider, ResearchRequest};
