pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod query;
pub mod research;
pub mod scoring;
pub mod server;
pub mod storage;

pub use error::{ProspectError, Result};
