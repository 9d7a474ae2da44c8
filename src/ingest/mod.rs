pub mod reconcile;
pub mod source;

pub use reconcile::{ingest, IngestReport};
pub use source::{parse_count, read_rows, read_rows_from, SourceRow};
