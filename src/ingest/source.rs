//! Reading the raw attendee export. Source vendors disagree on column names,
//! so every lookup goes through an alias list; the first header that exists
//! and holds a non-empty value wins.

use crate::error::Result;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// One raw row from the attendee export, keyed by header name.
#[derive(Debug, Clone, Default)]
pub struct SourceRow {
    fields: HashMap<String, String>,
}

impl SourceRow {
    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// First non-empty value among the given column aliases, trimmed.
    /// Absence of every alias yields the blank default.
    pub fn get(&self, aliases: &[&str]) -> &str {
        for alias in aliases {
            if let Some(value) = self.fields.get(*alias) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return trimmed;
                }
            }
        }
        ""
    }

    /// Count-like field resolved through `parse_count`.
    pub fn get_count(&self, aliases: &[&str]) -> i64 {
        parse_count(self.get(aliases))
    }
}

pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<SourceRow>> {
    let file = std::fs::File::open(path.as_ref())?;
    let rows = read_rows_from(file)?;
    info!(
        "Loaded {} attendee rows from {}",
        rows.len(),
        path.as_ref().display()
    );
    Ok(rows)
}

pub fn read_rows_from<R: Read>(reader: R) -> Result<Vec<SourceRow>> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        rows.push(SourceRow { fields });
    }
    Ok(rows)
}

/// Lenient conversion of count-like source fields. Tolerates blanks,
/// comma-grouped thousands, and float-formatted integers; anything
/// unparseable resolves to 0. This never fails an ingestion run.
pub fn parse_count(value: &str) -> i64 {
    let cleaned = value.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return 0;
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f as i64)
        .unwrap_or(0)
}
