//! JSONL (JSON Lines) reading.
//!
//! Bulk imports arrive as one JSON object per line.

use std::io::{self, BufRead};
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

/// Error type for JSONL operations.
#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error at line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },
}

/// Result alias for JSONL operations.
pub type Result<T> = std::result::Result<T, JsonlError>;

/// Returns an iterator that reads records from a JSONL reader.
///
/// Each line is parsed as a JSON object. Empty lines are skipped.
pub fn read_jsonl<T: DeserializeOwned, R: BufRead>(reader: R) -> JsonlIter<T, R> {
    JsonlIter {
        reader,
        line_number: 0,
        _record: PhantomData,
    }
}

/// Iterator over JSONL-encoded records.
pub struct JsonlIter<T, R> {
    reader: R,
    line_number: usize,
    _record: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned, R: BufRead> Iterator for JsonlIter<T, R> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None, // EOF
                Ok(_) => {
                    self.line_number += 1;
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str::<T>(trimmed).map_err(|e| {
                        JsonlError::Json {
                            line: self.line_number,
                            source: e,
                        }
                    }));
                }
                Err(e) => return Some(Err(JsonlError::Io(e))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::CatalogImport;
    use crate::iteration::CachedIterable;
    use pretty_assertions::assert_eq;
    use std::io::BufReader;

    #[test]
    fn read_skips_empty_lines() {
        let data = b"{\"title\":\"A\"}\n\n{\"title\":\"B\",\"id\":4}\n";
        let records: Vec<CatalogImport> = read_jsonl(BufReader::new(data.as_slice()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, Some(4));
    }

    #[test]
    fn read_reports_line_number_on_error() {
        let data = b"{\"title\":\"A\"}\nnot-json\n";
        let results: Vec<Result<CatalogImport>> =
            read_jsonl(BufReader::new(data.as_slice())).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(JsonlError::Json { line, .. }) => assert_eq!(*line, 2),
            other => panic!("expected JSON error, got {:?}", other),
        }
    }

    #[test]
    fn parse_failure_keeps_earlier_records_replayable() {
        let data = b"{\"title\":\"A\"}\n{\"title\":\"B\"}\n{\"title\":\n{\"title\":\"D\"}\n";
        let mut records = CachedIterable::new(read_jsonl::<CatalogImport, _>(BufReader::new(
            data.as_slice(),
        )));

        let first: Vec<_> = records.try_iter().collect();
        assert_eq!(first.len(), 3);
        assert!(first[2].is_err());

        let titles: Vec<String> = records
            .try_iter()
            .map(|r| r.map(|imp| imp.title))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(titles, vec!["A".to_owned(), "B".to_owned()]);
    }
}
