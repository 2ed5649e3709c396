use crate::error::{ImportError, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// One decoded source row: raw text values addressed by column name.
#[derive(Debug, Clone)]
pub struct RawRecord {
    headers: Arc<Vec<String>>,
    values: Vec<String>,
}

impl RawRecord {
    pub fn new(headers: Arc<Vec<String>>, values: Vec<String>) -> Self {
        Self { headers, values }
    }

    /// Look up a logical field by an ordered list of synonym column names.
    ///
    /// Candidates are tried in priority order and the first non-empty
    /// trimmed value wins. Column names are matched against the lowercased
    /// header row, so candidates must be lowercase.
    pub fn field(&self, candidates: &[&str]) -> Option<&str> {
        for name in candidates {
            if let Some(idx) = self.headers.iter().position(|h| h == name) {
                if let Some(value) = self.values.get(idx) {
                    let value = value.trim();
                    if !value.is_empty() {
                        return Some(value);
                    }
                }
            }
        }
        None
    }

    /// Like `field`, but returns an owned value.
    pub fn field_owned(&self, candidates: &[&str]) -> Option<String> {
        self.field(candidates).map(str::to_string)
    }
}

/// Lazy reader over a delimited UTF-8 source with a header row.
///
/// Opening decodes the header eagerly; records stream one at a time. Any
/// open or decode failure is `SourceUnreadable`, which is fatal for the
/// whole run. Calling `open` again restarts from the top of the file.
#[derive(Debug)]
pub struct SourceReader {
    reader: csv::Reader<File>,
    headers: Arc<Vec<String>>,
}

impl SourceReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)
            .map_err(|e| {
                ImportError::SourceUnreadable(format!("cannot open {}: {}", path.display(), e))
            })?;

        let headers = reader
            .headers()
            .map_err(|e| {
                ImportError::SourceUnreadable(format!(
                    "cannot decode header row of {}: {}",
                    path.display(),
                    e
                ))
            })?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect::<Vec<_>>();

        Ok(Self { reader, headers: Arc::new(headers) })
    }

    /// Consume the reader, yielding records in source order.
    pub fn records(self) -> impl Iterator<Item = Result<RawRecord>> {
        let headers = self.headers;
        self.reader.into_records().map(move |row| {
            let row = row
                .map_err(|e| ImportError::SourceUnreadable(format!("cannot decode record: {}", e)))?;
            let values = row.iter().map(str::to_string).collect();
            Ok(RawRecord::new(Arc::clone(&headers), values))
        })
    }
}
