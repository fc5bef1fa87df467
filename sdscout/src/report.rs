//! Per-invocation report of promoted documents.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::errors::ScoutError;
use crate::identifier::Identifier;

/// Timestamp layout of persisted report names.
pub const REPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// One promoted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Registry number the document was verified against.
    pub cas: Option<String>,
    /// Substance name the document was verified against.
    pub name: Option<String>,
    /// Where the document came from.
    pub provider: String,
    /// Always true for promoted documents.
    pub verified: bool,
    /// Location in verified storage.
    pub filepath: String,
    /// Source URL.
    pub url: String,
}

impl ReportEntry {
    /// Entry for a document promoted to `path`.
    #[must_use]
    pub fn promoted(identifier: &Identifier, url: &str, path: &Path) -> Self {
        Self {
            cas: identifier
                .registry_number
                .as_ref()
                .map(|n| n.as_str().to_string()),
            name: identifier.name.clone(),
            provider: url.to_string(),
            verified: true,
            filepath: path.display().to_string(),
            url: url.to_string(),
        }
    }
}

/// Ordered report entries, serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    entries: Vec<ReportEntry>,
}

impl Report {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    /// Entries in promotion order.
    #[must_use]
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was promoted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes with four-space indentation.
    pub fn to_json_pretty(&self) -> Result<String, ScoutError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(buf)
            .map_err(|e| ScoutError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    /// Parses a persisted report.
    pub fn from_json(raw: &str) -> Result<Self, ScoutError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a ReportEntry;
    type IntoIter = std::slice::Iter<'a, ReportEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Persists reports as timestamped JSON files.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// Writes into `dir`, which must exist.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes `report` as `<dir>/<timestamp>.json`.
    ///
    /// Returns `Ok(None)` for an empty report. An existing file is never
    /// overwritten; `-1`, `-2`, ... is appended to the stem instead.
    pub async fn write(
        &self,
        report: &Report,
        at: DateTime<Local>,
    ) -> Result<Option<PathBuf>, ScoutError> {
        if report.is_empty() {
            return Ok(None);
        }

        let json = report.to_json_pretty()?;
        let stamp = at.format(REPORT_TIMESTAMP_FORMAT).to_string();

        let mut attempt = 0u32;
        loop {
            let name = if attempt == 0 {
                format!("{stamp}.json")
            } else {
                format!("{stamp}-{attempt}.json")
            };
            let path = self.dir.join(name);

            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(json.as_bytes())
                        .await
                        .map_err(|e| ScoutError::storage(&path, e))?;
                    file.flush().await.map_err(|e| ScoutError::storage(&path, e))?;
                    return Ok(Some(path));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(ScoutError::storage(&path, e)),
            }
        }
    }
}
