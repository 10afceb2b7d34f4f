//! In-memory corpus and its CSV reader.
//!
//! Expected CSV layout (header row required, column order free):
//!
//! | column          | required | notes                                  |
//! |-----------------|----------|----------------------------------------|
//! | `text`          | yes      | raw post text                          |
//! | `created_at`    | yes      | RFC 3339, `YYYY-MM-DD HH:MM:SS[ +ZZZZ]`, or `YYYY-MM-DD` |
//! | `id`            | no       | defaults to the 1-based row number     |
//! | `source_id`     | no       | empty cells become `None`              |
//! | `*_count`       | no       | `retweet_count`, `like_count`, `reply_count`, `quote_count` |

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use lexis_types::{Document, LexisError, Result};

/// Engagement columns read into [`Document::metrics`].
pub const METRIC_COLUMNS: [&str; 4] = ["retweet_count", "like_count", "reply_count", "quote_count"];

/// Parses a `created_at` value.
///
/// Accepts RFC 3339, `%Y-%m-%d %H:%M:%S` with or without a trailing UTC
/// offset (naive times are taken as UTC), and bare `%Y-%m-%d` dates
/// (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z") {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(ts.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}

/// An ordered batch of documents. Corpus order defines token positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    /// Wraps documents in their given order.
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Appends a document.
    pub fn push(&mut self, document: Document) {
        self.documents.push(document);
    }

    /// Documents in corpus order.
    #[inline(always)]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Number of documents.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true for a corpus without documents.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Distinct source ids, sorted.
    pub fn sources(&self) -> BTreeSet<&str> {
        self.documents
            .iter()
            .filter_map(|d| d.source_id.as_deref())
            .collect()
    }

    /// Earliest and latest creation dates.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.documents.iter().map(Document::date).min()?;
        let last = self.documents.iter().map(Document::date).max()?;
        Some((first, last))
    }

    /// Reads a corpus from CSV.
    ///
    /// # Errors
    ///
    /// [`LexisError::Parse`] if a required column is missing, a row cannot be
    /// read, a timestamp is not recognized, or a metric is not an integer.
    pub fn from_csv_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv
            .headers()
            .map_err(|e| LexisError::parse(source_name, e))?
            .clone();
        let column = |name: &str| headers.iter().position(|h| h == name);
        let required = |name: &str| {
            column(name).ok_or_else(|| {
                LexisError::parse(source_name, format!("missing required column '{name}'"))
            })
        };

        let text_col = required("text")?;
        let created_col = required("created_at")?;
        let id_col = column("id");
        let source_col = column("source_id");
        let metric_cols: Vec<(&str, usize)> = METRIC_COLUMNS
            .iter()
            .filter_map(|&name| column(name).map(|idx| (name, idx)))
            .collect();

        let mut documents = Vec::new();
        for (row, record) in csv.records().enumerate() {
            let row = row + 1;
            let record = record.map_err(|e| LexisError::parse(source_name, e))?;
            let cell = |idx: usize| record.get(idx).unwrap_or_default();

            let created_raw = cell(created_col);
            let created_at = parse_timestamp(created_raw).ok_or_else(|| {
                LexisError::parse(
                    source_name,
                    format!("row {row}: unrecognized created_at '{created_raw}'"),
                )
            })?;

            let id = match id_col.map(cell).map(str::trim) {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => row.to_string(),
            };
            let source_id = source_col
                .map(cell)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from);

            let mut doc = Document::new(id, source_id, created_at, cell(text_col));
            for &(name, idx) in &metric_cols {
                let raw = cell(idx).trim();
                if raw.is_empty() {
                    continue;
                }
                let value: u64 = raw.parse().map_err(|_| {
                    LexisError::parse(source_name, format!("row {row}: invalid {name} '{raw}'"))
                })?;
                doc.metrics.insert(name.to_string(), value);
            }
            documents.push(doc);
        }

        tracing::debug!(source = source_name, documents = documents.len(), "corpus loaded");
        Ok(Self { documents })
    }

    /// Reads a corpus CSV file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::from_csv_reader(File::open(path)?, &path.display().to_string())
    }
}

impl From<Vec<Document>> for Corpus {
    fn from(documents: Vec<Document>) -> Self {
        Self::new(documents)
    }
}

impl FromIterator<Document> for Corpus {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
