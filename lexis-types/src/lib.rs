//! Core types shared across the Lexis scoring engine.
//!
//! This crate holds the plain data that flows between the stages of a
//! scoring run. Keeping it separate from `lexis-core` gives:
//!
//! - **Compact identifiers**: documents and categories are small integers
//! - **Stable ordering**: group keys sort deterministically, so output tables do too
//! - **Clean boundaries**: readers and writers can depend on the types alone

#![warn(missing_docs)]

use core::fmt;
use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Index of a document in corpus order.
///
/// Documents are identified by a 32-bit unsigned integer, matching the
/// position of the document in the corpus it was loaded from.
pub type DocId = u32;

/// Global, monotonic token ordinal.
///
/// Assigned once per run in corpus order and never reset per document.
pub type Position = u64;

/// Index into a lexicon's category table.
pub type CategoryId = u16;

/// Name of the implicit category used by flat (scored) lexicons.
pub const SCORE_CATEGORY: &str = "score";

/// Category names that enable net sentiment when they are a lexicon's only categories.
pub const POSITIVE: &str = "positive";
/// See [`POSITIVE`].
pub const NEGATIVE: &str = "negative";

/// A single short text with its metadata.
///
/// Immutable once ingested; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier supplied by the acquisition layer.
    pub id: String,
    /// Originating account or feed. Optional so missing metadata can be reported.
    pub source_id: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Raw text as posted.
    pub text: String,
    /// Engagement counts (retweets, likes, ...). Not read by the scoring engine.
    #[serde(default)]
    pub metrics: BTreeMap<String, u64>,
}

impl Document {
    /// Creates a document without engagement metrics.
    pub fn new(
        id: impl Into<String>,
        source_id: Option<String>,
        created_at: DateTime<Utc>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_id,
            created_at,
            text: text.into(),
            metrics: BTreeMap::new(),
        }
    }

    /// Adds an engagement metric.
    #[must_use]
    pub fn with_metric(mut self, name: impl Into<String>, value: u64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    /// Calendar day (UTC) the document was created on.
    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// Location of a token's text inside a token arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermSpan {
    offset: u32,
    len: u16,
}

impl TermSpan {
    /// Creates a new span.
    #[inline(always)]
    pub const fn new(offset: u32, len: u16) -> Self {
        Self { offset, len }
    }

    /// Returns the byte offset in the arena.
    #[inline(always)]
    pub const fn offset(self) -> usize {
        self.offset as usize
    }

    /// Returns the byte length.
    #[inline(always)]
    pub const fn len(self) -> usize {
        self.len as usize
    }

    /// Returns true for a zero-length span.
    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// One word of the corpus after filtering.
///
/// The token does not own its document: `doc` indexes the corpus, and the
/// text lives in the token stream's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Text location in the arena.
    pub term: TermSpan,
    /// Originating document.
    pub doc: DocId,
    /// Global ordinal.
    pub position: Position,
}

/// A single category match with its contribution.
///
/// Categorical lexicons contribute `1.0`; flat lexicons contribute the score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Matched category.
    pub category: CategoryId,
    /// Contribution towards the category's score sum.
    pub contribution: f64,
}

impl Hit {
    /// Creates a hit.
    #[inline(always)]
    pub const fn new(category: CategoryId, contribution: f64) -> Self {
        Self {
            category,
            contribution,
        }
    }
}

/// Hits produced by one lexicon lookup. Almost always 1-3 entries.
pub type Hits = SmallVec<[Hit; 4]>;

/// A token that matched at least one lexicon entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedToken {
    /// Originating document.
    pub doc: DocId,
    /// Global ordinal of the token.
    pub position: Position,
    /// Text location in the arena.
    pub term: TermSpan,
    /// Every category the token matched; never empty.
    pub hits: Hits,
}

/// Phrase hits for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHits {
    /// Originating document.
    pub doc: DocId,
    /// Position of the document's first token, used for window attribution.
    pub position: Position,
    /// Occurrence counts per category.
    pub counts: SmallVec<[(CategoryId, u32); 4]>,
}

/// Dimension(s) a run groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// Calendar date (optionally bucketed).
    #[default]
    Date,
    /// Calendar day plus a fixed-width window over global token positions.
    Index,
    /// Source id.
    Source,
    /// Source id and date.
    #[serde(alias = "source_x_date")]
    SourceDate,
}

impl GroupBy {
    /// Returns true if this grouping needs every document to carry a source id.
    #[inline(always)]
    pub const fn needs_source(self) -> bool {
        matches!(self, GroupBy::Source | GroupBy::SourceDate)
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupBy::Date => "date",
            GroupBy::Index => "index",
            GroupBy::Source => "source",
            GroupBy::SourceDate => "source_x_date",
        };
        f.write_str(name)
    }
}

/// Calendar granularity for date grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateBucket {
    /// The date itself.
    #[default]
    Day,
    /// Monday of the ISO week.
    Week,
    /// First day of the month.
    Month,
}

impl DateBucket {
    /// Maps a date onto the first day of its bucket.
    pub fn apply(self, date: NaiveDate) -> NaiveDate {
        match self {
            DateBucket::Day => date,
            DateBucket::Week => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            // day 1 exists in every month
            DateBucket::Month => date.with_day(1).unwrap_or(date),
        }
    }
}

/// Composite grouping key.
///
/// Unused dimensions are `None`. Ordering is (source, date, window), so a
/// sorted table lists each source's dates chronologically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    /// Source id dimension.
    pub source: Option<String>,
    /// Date dimension (already bucketed).
    pub date: Option<NaiveDate>,
    /// Fixed-width window index (`position / index_width`).
    pub window: Option<u64>,
}

impl GroupKey {
    /// Key for date grouping.
    pub fn date(date: NaiveDate) -> Self {
        Self {
            source: None,
            date: Some(date),
            window: None,
        }
    }

    /// Key for fixed-window grouping.
    pub fn window(date: NaiveDate, window: u64) -> Self {
        Self {
            source: None,
            date: Some(date),
            window: Some(window),
        }
    }

    /// Key for source grouping.
    pub fn source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            date: None,
            window: None,
        }
    }

    /// Key for source × date grouping.
    pub fn source_date(source: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            source: Some(source.into()),
            date: Some(date),
            window: None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if let Some(source) = &self.source {
            write!(f, "source={source}")?;
            sep = " ";
        }
        if let Some(date) = &self.date {
            write!(f, "{sep}date={date}")?;
            sep = " ";
        }
        if let Some(window) = self.window {
            write!(f, "{sep}window={window}")?;
        }
        Ok(())
    }
}

/// Scores for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredGroup {
    /// Group key.
    pub key: GroupKey,
    /// Matched-token count per category; every lexicon category is present.
    pub counts: BTreeMap<String, u64>,
    /// Sum of contributions per category (summed polarity for flat lexicons).
    pub scores: BTreeMap<String, f64>,
    /// Tokens in the group, matched or not.
    pub total_tokens: u64,
    /// `count / total_tokens` per category; `None` when `total_tokens` is 0.
    pub ratios: Option<BTreeMap<String, f64>>,
    /// Positive minus negative, present only for two-category polarity lexicons.
    pub net_sentiment: Option<f64>,
}

impl ScoredGroup {
    /// Count for `category`, zero when the category is unknown.
    pub fn count(&self, category: &str) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    /// Ratio for `category`.
    ///
    /// # Errors
    ///
    /// Returns [`LexisError::DivisionUndefined`] when the group has no tokens.
    pub fn ratio(&self, category: &str) -> Result<f64> {
        if self.total_tokens == 0 {
            return Err(LexisError::DivisionUndefined {
                group: self.key.to_string(),
            });
        }
        Ok(self.count(category) as f64 / self.total_tokens as f64)
    }
}

/// Errors raised while loading inputs or scoring a corpus.
#[derive(Debug, Error)]
pub enum LexisError {
    /// A lexicon entry lacks its key or value.
    #[error("malformed lexicon '{source_name}' at entry {line}: {reason}")]
    MalformedLexicon {
        /// File name or label of the lexicon.
        source_name: String,
        /// 1-based entry number (data rows, header excluded).
        line: usize,
        /// What is wrong with the entry.
        reason: String,
    },
    /// The corpus holds no documents.
    #[error("corpus is empty")]
    EmptyCorpus,
    /// The grouping references metadata a document does not carry.
    #[error("document '{doc_id}' has no '{key}' required by grouping")]
    UnknownGroupingKey {
        /// Missing metadata field.
        key: &'static str,
        /// Offending document.
        doc_id: String,
    },
    /// A ratio was requested for a group with zero tokens.
    #[error("ratio undefined for group [{group}]: zero total tokens")]
    DivisionUndefined {
        /// Rendered group key.
        group: String,
    },
    /// The pipeline configuration is invalid.
    #[error("configuration error: {0}")]
    InvalidConfig(String),
    /// An input could not be parsed.
    #[error("failed to parse '{source_name}': {reason}")]
    Parse {
        /// File name or label of the input.
        source_name: String,
        /// Parser message.
        reason: String,
    },
    /// Underlying IO failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LexisError {
    /// Builds a [`LexisError::Parse`] from any displayable parser error.
    pub fn parse(source_name: impl Into<String>, reason: impl fmt::Display) -> Self {
        LexisError::Parse {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Builds a [`LexisError::MalformedLexicon`].
    pub fn malformed(source_name: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        LexisError::MalformedLexicon {
            source_name: source_name.into(),
            line,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the workspace.
pub type Result<T> = core::result::Result<T, LexisError>;
