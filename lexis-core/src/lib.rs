//! Lexicon-based sentiment scoring with temporal and group aggregation.
//!
//! Documents are normalized and tokenized once, matched against a lexicon
//! (flat scores, categorical labels, or phrase dictionaries) and the hits are
//! aggregated per group: date, fixed token window, source, or source × date.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use lexis_core::{run, CategoricalLexicon, Corpus, PipelineConfig};
//! use lexis_types::{Document, GroupKey};
//!
//! let ts = Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap();
//! let corpus = Corpus::new(vec![Document::new("1", None, ts, "Good food, bad service")]);
//! let lexicon = CategoricalLexicon::load("bing", [("good", "positive"), ("bad", "negative")])?;
//!
//! let table = run(&corpus, lexicon.into(), PipelineConfig::default())?;
//! let group = table.group(&GroupKey::date(ts.date_naive())).unwrap();
//! assert_eq!(group.total_tokens, 4);
//! assert_eq!(group.net_sentiment, Some(0.0));
//! # Ok::<(), lexis_types::LexisError>(())
//! ```

#![warn(missing_docs)]

pub mod aggregate;
pub mod analyzer;
pub mod arena;
pub mod config;
pub mod corpus;
pub mod lexicon;
pub mod matcher;
pub mod output;
pub mod pipeline;
pub mod stats;

pub use aggregate::{GroupKeyer, NetBasis, TermCount};
pub use config::{PipelineConfig, StopWordsConfig};
pub use corpus::Corpus;
pub use lexicon::{CategoricalLexicon, FlatLexicon, Lexicon, LexiconKind, LexiconLookup, PhraseLexicon};
pub use output::OutputFormat;
pub use pipeline::{run, Pipeline, ScoreTable};
pub use stats::RunStats;
