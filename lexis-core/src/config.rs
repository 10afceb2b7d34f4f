//! Run configuration.
//!
//! Every field has a default, so `{}` is a valid configuration file:
//!
//! ```json
//! {
//!   "index_width": 1000,
//!   "group_by": "source_x_date",
//!   "date_bucket": "week",
//!   "stop_words": { "custom": ["rt", "via"] },
//!   "net_basis": "ratios",
//!   "normalizer": { "strip_mentions": true }
//! }
//! ```

use std::path::Path;

use lexis_types::{DateBucket, GroupBy, LexisError, Result};
use serde::{Deserialize, Serialize};

use crate::aggregate::{DeriveOptions, GroupKeyer, NetBasis};
use crate::analyzer::{NormalizerConfig, StopWords, TextNormalizer, Tokenizer};
use crate::lexicon::LexiconKind;

/// Stop-word handling.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopWordsConfig {
    /// Keep every word.
    #[default]
    None,
    /// Bundled English list.
    English,
    /// User-supplied list.
    Custom(Vec<String>),
}

impl StopWordsConfig {
    /// Builds the configured set, `None` when stop words are disabled.
    pub fn build(&self) -> Option<StopWords> {
        match self {
            StopWordsConfig::None => None,
            StopWordsConfig::English => Some(StopWords::english()),
            StopWordsConfig::Custom(words) => Some(StopWords::from_words(words)),
        }
    }
}

/// Settings for one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Tokens per window in index mode.
    pub index_width: u64,
    /// Grouping dimension(s).
    pub group_by: GroupBy,
    /// Date granularity for the date-based groupings.
    pub date_bucket: DateBucket,
    /// Stop-word removal.
    pub stop_words: StopWordsConfig,
    /// Match phrases per document instead of looking up single tokens.
    /// Must be set exactly when the lexicon is a phrase dictionary.
    pub phrase_mode: bool,
    /// Basis for net sentiment.
    pub net_basis: NetBasis,
    /// Fail instead of leaving ratios empty for groups without tokens.
    pub strict_ratios: bool,
    /// Number of top terms reported per category (token mode only, 0 disables).
    pub top_terms: usize,
    /// Text normalization.
    pub normalizer: NormalizerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            index_width: 1000,
            group_by: GroupBy::default(),
            date_bucket: DateBucket::default(),
            stop_words: StopWordsConfig::default(),
            phrase_mode: false,
            net_basis: NetBasis::default(),
            strict_ratios: false,
            top_terms: 0,
            normalizer: NormalizerConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parses a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LexisError::parse("config", e))
    }

    /// Reads a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| LexisError::parse(path.display().to_string(), e))
    }

    /// Checks the configuration on its own and against the lexicon it will run with.
    ///
    /// # Errors
    ///
    /// [`LexisError::InvalidConfig`] for a zero `index_width`, or when
    /// `phrase_mode` disagrees with the lexicon kind.
    pub fn validate(&self, lexicon: LexiconKind) -> Result<()> {
        if self.index_width == 0 {
            return Err(LexisError::InvalidConfig(
                "index_width must be greater than zero".into(),
            ));
        }
        match (self.phrase_mode, lexicon) {
            (true, LexiconKind::Phrase) | (false, LexiconKind::Flat | LexiconKind::Categorical) => {
                Ok(())
            }
            (true, kind) => Err(LexisError::InvalidConfig(format!(
                "phrase_mode requires a phrase lexicon, got {kind}"
            ))),
            (false, kind) => Err(LexisError::InvalidConfig(format!(
                "{kind} lexicon requires phrase_mode"
            ))),
        }
    }

    /// Tokenizer for this configuration.
    ///
    /// Stop words are folded with the same normalizer as the documents.
    pub fn tokenizer(&self) -> Tokenizer {
        let normalizer = TextNormalizer::new(self.normalizer);
        let stop_words = self.stop_words.build().map(|sw| sw.folded(&normalizer));
        Tokenizer::new(normalizer, stop_words)
    }

    /// Group keyer for this configuration.
    pub fn keyer(&self) -> Result<GroupKeyer> {
        GroupKeyer::new(self.group_by, self.date_bucket, self.index_width)
    }

    /// Options for deriving ratios and net sentiment.
    pub fn derive_options(&self) -> DeriveOptions {
        DeriveOptions {
            net_basis: self.net_basis,
            strict_ratios: self.strict_ratios,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_object_gives_defaults() {
        let cfg = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        assert_eq!(cfg.index_width, 1000);
        assert_eq!(cfg.group_by, GroupBy::Date);
        assert!(cfg.normalizer.strip_urls);
    }

    #[test]
    fn parses_all_fields() {
        let cfg = PipelineConfig::from_json_str(
            r#"{
                "index_width": 50,
                "group_by": "source_x_date",
                "date_bucket": "week",
                "stop_words": {"custom": ["rt"]},
                "net_basis": "ratios",
                "strict_ratios": true,
                "normalizer": {"strip_mentions": true}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.index_width, 50);
        assert_eq!(cfg.group_by, GroupBy::SourceDate);
        assert_eq!(cfg.date_bucket, DateBucket::Week);
        assert_eq!(cfg.stop_words, StopWordsConfig::Custom(vec!["rt".into()]));
        assert_eq!(cfg.net_basis, NetBasis::Ratios);
        assert!(cfg.strict_ratios);
        assert!(cfg.normalizer.strip_mentions);
        assert!(cfg.normalizer.strip_urls);
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        assert!(matches!(
            PipelineConfig::from_json_str(r#"{"index_widht": 5}"#),
            Err(LexisError::Parse { .. })
        ));
    }

    #[test]
    fn validation_rules() {
        let cfg = PipelineConfig::default();
        assert!(cfg.validate(LexiconKind::Flat).is_ok());
        assert!(cfg.validate(LexiconKind::Phrase).is_err());

        let phrase = PipelineConfig {
            phrase_mode: true,
            ..PipelineConfig::default()
        };
        assert!(phrase.validate(LexiconKind::Phrase).is_ok());
        assert!(phrase.validate(LexiconKind::Categorical).is_err());

        let zero = PipelineConfig {
            index_width: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            zero.validate(LexiconKind::Flat),
            Err(LexisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn stop_word_config_builds_sets() {
        assert!(StopWordsConfig::None.build().is_none());
        assert!(StopWordsConfig::English.build().unwrap().contains("the"));
        let custom = StopWordsConfig::Custom(vec!["RT".into()]).build().unwrap();
        assert!(custom.contains("rt"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"group_by": "index", "index_width": 10}}"#).expect("write config");
        let cfg = PipelineConfig::from_path(file.path()).unwrap();
        assert_eq!(cfg.group_by, GroupBy::Index);
        assert_eq!(cfg.keyer().unwrap().index_width(), 10);
    }
}
