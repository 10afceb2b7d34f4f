//! Flat scored lexicons: word → signed score (AFINN style).

use lexis_types::{Hit, Hits, LexisError, Result, SCORE_CATEGORY};
use rustc_hash::FxHashMap;
use smallvec::smallvec;

use crate::analyzer::normalizer::TextNormalizer;
use crate::lexicon::{is_multi_word, normalize_key, LexiconLookup};

/// Word → numeric score. Every match lands in the implicit `"score"` category.
///
/// Duplicate keys: the last entry wins.
#[derive(Debug, Clone)]
pub struct FlatLexicon {
    scores: FxHashMap<Box<str>, f64>,
    categories: Vec<String>,
}

impl Default for FlatLexicon {
    fn default() -> Self {
        Self {
            scores: FxHashMap::default(),
            categories: vec![SCORE_CATEGORY.to_string()],
        }
    }
}

impl FlatLexicon {
    /// Creates an empty lexicon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `(word, score)` entries given as raw strings.
    ///
    /// # Errors
    ///
    /// [`LexisError::MalformedLexicon`] if an entry has an empty key, an empty
    /// score, or a score that is not a finite number.
    ///
    /// Keys containing whitespace are skipped with a warning: a token is a
    /// single word, so they could never match.
    pub fn load<I, K, V>(source_name: &str, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut lexicon = Self::new();
        let mut skipped = 0usize;
        for (idx, (key, value)) in entries.into_iter().enumerate() {
            let line = idx + 1;
            let key = normalize_key(key.as_ref());
            if key.is_empty() {
                return Err(LexisError::malformed(source_name, line, "missing key"));
            }
            let value = value.as_ref().trim();
            if value.is_empty() {
                return Err(LexisError::malformed(
                    source_name,
                    line,
                    format!("missing score for '{key}'"),
                ));
            }
            let score: f64 = value.parse().map_err(|_| {
                LexisError::malformed(source_name, line, format!("invalid score '{value}' for '{key}'"))
            })?;
            if !score.is_finite() {
                return Err(LexisError::malformed(
                    source_name,
                    line,
                    format!("non-finite score for '{key}'"),
                ));
            }
            if is_multi_word(&key) {
                tracing::debug!(source = source_name, line, key = %key, "multi-word key skipped");
                skipped += 1;
                continue;
            }
            if let Some(previous) = lexicon.insert(&key, score) {
                tracing::debug!(source = source_name, key = %key, previous, score, "duplicate key overwritten");
            }
        }
        warn_skipped(source_name, skipped);
        Ok(lexicon)
    }

    /// Refolds every key with `normalizer`.
    ///
    /// Keys that fold together keep the score of the last one in byte order.
    pub fn folded(self, normalizer: &TextNormalizer) -> Self {
        let mut entries: Vec<(Box<str>, f64)> = self.scores.into_iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut scores = FxHashMap::default();
        for (key, score) in entries {
            let folded = normalizer.normalize_key(&key);
            if folded.is_empty() {
                continue;
            }
            if let Some(previous) = scores.insert(folded.into_boxed_str(), score) {
                tracing::debug!(key = %key, previous, score, "folded keys collide");
            }
        }
        Self {
            scores,
            categories: self.categories,
        }
    }

    /// Inserts or overwrites a word, returning the previous score.
    pub fn insert(&mut self, word: &str, score: f64) -> Option<f64> {
        self.scores.insert(normalize_key(word).into_boxed_str(), score)
    }

    /// Score of a word, if present.
    #[inline]
    pub fn score(&self, word: &str) -> Option<f64> {
        self.scores.get(word).copied()
    }
}

pub(crate) fn warn_skipped(source_name: &str, skipped: usize) {
    if skipped > 0 {
        tracing::warn!(
            source = source_name,
            skipped,
            "multi-word keys never match a single token; load them as a phrase dictionary"
        );
    }
}

impl LexiconLookup for FlatLexicon {
    fn categories(&self) -> &[String] {
        &self.categories
    }

    #[inline]
    fn lookup(&self, term: &str) -> Option<Hits> {
        self.score(term).map(|score| smallvec![Hit::new(0, score)])
    }

    fn len(&self) -> usize {
        self.scores.len()
    }
}
