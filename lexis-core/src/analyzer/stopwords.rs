//! Stop-word sets.
//!
//! Words in a stop-word set are dropped by the tokenizer after the
//! alphabetic filter, so they count neither as matches nor towards totals.

use rustc_hash::FxHashSet;

use crate::analyzer::normalizer::TextNormalizer;

/// Bundled English list (Snowball, plus contraction fragments common in posts).
const ENGLISH: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can't", "cannot", "could", "couldn't", "did", "didn't", "do", "does", "doesn't",
    "doing", "don't", "down", "during", "each", "few", "for", "from", "further", "had", "hadn't",
    "has", "hasn't", "have", "haven't", "having", "he", "he'd", "he'll", "he's", "her", "here",
    "here's", "hers", "herself", "him", "himself", "his", "how", "how's", "i", "i'd", "i'll",
    "i'm", "i've", "if", "in", "into", "is", "isn't", "it", "it's", "its", "itself", "let's", "me",
    "more", "most", "mustn't", "my", "myself", "no", "nor", "not", "of", "off", "on", "once",
    "only", "or", "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "same",
    "shan't", "she", "she'd", "she'll", "she's", "should", "shouldn't", "so", "some", "such",
    "than", "that", "that's", "the", "their", "theirs", "them", "themselves", "then", "there",
    "there's", "these", "they", "they'd", "they'll", "they're", "they've", "this", "those",
    "through", "to", "too", "under", "until", "up", "very", "was", "wasn't", "we", "we'd",
    "we'll", "we're", "we've", "were", "weren't", "what", "what's", "when", "when's", "where",
    "where's", "which", "while", "who", "who's", "whom", "why", "why's", "will", "with", "won't",
    "would", "wouldn't", "you", "you'd", "you'll", "you're", "you've", "your", "yours",
    "yourself", "yourselves", "rt", "amp",
];

/// A set of lowercase words to drop during tokenization.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: FxHashSet<Box<str>>,
}

impl StopWords {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled English list.
    pub fn english() -> Self {
        Self::from_words(ENGLISH.iter().copied())
    }

    /// Builds a set from arbitrary words; entries are trimmed and lowercased.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .map(String::into_boxed_str)
            .collect();
        Self { words }
    }

    /// Adds one word.
    pub fn insert(&mut self, word: &str) {
        let word = word.trim().to_lowercase();
        if !word.is_empty() {
            self.words.insert(word.into_boxed_str());
        }
    }

    /// Refolds every word with `normalizer`, so the set matches folded tokens.
    pub fn folded(self, normalizer: &TextNormalizer) -> Self {
        if !normalizer.folds_keys() {
            return self;
        }
        let words = self
            .words
            .iter()
            .map(|w| normalizer.normalize_key(w))
            .filter(|w| !w.is_empty())
            .map(String::into_boxed_str)
            .collect();
        Self { words }
    }

    /// Returns true if `word` (already lowercase) is a stop word.
    #[inline(always)]
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Number of words in the set.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true for an empty set.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::normalizer::NormalizerConfig;

    #[test]
    fn english_contains_function_words() {
        let sw = StopWords::english();
        assert!(sw.contains("the"));
        assert!(sw.contains("don't"));
        assert!(sw.contains("rt"));
        assert!(!sw.contains("happy"));
    }

    #[test]
    fn custom_words_are_normalized() {
        let sw = StopWords::from_words(["  Trump ", "BIDEN", ""]);
        assert_eq!(sw.len(), 2);
        assert!(sw.contains("trump"));
        assert!(sw.contains("biden"));
    }

    #[test]
    fn folded_set_matches_stripped_tokens() {
        let normalizer = TextNormalizer::new(NormalizerConfig {
            strip_diacritics: true,
            ..NormalizerConfig::default()
        });
        let sw = StopWords::from_words(["Über", "déjà"]).folded(&normalizer);
        assert!(sw.contains("uber"));
        assert!(sw.contains("deja"));
        assert!(!sw.contains("über"));

        let kept = StopWords::from_words(["Über"]).folded(&TextNormalizer::default());
        assert!(kept.contains("über"));
    }

    #[test]
    fn insert_extends_set() {
        let mut sw = StopWords::new();
        assert!(sw.is_empty());
        sw.insert("Covid");
        sw.insert("   ");
        assert_eq!(sw.len(), 1);
        assert!(sw.contains("covid"));
    }
}
