//! Categorical lexicons: word → set of category labels (Bing, NRC, custom lists).

use lexis_types::{CategoryId, Hit, Hits, LexisError, Result};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::analyzer::normalizer::TextNormalizer;
use crate::lexicon::flat::warn_skipped;
use crate::lexicon::{is_multi_word, normalize_key, LexiconLookup};

/// Word → categories, loaded from one row per (word, category) pair.
///
/// Duplicate keys merge: a word listed under several categories matches all
/// of them, and a repeated (word, category) row is stored once. Categories
/// are numbered in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct CategoricalLexicon {
    entries: FxHashMap<Box<str>, SmallVec<[CategoryId; 4]>>,
    categories: Vec<String>,
    category_ids: FxHashMap<String, CategoryId>,
}

impl CategoricalLexicon {
    /// Creates an empty lexicon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `(word, category)` rows given as raw strings.
    ///
    /// # Errors
    ///
    /// [`LexisError::MalformedLexicon`] if a row has an empty word or
    /// category, or the lexicon exceeds `u16::MAX` categories.
    ///
    /// Words containing whitespace are skipped with a warning.
    pub fn load<I, K, V>(source_name: &str, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut lexicon = Self::new();
        let mut skipped = 0usize;
        for (idx, (word, category)) in rows.into_iter().enumerate() {
            let line = idx + 1;
            let word = normalize_key(word.as_ref());
            if word.is_empty() {
                return Err(LexisError::malformed(source_name, line, "missing word"));
            }
            let category = category.as_ref().trim();
            if category.is_empty() {
                return Err(LexisError::malformed(
                    source_name,
                    line,
                    format!("missing category for '{word}'"),
                ));
            }
            if is_multi_word(&word) {
                tracing::debug!(source = source_name, line, word = %word, "multi-word key skipped");
                skipped += 1;
                continue;
            }
            lexicon
                .insert(&word, category)
                .map_err(|reason| LexisError::malformed(source_name, line, reason))?;
        }
        warn_skipped(source_name, skipped);
        Ok(lexicon)
    }

    /// Refolds every word with `normalizer`. Words that fold together merge
    /// their categories; category ids are unchanged.
    pub fn folded(self, normalizer: &TextNormalizer) -> Self {
        let mut entries: Vec<(Box<str>, SmallVec<[CategoryId; 4]>)> =
            self.entries.into_iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut merged: FxHashMap<Box<str>, SmallVec<[CategoryId; 4]>> = FxHashMap::default();
        for (word, tags) in entries {
            let folded = normalizer.normalize_key(&word);
            if folded.is_empty() {
                continue;
            }
            let slot = merged.entry(folded.into_boxed_str()).or_default();
            for id in tags {
                if !slot.contains(&id) {
                    slot.push(id);
                }
            }
        }
        Self {
            entries: merged,
            categories: self.categories,
            category_ids: self.category_ids,
        }
    }

    /// Tags `word` with `category`. Returns false if the pair already existed.
    pub fn insert(&mut self, word: &str, category: &str) -> core::result::Result<bool, String> {
        let id = self.intern(category)?;
        let tags = self
            .entries
            .entry(normalize_key(word).into_boxed_str())
            .or_default();
        if tags.contains(&id) {
            return Ok(false);
        }
        tags.push(id);
        Ok(true)
    }

    fn intern(&mut self, category: &str) -> core::result::Result<CategoryId, String> {
        if let Some(&id) = self.category_ids.get(category) {
            return Ok(id);
        }
        let id = CategoryId::try_from(self.categories.len())
            .map_err(|_| format!("more than {} categories", CategoryId::MAX))?;
        self.categories.push(category.to_string());
        self.category_ids.insert(category.to_string(), id);
        Ok(id)
    }

    /// Id of a category label.
    pub fn category_id(&self, category: &str) -> Option<CategoryId> {
        self.category_ids.get(category).copied()
    }

    /// Category ids a word is tagged with.
    pub fn tags(&self, word: &str) -> Option<&[CategoryId]> {
        self.entries.get(word).map(SmallVec::as_slice)
    }
}

impl LexiconLookup for CategoricalLexicon {
    fn categories(&self) -> &[String] {
        &self.categories
    }

    #[inline]
    fn lookup(&self, term: &str) -> Option<Hits> {
        let tags = self.entries.get(term)?;
        Some(tags.iter().map(|&id| Hit::new(id, 1.0)).collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
