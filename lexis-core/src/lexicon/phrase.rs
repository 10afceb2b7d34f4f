//! Phrase dictionaries: category → list of (possibly multi-word) phrases.
//!
//! Phrases are matched against a document's phrase text (see
//! [`phrase_text_into`]), never against single tokens, so
//! `"trans rights activists"` matches `"Trans-rights activists!"`.

use std::collections::BTreeMap;

use lexis_types::{CategoryId, Hits, LexisError, Result};
use memchr::memmem::Finder;

use crate::analyzer::normalizer::TextNormalizer;
use crate::analyzer::tokenizer::phrase_text_into;
use crate::lexicon::{LexiconLookup, PhraseMatch};

#[derive(Debug, Clone)]
struct PhraseEntry {
    category: CategoryId,
    finder: Finder<'static>,
}

/// Category → phrases, matched at document level.
///
/// A phrase listed twice under one category is kept once; a phrase listed
/// under two categories counts for both.
#[derive(Debug, Clone, Default)]
pub struct PhraseLexicon {
    categories: Vec<String>,
    phrases: Vec<PhraseEntry>,
}

impl PhraseLexicon {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a dictionary from `(category, phrases)` groups.
    ///
    /// Groups for the same category name are merged. Entry numbers in errors
    /// count phrases across all groups, 1-based.
    ///
    /// # Errors
    ///
    /// [`LexisError::MalformedLexicon`] if a category name is empty, a phrase
    /// contains no word, or there are more than `u16::MAX` categories.
    pub fn load<I, C, P, S>(source_name: &str, groups: I) -> Result<Self>
    where
        I: IntoIterator<Item = (C, P)>,
        C: AsRef<str>,
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexicon = Self::new();
        let mut line = 0usize;
        for (category, phrases) in groups {
            let category = category.as_ref().trim();
            if category.is_empty() {
                return Err(LexisError::malformed(source_name, line + 1, "missing category"));
            }
            for phrase in phrases {
                line += 1;
                lexicon
                    .insert(category, phrase.as_ref())
                    .map_err(|reason| LexisError::malformed(source_name, line, reason))?;
            }
        }
        Ok(lexicon)
    }

    /// Adds a phrase under `category`. Returns false if it was already there.
    pub fn insert(&mut self, category: &str, phrase: &str) -> core::result::Result<bool, String> {
        let mut normalized = String::with_capacity(phrase.len());
        phrase_text_into(&phrase.to_lowercase(), &mut normalized);
        if normalized.is_empty() {
            return Err(format!("phrase '{phrase}' in '{category}' has no words"));
        }

        let id = self.intern(category)?;
        let exists = self
            .phrases
            .iter()
            .any(|p| p.category == id && p.finder.needle() == normalized.as_bytes());
        if exists {
            return Ok(false);
        }
        self.phrases.push(PhraseEntry {
            category: id,
            finder: Finder::new(normalized.as_bytes()).into_owned(),
        });
        Ok(true)
    }

    fn intern(&mut self, category: &str) -> core::result::Result<CategoryId, String> {
        if let Some(idx) = self.categories.iter().position(|c| c == category) {
            return Ok(idx as CategoryId);
        }
        let id = CategoryId::try_from(self.categories.len())
            .map_err(|_| format!("more than {} categories", CategoryId::MAX))?;
        self.categories.push(category.to_string());
        Ok(id)
    }

    /// Refolds every phrase with `normalizer`. Phrases of one category that
    /// fold together are kept once.
    pub fn folded(self, normalizer: &TextNormalizer) -> Self {
        let mut lexicon = Self {
            categories: self.categories,
            phrases: Vec::with_capacity(self.phrases.len()),
        };
        let mut folded = String::new();
        for entry in self.phrases {
            let Ok(phrase) = core::str::from_utf8(entry.finder.needle()) else {
                continue;
            };
            phrase_text_into(&normalizer.normalize_key(phrase), &mut folded);
            let exists = lexicon
                .phrases
                .iter()
                .any(|p| p.category == entry.category && p.finder.needle() == folded.as_bytes());
            if folded.is_empty() || exists {
                continue;
            }
            lexicon.phrases.push(PhraseEntry {
                category: entry.category,
                finder: Finder::new(folded.as_bytes()).into_owned(),
            });
        }
        lexicon
    }

    /// Phrases of one category in insertion order.
    pub fn phrases(&self, category: &str) -> Vec<&str> {
        let Some(id) = self.categories.iter().position(|c| c == category) else {
            return Vec::new();
        };
        self.phrases
            .iter()
            .filter(|p| p.category as usize == id)
            .filter_map(|p| core::str::from_utf8(p.finder.needle()).ok())
            .collect()
    }

    /// Converts the dictionary back to its JSON shape.
    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        self.categories
            .iter()
            .map(|c| (c.clone(), self.phrases(c).into_iter().map(String::from).collect()))
            .collect()
    }
}

impl LexiconLookup for PhraseLexicon {
    fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Phrase dictionaries are not token-level lexicons.
    fn lookup(&self, _term: &str) -> Option<Hits> {
        None
    }

    fn match_phrases(&self, phrase_text: &str) -> Vec<PhraseMatch> {
        let haystack = phrase_text.as_bytes();
        let mut matches = Vec::new();
        for entry in &self.phrases {
            let len = entry.finder.needle().len();
            for start in entry.finder.find_iter(haystack) {
                let end = start + len;
                // starts and ends on a word edge: the text is single-space separated
                let at_start = start == 0 || haystack[start - 1] == b' ';
                let at_end = end == haystack.len() || haystack[end] == b' ';
                if at_start && at_end {
                    matches.push(PhraseMatch {
                        category: entry.category,
                        start,
                        end,
                    });
                }
            }
        }
        matches.sort_unstable_by_key(|m| (m.start, m.category, m.end));
        matches
    }

    fn len(&self) -> usize {
        self.phrases.len()
    }
}
