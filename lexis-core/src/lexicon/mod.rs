//! Lexicon models.
//!
//! A lexicon comes in one of three shapes, all behind the same
//! [`LexiconLookup`] capability:
//!
//! - **Flat**: word → signed score, one implicit `"score"` category
//! - **Categorical**: word → set of category labels, contribution 1 each
//! - **Phrase**: category → phrases, matched on whole documents
//!
//! Keys are lowercased at load so they line up with tokenizer output, and
//! [`Lexicon::folded`] applies a run's diacritic folding on top. Lexicons are
//! immutable once a run starts.

mod categorical;
mod flat;
mod loader;
mod phrase;

use core::fmt;
use core::str::FromStr;

use lexis_types::{CategoryId, Hits, LexisError, NEGATIVE, POSITIVE};
use serde::{Deserialize, Serialize};

use crate::analyzer::normalizer::TextNormalizer;

pub use categorical::CategoricalLexicon;
pub use flat::FlatLexicon;
pub use phrase::PhraseLexicon;

/// Lowercases and trims a lexicon key.
#[inline]
pub(crate) fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Token-level keys are single words.
#[inline]
pub(crate) fn is_multi_word(key: &str) -> bool {
    key.contains(char::is_whitespace)
}

/// One phrase occurrence inside a document's phrase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseMatch {
    /// Category of the matched phrase.
    pub category: CategoryId,
    /// Byte offset of the first matched byte.
    pub start: usize,
    /// Byte offset one past the last matched byte.
    pub end: usize,
}

/// Lookup capability shared by every lexicon shape.
pub trait LexiconLookup {
    /// Category table; [`CategoryId`]s index into it.
    fn categories(&self) -> &[String];

    /// Token-level lookup. `None` when the term has no entry (or the
    /// lexicon does not work at token level).
    fn lookup(&self, term: &str) -> Option<Hits>;

    /// Document-level phrase matching over normalized phrase text.
    ///
    /// Token-level lexicons match nothing here.
    fn match_phrases(&self, _phrase_text: &str) -> Vec<PhraseMatch> {
        Vec::new()
    }

    /// Number of entries.
    fn len(&self) -> usize;

    /// Returns true for a lexicon without entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which shape a lexicon has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LexiconKind {
    /// `(word, score)` rows.
    Flat,
    /// `(word, category)` rows.
    Categorical,
    /// `{category: [phrase, ...]}` dictionary.
    Phrase,
}

impl fmt::Display for LexiconKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LexiconKind::Flat => "flat",
            LexiconKind::Categorical => "categorical",
            LexiconKind::Phrase => "phrase",
        })
    }
}

impl FromStr for LexiconKind {
    type Err = LexisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(LexiconKind::Flat),
            "categorical" => Ok(LexiconKind::Categorical),
            "phrase" => Ok(LexiconKind::Phrase),
            other => Err(LexisError::InvalidConfig(format!("unknown lexicon kind '{other}'"))),
        }
    }
}

/// A loaded lexicon of any shape.
#[derive(Debug, Clone)]
pub enum Lexicon {
    /// Word → score.
    Flat(FlatLexicon),
    /// Word → categories.
    Categorical(CategoricalLexicon),
    /// Category → phrases.
    Phrase(PhraseLexicon),
}

impl Lexicon {
    /// Shape of this lexicon.
    pub const fn kind(&self) -> LexiconKind {
        match self {
            Lexicon::Flat(_) => LexiconKind::Flat,
            Lexicon::Categorical(_) => LexiconKind::Categorical,
            Lexicon::Phrase(_) => LexiconKind::Phrase,
        }
    }

    fn inner(&self) -> &dyn LexiconLookup {
        match self {
            Lexicon::Flat(l) => l,
            Lexicon::Categorical(l) => l,
            Lexicon::Phrase(l) => l,
        }
    }

    /// Name of a category id.
    pub fn category_name(&self, id: CategoryId) -> Option<&str> {
        self.categories().get(id as usize).map(String::as_str)
    }

    /// Refolds every key so it lines up with `normalizer`'s token output.
    ///
    /// Identity unless the normalizer strips diacritics.
    pub fn folded(self, normalizer: &TextNormalizer) -> Self {
        if !normalizer.folds_keys() {
            return self;
        }
        match self {
            Lexicon::Flat(l) => Lexicon::Flat(l.folded(normalizer)),
            Lexicon::Categorical(l) => Lexicon::Categorical(l.folded(normalizer)),
            Lexicon::Phrase(l) => Lexicon::Phrase(l.folded(normalizer)),
        }
    }

    /// Returns true when the categories are exactly `positive` and `negative`,
    /// the only case in which net sentiment is defined.
    pub fn is_polarity(&self) -> bool {
        let cats = self.categories();
        cats.len() == 2
            && cats.iter().any(|c| c == POSITIVE)
            && cats.iter().any(|c| c == NEGATIVE)
    }
}

impl LexiconLookup for Lexicon {
    fn categories(&self) -> &[String] {
        self.inner().categories()
    }

    #[inline]
    fn lookup(&self, term: &str) -> Option<Hits> {
        self.inner().lookup(term)
    }

    fn match_phrases(&self, phrase_text: &str) -> Vec<PhraseMatch> {
        self.inner().match_phrases(phrase_text)
    }

    fn len(&self) -> usize {
        self.inner().len()
    }
}

impl From<FlatLexicon> for Lexicon {
    fn from(l: FlatLexicon) -> Self {
        Lexicon::Flat(l)
    }
}

impl From<CategoricalLexicon> for Lexicon {
    fn from(l: CategoricalLexicon) -> Self {
        Lexicon::Categorical(l)
    }
}

impl From<PhraseLexicon> for Lexicon {
    fn from(l: PhraseLexicon) -> Self {
        Lexicon::Phrase(l)
    }
}
