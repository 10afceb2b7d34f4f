//! Word Tokenizer Module
//!
//! This module splits normalized post text into word tokens for lexicon
//! matching. It's the second stage in the text processing pipeline, taking
//! clean, normalized text and breaking it into countable units.
//!
//! ## What It Does
//!
//! Given normalized input like `"i can't believe it's 2020!!"`, it emits each
//! retained word with its index among the retained words of the document:
//!
//! ```ignore
//! ("i", 0)
//! ("can't", 1)
//! ("believe", 2)
//! ("it's", 3)
//! ```
//!
//! `"2020"` is dropped because it has no alphabetic character, and the `!!`
//! never becomes a word at all.
//!
//! ## Steps
//!
//! 1. Split on Unicode word boundaries (UAX #29); apostrophes inside words are kept
//! 2. Keep only words containing at least one alphabetic character
//! 3. Drop stop words, when a set is configured
//!
//! ## Global Positions
//!
//! [`Tokenizer::tokenize`] reports per-document indices. Global positions are
//! assigned afterwards, in one pass over the whole corpus, by
//! [`Tokenizer::tokenize_corpus`]; they are never reset per document because
//! fixed-width windows are cut over them.
//!
//! ## Usage
//!
//! ```rust
//! use lexis_core::analyzer::tokenizer::Tokenizer;
//!
//! let tokenizer = Tokenizer::default();
//! let mut words = Vec::new();
//! tokenizer.tokenize("hello brave new world", |text, _index| words.push(text));
//! assert_eq!(words, ["hello", "brave", "new", "world"]);
//! ```

use lexis_types::{DocId, Document};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use unicode_segmentation::UnicodeSegmentation;

use crate::analyzer::normalizer::TextNormalizer;
use crate::analyzer::stopwords::StopWords;
use crate::analyzer::stream::TokenStream;

/// Returns true for words the tokenizer keeps before stop-word removal.
#[inline(always)]
pub fn has_alphabetic(word: &str) -> bool {
    word.chars().any(char::is_alphabetic)
}

/// Writes the phrase-matching form of normalized text into `out`.
///
/// Every word (no alphabetic or stop-word filtering) joined by single spaces.
/// Lexicon phrases and documents go through the same function, so a phrase
/// matches a document regardless of the punctuation between its words.
pub fn phrase_text_into(normalized: &str, out: &mut String) {
    out.clear();
    for word in normalized.unicode_words() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
}

/// Splits normalized text into filtered word tokens.
///
/// Cheap to clone and reusable across documents; holds no per-run state.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    normalizer: TextNormalizer,
    stop_words: Option<StopWords>,
}

impl Tokenizer {
    /// Creates a tokenizer.
    pub fn new(normalizer: TextNormalizer, stop_words: Option<StopWords>) -> Self {
        Self {
            normalizer,
            stop_words,
        }
    }

    /// Returns the normalizer applied by [`Tokenizer::tokenize_corpus`].
    #[inline(always)]
    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    /// Returns the configured stop words, if any.
    #[inline(always)]
    pub fn stop_words(&self) -> Option<&StopWords> {
        self.stop_words.as_ref()
    }

    /// Tokenizes normalized input and emits `(text, index)`.
    ///
    /// `index` counts retained words within this input only. After emitting a
    /// token at index `u32::MAX`, further emissions stop.
    pub fn tokenize<'n, F>(&self, normalized: &'n str, mut emit: F)
    where
        F: FnMut(&'n str, u32),
    {
        debug_assert!(
            !normalized.contains("  "),
            "tokenizer: consecutive spaces - normalizer contract violated"
        );

        let mut index = 0u32;
        for word in normalized.unicode_words() {
            if !has_alphabetic(word) {
                continue;
            }
            if self.stop_words.as_ref().is_some_and(|sw| sw.contains(word)) {
                continue;
            }
            emit(word, index);
            if index == u32::MAX {
                return;
            }
            index += 1;
        }
    }

    /// Normalizes raw text and collects its retained words.
    pub fn words(&self, text: &str) -> Vec<Box<str>> {
        let normalized = self.normalizer.normalize(text);
        let mut out = Vec::new();
        self.tokenize(&normalized, |word, _| out.push(Box::from(word)));
        out
    }

    /// Tokenizes a whole corpus in order and assigns global positions.
    ///
    /// Documents with no retained words contribute no tokens but still get a
    /// `doc_start` entry, so every document has a defined window anchor.
    pub fn tokenize_corpus(&self, documents: &[Document]) -> TokenStream {
        let mut stream = TokenStream::with_capacity(documents.len());

        #[cfg(feature = "parallel")]
        {
            let words: Vec<Vec<Box<str>>> =
                documents.par_iter().map(|doc| self.words(&doc.text)).collect();
            for (doc_id, (doc, doc_words)) in documents.iter().zip(&words).enumerate() {
                stream.begin_document(doc_id as DocId);
                for word in doc_words {
                    stream.push_word(word);
                }
                log_if_empty(&stream, doc_id as DocId, doc);
            }
        }

        #[cfg(not(feature = "parallel"))]
        {
            let mut buf = String::with_capacity(512);
            for (doc_id, doc) in documents.iter().enumerate() {
                let doc_id = doc_id as DocId;
                self.normalizer.normalize_into(&doc.text, &mut buf);
                stream.begin_document(doc_id);
                self.tokenize(&buf, |word, _| stream.push_word(word));
                log_if_empty(&stream, doc_id, doc);
            }
        }

        stream
    }
}

#[inline]
fn log_if_empty(stream: &TokenStream, doc_id: DocId, doc: &Document) {
    if stream.doc_token_count(doc_id) == 0 {
        tracing::debug!(doc = %doc.id, "document produced no tokens");
    }
}
