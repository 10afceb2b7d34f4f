//! Corpus-wide token stream.
//!
//! Built once per run by [`Tokenizer::tokenize_corpus`](super::Tokenizer::tokenize_corpus).
//! Positions are handed out by [`TokenStream::push_word`] in call order, which
//! is the sequence-assignment pass: callers feed documents in corpus order and
//! nothing else ever writes a position.

use lexis_types::{DocId, Position, TermSpan, Token};

use crate::arena::Arena;

/// All tokens of a corpus with their text and per-document bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    arena: Arena,
    tokens: Vec<Token>,
    /// First position of each document (the next free position if it has no tokens).
    doc_starts: Vec<Position>,
    /// Retained token count per document.
    doc_lens: Vec<u32>,
    next_position: Position,
}

impl TokenStream {
    /// Creates an empty stream sized for `documents` documents.
    pub fn with_capacity(documents: usize) -> Self {
        Self {
            arena: Arena::with_capacity(documents * 64),
            tokens: Vec::with_capacity(documents * 12),
            doc_starts: Vec::with_capacity(documents),
            doc_lens: Vec::with_capacity(documents),
            next_position: 0,
        }
    }

    /// Opens the next document. Documents must be opened in corpus order.
    pub(crate) fn begin_document(&mut self, doc: DocId) {
        debug_assert_eq!(doc as usize, self.doc_starts.len(), "documents out of order");
        self.doc_starts.push(self.next_position);
        self.doc_lens.push(0);
    }

    /// Appends a word to the current document and assigns its global position.
    pub(crate) fn push_word(&mut self, word: &str) {
        let Some(doc_index) = self.doc_starts.len().checked_sub(1) else {
            return;
        };
        let Some(term) = self.arena.push(word) else {
            tracing::warn!(len = word.len(), "skipping oversized token");
            return;
        };

        self.tokens.push(Token {
            term,
            doc: doc_index as DocId,
            position: self.next_position,
        });
        self.next_position += 1;
        self.doc_lens[doc_index] += 1;
    }

    /// Number of tokens in the corpus.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the corpus produced no tokens at all.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of documents seen, including ones without tokens.
    #[inline(always)]
    pub fn documents(&self) -> usize {
        self.doc_starts.len()
    }

    /// All tokens in position order.
    #[inline(always)]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Text of a token.
    #[inline(always)]
    pub fn text(&self, token: &Token) -> &str {
        self.arena.text(token.term)
    }

    /// Text behind a span taken from this stream.
    #[inline(always)]
    pub fn term(&self, span: TermSpan) -> &str {
        self.arena.text(span)
    }

    /// First position of a document.
    #[inline]
    pub fn doc_start(&self, doc: DocId) -> Option<Position> {
        self.doc_starts.get(doc as usize).copied()
    }

    /// Retained token count of a document (0 for unknown ids).
    #[inline]
    pub fn doc_token_count(&self, doc: DocId) -> u32 {
        self.doc_lens.get(doc as usize).copied().unwrap_or(0)
    }

    /// Documents that produced no tokens.
    pub fn empty_documents(&self) -> usize {
        self.doc_lens.iter().filter(|&&n| n == 0).count()
    }

    /// Bytes of token text held by the stream.
    #[inline(always)]
    pub fn text_bytes(&self) -> usize {
        self.arena.bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_continue_across_documents() {
        let mut stream = TokenStream::default();
        stream.begin_document(0);
        stream.push_word("a");
        stream.push_word("b");
        stream.begin_document(1);
        stream.begin_document(2);
        stream.push_word("c");

        let positions: Vec<Position> = stream.tokens().iter().map(|t| t.position).collect();
        assert_eq!(positions, [0, 1, 2]);
        assert_eq!(stream.doc_start(1), Some(2));
        assert_eq!(stream.doc_start(2), Some(2));
        assert_eq!(stream.doc_start(3), None);
        assert_eq!(stream.documents(), 3);
        assert_eq!(stream.empty_documents(), 1);
    }

    #[test]
    fn word_before_any_document_is_ignored() {
        let mut stream = TokenStream::default();
        stream.push_word("orphan");
        assert!(stream.is_empty());
    }

    #[test]
    fn oversized_word_does_not_consume_a_position() {
        let mut stream = TokenStream::default();
        stream.begin_document(0);
        stream.push_word(&"x".repeat(70_000));
        stream.push_word("ok");
        assert_eq!(stream.len(), 1);
        assert_eq!(stream.tokens()[0].position, 0);
        assert_eq!(stream.text(&stream.tokens()[0]), "ok");
    }
}
