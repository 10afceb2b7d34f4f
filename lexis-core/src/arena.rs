//! Bump Storage for Token Text
//!
//! Eliminates per-token allocations by storing every token's text in a single
//! contiguous buffer. Tokens refer to their text by [`TermSpan`] (offset, length).
//!
//! ## Memory Layout
//!
//! ```text
//! Arena Buffer: [the][quick][brown][fox]...[free space]
//!               ^    ^      ^      ^
//!               |    |      |      |
//! Spans:       (0,3) (3,5) (8,5) (13,3) ...
//! ```
//!
//! ## Performance
//!
//! - Allocation: O(1) amortized - append to the buffer
//! - Retrieval: O(1) - slice from buffer
//! - Memory overhead: 8 bytes per token (u32 offset + u16 len, padded)
//! - Cache efficiency: terms are stored in corpus order (good for iteration)

use lexis_types::TermSpan;

/// Append-only storage for token text.
#[derive(Debug, Clone)]
pub struct Arena {
    /// Contiguous storage buffer
    buffer: String,
    /// Number of terms pushed
    terms: usize,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    /// Creates a new empty arena.
    pub fn new() -> Self {
        Self {
            buffer: String::with_capacity(64 * 1024), // 64KB initial
            terms: 0,
        }
    }

    /// Creates a new arena with pre-allocated capacity.
    pub fn with_capacity(buffer_cap: usize) -> Self {
        Self {
            buffer: String::with_capacity(buffer_cap),
            terms: 0,
        }
    }

    /// Returns the number of terms stored.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.terms
    }

    /// Returns true if no terms are stored.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.terms == 0
    }

    /// Returns the total bytes of term text stored.
    #[inline(always)]
    pub fn bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Appends a term to the arena.
    ///
    /// Returns `None` if the term is longer than `u16::MAX` bytes or the
    /// buffer would exceed `u32::MAX` bytes.
    #[inline]
    pub fn push(&mut self, text: &str) -> Option<TermSpan> {
        let len = u16::try_from(text.len()).ok()?;
        let offset = u32::try_from(self.buffer.len()).ok()?;
        if offset.checked_add(u32::from(len)).is_none() {
            return None;
        }

        self.buffer.push_str(text);
        self.terms += 1;
        Some(TermSpan::new(offset, len))
    }

    /// Gets the text behind a span.
    ///
    /// Returns `None` if the span does not belong to this arena.
    #[inline(always)]
    pub fn get(&self, span: TermSpan) -> Option<&str> {
        let start = span.offset();
        self.buffer.get(start..start + span.len())
    }

    /// Gets the text behind a span, or `""` for a foreign span.
    #[inline(always)]
    pub fn text(&self, span: TermSpan) -> &str {
        self.get(span).unwrap_or_default()
    }
}
