//! Run statistics.

use core::fmt;
use std::time::Duration;

/// A snapshot of what one scoring run processed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    /// Documents in the corpus.
    pub documents: usize,
    /// Documents that produced no tokens.
    pub empty_documents: usize,
    /// Tokens after filtering.
    pub tokens: usize,
    /// Bytes of token text.
    pub token_bytes: usize,
    /// Matched items: tokens in token mode, documents in phrase mode.
    pub matched: usize,
    /// Category hits over all matched items.
    pub hits: u64,
    /// Output groups.
    pub groups: usize,
    /// Output groups without tokens (ratios undefined).
    pub zero_total_groups: usize,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl RunStats {
    /// Share of tokens that matched, in percent. Phrase runs count documents
    /// instead, so this is only meaningful in token mode.
    pub fn match_rate(&self) -> f64 {
        if self.tokens == 0 {
            return 0.0;
        }
        self.matched as f64 * 100.0 / self.tokens as f64
    }

    /// Tokens per second over the whole run.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.tokens as f64 / secs
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} docs ({} empty), {} tokens, {} matched, {} hits, {} groups",
            self.documents, self.empty_documents, self.tokens, self.matched, self.hits, self.groups
        )?;
        if self.zero_total_groups > 0 {
            write!(f, " ({} without tokens)", self.zero_total_groups)?;
        }
        write!(f, " in {:.3} s", self.elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_summarizes_run() {
        let stats = RunStats {
            documents: 3,
            empty_documents: 1,
            tokens: 10,
            token_bytes: 40,
            matched: 4,
            hits: 5,
            groups: 2,
            zero_total_groups: 0,
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(
            stats.to_string(),
            "3 docs (1 empty), 10 tokens, 4 matched, 5 hits, 2 groups in 1.500 s"
        );
        assert_eq!(stats.match_rate(), 40.0);
    }

    #[test]
    fn rates_on_empty_run() {
        let stats = RunStats::default();
        assert_eq!(stats.match_rate(), 0.0);
        assert_eq!(stats.throughput(), 0.0);
        assert!(!stats.to_string().contains("without tokens"));
    }
}
