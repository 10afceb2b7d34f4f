//! Lexicon matching over a token stream.
//!
//! Two modes:
//!
//! - [`match_tokens`]: every token is looked up on its own; unmatched tokens
//!   are dropped and a token tagged with several categories keeps every hit.
//! - [`match_phrases`]: each document's phrase text is scanned for dictionary
//!   phrases, so multi-word entries match across token boundaries.

use lexis_types::{CategoryId, DocId, Document, DocumentHits, MatchedToken};
use smallvec::SmallVec;

use crate::analyzer::normalizer::TextNormalizer;
use crate::analyzer::stream::TokenStream;
use crate::analyzer::tokenizer::phrase_text_into;
use crate::lexicon::LexiconLookup;

/// Looks up every token of `stream` in `lexicon`.
///
/// Output is in position order.
pub fn match_tokens<L>(stream: &TokenStream, lexicon: &L) -> Vec<MatchedToken>
where
    L: LexiconLookup + ?Sized,
{
    let matched: Vec<MatchedToken> = stream
        .tokens()
        .iter()
        .filter_map(|token| {
            let hits = lexicon.lookup(stream.text(token))?;
            if hits.is_empty() {
                return None;
            }
            Some(MatchedToken {
                doc: token.doc,
                position: token.position,
                term: token.term,
                hits,
            })
        })
        .collect();

    tracing::debug!(
        tokens = stream.len(),
        matched = matched.len(),
        "token matching done"
    );
    matched
}

/// Scans every document for dictionary phrases.
///
/// Hits are attributed to the document's first token position so that
/// windowed grouping places them next to the document's tokens. Documents
/// without any hit produce no entry.
pub fn match_phrases<L>(
    documents: &[Document],
    lexicon: &L,
    normalizer: &TextNormalizer,
    stream: &TokenStream,
) -> Vec<DocumentHits>
where
    L: LexiconLookup + ?Sized,
{
    debug_assert_eq!(documents.len(), stream.documents());

    let mut normalized = String::with_capacity(512);
    let mut phrase_text = String::with_capacity(512);
    let mut out = Vec::new();

    for (doc_id, doc) in documents.iter().enumerate() {
        let doc_id = doc_id as DocId;
        normalizer.normalize_into(&doc.text, &mut normalized);
        phrase_text_into(&normalized, &mut phrase_text);

        let matches = lexicon.match_phrases(&phrase_text);
        if matches.is_empty() {
            continue;
        }
        let Some(position) = stream.doc_start(doc_id) else {
            tracing::warn!(doc = %doc.id, "document missing from token stream");
            continue;
        };

        let mut counts: SmallVec<[(CategoryId, u32); 4]> = SmallVec::new();
        for m in matches {
            match counts.iter_mut().find(|(c, _)| *c == m.category) {
                Some((_, n)) => *n += 1,
                None => counts.push((m.category, 1)),
            }
        }
        counts.sort_unstable_by_key(|&(c, _)| c);

        out.push(DocumentHits {
            doc: doc_id,
            position,
            counts,
        });
    }

    tracing::debug!(
        documents = documents.len(),
        with_hits = out.len(),
        "phrase matching done"
    );
    out
}
