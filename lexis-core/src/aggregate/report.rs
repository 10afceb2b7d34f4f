//! Top matched terms per category.

use std::collections::BTreeMap;

use lexis_types::MatchedToken;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::analyzer::stream::TokenStream;

/// How often one term matched one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermCount {
    /// Matched term.
    pub term: String,
    /// Occurrences.
    pub count: u64,
    /// Summed contribution.
    pub score: f64,
}

/// The `n` most frequent matched terms of every category.
///
/// Ordered by count descending, ties broken by term. Categories without
/// matches map to an empty list.
pub fn top_terms(
    matched: &[MatchedToken],
    stream: &TokenStream,
    categories: &[String],
    n: usize,
) -> BTreeMap<String, Vec<TermCount>> {
    let mut per_category: Vec<FxHashMap<&str, (u64, f64)>> =
        vec![FxHashMap::default(); categories.len()];

    for token in matched {
        let term = stream.term(token.term);
        for hit in &token.hits {
            if let Some(terms) = per_category.get_mut(hit.category as usize) {
                let entry = terms.entry(term).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += hit.contribution;
            }
        }
    }

    categories
        .iter()
        .zip(per_category)
        .map(|(category, terms)| {
            let mut ranked: Vec<TermCount> = terms
                .into_iter()
                .map(|(term, (count, score))| TermCount {
                    term: term.to_string(),
                    count,
                    score,
                })
                .collect();
            ranked.sort_unstable_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
            ranked.truncate(n);
            (category.clone(), ranked)
        })
        .collect()
}
