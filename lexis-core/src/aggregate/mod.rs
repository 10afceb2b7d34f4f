//! Grouping and scoring of matched hits.
//!
//! Two keyed tables are built from a run and then combined:
//!
//! - [`GroupTotals`]: every token counted under its group key
//! - [`MatchedTable`]: hit counts and contribution sums per key and category
//!
//! [`aggregate`] joins them with a full outer merge join so every group that
//! has tokens shows up, zero-filled where nothing matched.

mod keyer;
mod report;
mod table;

use lexis_types::{Document, Result, ScoredGroup};

pub use keyer::GroupKeyer;
pub use report::{top_terms, TermCount};
pub use table::{join, Attributed, DeriveOptions, GroupTotals, MatchedTable, NetBasis, Tally};

/// Groups matcher output and joins it with `totals`.
///
/// `categories` is the lexicon's category table; every name in it appears in
/// every returned group. Output is sorted by group key.
pub fn aggregate<A: Attributed>(
    items: &[A],
    documents: &[Document],
    totals: &GroupTotals,
    keyer: &GroupKeyer,
    categories: &[String],
    options: DeriveOptions,
) -> Result<Vec<ScoredGroup>> {
    let matched = MatchedTable::build(items, documents, keyer, categories.len())?;
    tracing::debug!(
        total_groups = totals.len(),
        matched_groups = matched.len(),
        "joining tables"
    );
    join(totals, matched, categories, options)
}
