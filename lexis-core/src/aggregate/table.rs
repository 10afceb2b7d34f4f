//! Keyed tables and the outer merge join that combines them.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use lexis_types::{
    CategoryId, DocId, Document, DocumentHits, GroupBy, GroupKey, LexisError, MatchedToken,
    Position, Result, ScoredGroup, NEGATIVE, POSITIVE,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::aggregate::keyer::GroupKeyer;
use crate::analyzer::stream::TokenStream;

/// Anything the matcher emits: an attributable set of category hits.
pub trait Attributed {
    /// Originating document.
    fn doc(&self) -> DocId;
    /// Position used for window attribution.
    fn position(&self) -> Position;
    /// Calls `f(category, occurrences, contribution)` for every hit.
    fn for_each_hit<F: FnMut(CategoryId, u64, f64)>(&self, f: F);
}

impl Attributed for MatchedToken {
    #[inline(always)]
    fn doc(&self) -> DocId {
        self.doc
    }

    #[inline(always)]
    fn position(&self) -> Position {
        self.position
    }

    #[inline]
    fn for_each_hit<F: FnMut(CategoryId, u64, f64)>(&self, mut f: F) {
        for hit in &self.hits {
            f(hit.category, 1, hit.contribution);
        }
    }
}

impl Attributed for DocumentHits {
    #[inline(always)]
    fn doc(&self) -> DocId {
        self.doc
    }

    #[inline(always)]
    fn position(&self) -> Position {
        self.position
    }

    #[inline]
    fn for_each_hit<F: FnMut(CategoryId, u64, f64)>(&self, mut f: F) {
        for &(category, n) in &self.counts {
            f(category, u64::from(n), f64::from(n));
        }
    }
}

/// Token counts per group key, all tokens included. Sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTotals {
    rows: Vec<(GroupKey, u64)>,
}

impl GroupTotals {
    /// Counts every token of `stream` under its group key.
    ///
    /// A document's tokens occupy a contiguous position range, so counts
    /// are added per document (split across windows in index mode) rather
    /// than per token. Groups with no tokens do not appear.
    pub fn build(documents: &[Document], stream: &TokenStream, keyer: &GroupKeyer) -> Result<Self> {
        let mut counts: FxHashMap<GroupKey, u64> = FxHashMap::default();

        for (doc_id, doc) in documents.iter().enumerate() {
            let doc_id = doc_id as DocId;
            let len = u64::from(stream.doc_token_count(doc_id));
            if len == 0 {
                continue;
            }
            let Some(start) = stream.doc_start(doc_id) else {
                continue;
            };

            if keyer.group_by() == GroupBy::Index {
                let end = start + len;
                let width = keyer.index_width();
                let mut from = start;
                while from < end {
                    let window_end = (keyer.window(from) + 1) * width;
                    let to = end.min(window_end);
                    *counts.entry(keyer.key(doc, from)?).or_insert(0) += to - from;
                    from = to;
                }
            } else {
                *counts.entry(keyer.key(doc, start)?).or_insert(0) += len;
            }
        }

        let mut rows: Vec<(GroupKey, u64)> = counts.into_iter().collect();
        rows.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        Ok(Self { rows })
    }

    /// Rows in key order.
    pub fn rows(&self) -> &[(GroupKey, u64)] {
        &self.rows
    }

    /// Total for one key.
    pub fn get(&self, key: &GroupKey) -> Option<u64> {
        self.rows
            .binary_search_by(|(k, _)| k.cmp(key))
            .ok()
            .map(|idx| self.rows[idx].1)
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when no group has tokens.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum over all groups.
    pub fn grand_total(&self) -> u64 {
        self.rows.iter().map(|(_, n)| n).sum()
    }
}

/// Hit counts and contribution sums for one group, indexed by [`CategoryId`].
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    /// Occurrences per category.
    pub counts: Vec<u64>,
    /// Contribution sum per category.
    pub scores: Vec<f64>,
}

impl Tally {
    fn zeroed(categories: usize) -> Self {
        Self {
            counts: vec![0; categories],
            scores: vec![0.0; categories],
        }
    }
}

/// Matched-hit table: one [`Tally`] per group key. Sorted by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchedTable {
    rows: Vec<(GroupKey, Tally)>,
}

impl MatchedTable {
    /// Groups matcher output by key.
    ///
    /// Hits with a category outside `0..categories` are ignored.
    pub fn build<A: Attributed>(
        items: &[A],
        documents: &[Document],
        keyer: &GroupKeyer,
        categories: usize,
    ) -> Result<Self> {
        let mut tallies: FxHashMap<GroupKey, Tally> = FxHashMap::default();

        for item in items {
            let Some(doc) = documents.get(item.doc() as usize) else {
                tracing::warn!(doc = item.doc(), "hit for unknown document");
                continue;
            };
            let tally = tallies
                .entry(keyer.key(doc, item.position())?)
                .or_insert_with(|| Tally::zeroed(categories));
            item.for_each_hit(|category, n, contribution| {
                let idx = category as usize;
                if idx < categories {
                    tally.counts[idx] += n;
                    tally.scores[idx] += contribution;
                }
            });
        }

        let mut rows: Vec<(GroupKey, Tally)> = tallies.into_iter().collect();
        rows.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        Ok(Self { rows })
    }

    /// Rows in key order.
    pub fn rows(&self) -> &[(GroupKey, Tally)] {
        &self.rows
    }

    /// Number of groups with at least one hit.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when nothing matched.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// What net sentiment is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetBasis {
    /// `positive_count - negative_count`.
    #[default]
    Counts,
    /// `positive_ratio - negative_ratio`; undefined for empty groups.
    Ratios,
}

/// Knobs for turning joined rows into [`ScoredGroup`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeriveOptions {
    /// Basis for net sentiment.
    pub net_basis: NetBasis,
    /// Fail with [`LexisError::DivisionUndefined`] instead of leaving ratios empty.
    pub strict_ratios: bool,
}

/// Full outer merge join of the totals and matched tables.
///
/// Both inputs are sorted by key, so one linear pass pairs them up. Keys only
/// in `totals` get zero for every category; keys only in `matched` get
/// `total_tokens = 0`.
pub fn join(
    totals: &GroupTotals,
    matched: MatchedTable,
    categories: &[String],
    options: DeriveOptions,
) -> Result<Vec<ScoredGroup>> {
    let polarity = polarity_ids(categories);
    let derive = |key: GroupKey, total: u64, tally: Option<Tally>| {
        derive_group(key, total, tally, categories, polarity, options)
    };

    let totals = totals.rows();
    let mut out = Vec::with_capacity(totals.len().max(matched.len()));
    let mut ti = 0usize;
    let mut matched = matched.rows.into_iter().peekable();

    while ti < totals.len() {
        let (tkey, total) = &totals[ti];
        let order = match matched.peek() {
            Some((mkey, _)) => tkey.cmp(mkey),
            None => Ordering::Less,
        };
        match order {
            Ordering::Less => {
                out.push(derive(tkey.clone(), *total, None)?);
                ti += 1;
            }
            Ordering::Greater => {
                if let Some((mkey, tally)) = matched.next() {
                    out.push(derive(mkey, 0, Some(tally))?);
                }
            }
            Ordering::Equal => {
                if let Some((mkey, tally)) = matched.next() {
                    out.push(derive(mkey, *total, Some(tally))?);
                }
                ti += 1;
            }
        }
    }

    for (mkey, tally) in matched {
        out.push(derive(mkey, 0, Some(tally))?);
    }

    Ok(out)
}

fn polarity_ids(categories: &[String]) -> Option<(usize, usize)> {
    if categories.len() != 2 {
        return None;
    }
    let pos = categories.iter().position(|c| c == POSITIVE)?;
    let neg = categories.iter().position(|c| c == NEGATIVE)?;
    Some((pos, neg))
}

fn derive_group(
    key: GroupKey,
    total_tokens: u64,
    tally: Option<Tally>,
    categories: &[String],
    polarity: Option<(usize, usize)>,
    options: DeriveOptions,
) -> Result<ScoredGroup> {
    let tally = tally.unwrap_or_else(|| Tally::zeroed(categories.len()));

    let counts: BTreeMap<String, u64> = categories
        .iter()
        .cloned()
        .zip(tally.counts.iter().copied())
        .collect();
    let scores: BTreeMap<String, f64> = categories
        .iter()
        .cloned()
        .zip(tally.scores.iter().copied())
        .collect();

    let ratios = if total_tokens == 0 {
        if options.strict_ratios {
            return Err(LexisError::DivisionUndefined {
                group: key.to_string(),
            });
        }
        tracing::warn!(group = %key, "group has hits but no tokens; ratios left empty");
        None
    } else {
        let total = total_tokens as f64;
        Some(
            categories
                .iter()
                .cloned()
                .zip(tally.counts.iter().map(|&n| n as f64 / total))
                .collect::<BTreeMap<String, f64>>(),
        )
    };

    let net_sentiment = polarity.and_then(|(pos, neg)| match options.net_basis {
        NetBasis::Counts => Some(tally.counts[pos] as f64 - tally.counts[neg] as f64),
        NetBasis::Ratios => {
            let total = total_tokens as f64;
            (total_tokens > 0)
                .then(|| tally.counts[pos] as f64 / total - tally.counts[neg] as f64 / total)
        }
    });

    Ok(ScoredGroup {
        key,
        counts,
        scores,
        total_tokens,
        ratios,
        net_sentiment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use lexis_types::{DateBucket, Hit};
    use smallvec::smallvec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn doc(d: u32) -> Document {
        let ts = Utc.with_ymd_and_hms(2020, 1, d, 8, 0, 0).unwrap();
        Document::new(format!("d{d}"), None, ts, "")
    }

    fn polarity() -> Vec<String> {
        vec!["positive".to_string(), "negative".to_string()]
    }

    fn matched(doc: DocId, position: Position, hits: &[(CategoryId, f64)]) -> MatchedToken {
        MatchedToken {
            doc,
            position,
            term: lexis_types::TermSpan::new(0, 1),
            hits: hits.iter().map(|&(c, v)| Hit::new(c, v)).collect(),
        }
    }

    fn tally(counts: &[u64]) -> Tally {
        Tally {
            counts: counts.to_vec(),
            scores: counts.iter().map(|&n| n as f64).collect(),
        }
    }

    fn totals(rows: Vec<(GroupKey, u64)>) -> GroupTotals {
        GroupTotals { rows }
    }

    #[test]
    fn join_zero_fills_groups_without_matches() {
        let totals = totals(vec![
            (GroupKey::date(day(1)), 10),
            (GroupKey::date(day(2)), 20),
        ]);
        let matched = MatchedTable {
            rows: vec![(GroupKey::date(day(2)), tally(&[2, 0]))],
        };

        let groups = join(&totals, matched, &polarity(), DeriveOptions::default()).unwrap();
        assert_eq!(groups.len(), 2);

        let first = &groups[0];
        assert_eq!(first.key, GroupKey::date(day(1)));
        assert_eq!(first.total_tokens, 10);
        assert_eq!(first.count("positive"), 0);
        assert_eq!(first.count("negative"), 0);
        assert_eq!(first.ratios.as_ref().unwrap()["positive"], 0.0);
        assert_eq!(first.net_sentiment, Some(0.0));

        let second = &groups[1];
        assert_eq!(second.count("positive"), 2);
        assert_eq!(second.ratios.as_ref().unwrap()["positive"], 0.1);
    }

    #[test]
    fn join_keeps_matched_only_groups_with_zero_total() {
        let totals = totals(vec![(GroupKey::date(day(2)), 5)]);
        let matched = MatchedTable {
            rows: vec![
                (GroupKey::date(day(1)), tally(&[1, 0])),
                (GroupKey::date(day(3)), tally(&[0, 1])),
            ],
        };

        let groups = join(&totals, matched.clone(), &polarity(), DeriveOptions::default()).unwrap();
        let keys: Vec<_> = groups.iter().map(|g| g.key.clone()).collect();
        assert_eq!(
            keys,
            [
                GroupKey::date(day(1)),
                GroupKey::date(day(2)),
                GroupKey::date(day(3))
            ]
        );
        assert_eq!(groups[0].total_tokens, 0);
        assert!(groups[0].ratios.is_none());
        assert_eq!(groups[0].net_sentiment, Some(1.0));

        let strict = DeriveOptions {
            strict_ratios: true,
            ..DeriveOptions::default()
        };
        assert!(matches!(
            join(&totals, matched, &polarity(), strict),
            Err(LexisError::DivisionUndefined { .. })
        ));
    }

    #[test]
    fn net_sentiment_from_counts_and_ratios() {
        let totals = totals(vec![(GroupKey::date(day(1)), 300)]);
        let table = || MatchedTable {
            rows: vec![(GroupKey::date(day(1)), tally(&[30, 45]))],
        };

        let by_counts = join(&totals, table(), &polarity(), DeriveOptions::default()).unwrap();
        assert_eq!(by_counts[0].net_sentiment, Some(-15.0));

        let opts = DeriveOptions {
            net_basis: NetBasis::Ratios,
            ..DeriveOptions::default()
        };
        let by_ratios = join(&totals, table(), &polarity(), opts).unwrap();
        assert!((by_ratios[0].net_sentiment.unwrap() - (-0.05)).abs() < 1e-12);
    }

    #[test]
    fn net_sentiment_absent_for_other_lexicons() {
        let categories = vec!["anger".to_string(), "positive".to_string(), "negative".to_string()];
        let totals = totals(vec![(GroupKey::date(day(1)), 3)]);
        let groups = join(&totals, MatchedTable::default(), &categories, DeriveOptions::default())
            .unwrap();
        assert_eq!(groups[0].net_sentiment, None);
        assert_eq!(groups[0].counts.len(), 3);
    }

    #[test]
    fn totals_split_documents_across_windows() {
        let docs = vec![doc(1), doc(1)];
        let mut stream = TokenStream::default();
        stream.begin_document(0);
        for _ in 0..7 {
            stream.push_word("w");
        }
        stream.begin_document(1);
        for _ in 0..5 {
            stream.push_word("w");
        }

        let keyer = GroupKeyer::new(GroupBy::Index, DateBucket::Day, 5).unwrap();
        let totals = GroupTotals::build(&docs, &stream, &keyer).unwrap();
        assert_eq!(
            totals.rows(),
            &[
                (GroupKey::window(day(1), 0), 5),
                (GroupKey::window(day(1), 1), 5),
                (GroupKey::window(day(1), 2), 2),
            ]
        );
        assert_eq!(totals.grand_total(), 12);
        assert_eq!(totals.get(&GroupKey::window(day(1), 2)), Some(2));
    }

    #[test]
    fn totals_skip_documents_without_tokens() {
        let docs = vec![doc(1), doc(2)];
        let mut stream = TokenStream::default();
        stream.begin_document(0);
        stream.begin_document(1);
        stream.push_word("w");

        let keyer = GroupKeyer::new(GroupBy::Date, DateBucket::Day, 1000).unwrap();
        let totals = GroupTotals::build(&docs, &stream, &keyer).unwrap();
        assert_eq!(totals.rows(), &[(GroupKey::date(day(2)), 1)]);
    }

    #[test]
    fn matched_table_counts_every_hit() {
        let docs = vec![doc(1), doc(2)];
        let items = vec![
            matched(0, 0, &[(0, 1.0), (1, 1.0)]),
            matched(0, 1, &[(0, 1.0)]),
            matched(1, 2, &[(1, 1.0)]),
        ];
        let keyer = GroupKeyer::new(GroupBy::Date, DateBucket::Day, 1000).unwrap();
        let table = MatchedTable::build(&items, &docs, &keyer, 2).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].1.counts, [2, 1]);
        assert_eq!(table.rows()[1].1.counts, [0, 1]);
    }

    #[test]
    fn document_hits_count_occurrences() {
        let docs = vec![doc(1)];
        let items = vec![DocumentHits {
            doc: 0,
            position: 0,
            counts: smallvec![(0, 3)],
        }];
        let keyer = GroupKeyer::new(GroupBy::Date, DateBucket::Day, 1000).unwrap();
        let table = MatchedTable::build(&items, &docs, &keyer, 1).unwrap();
        assert_eq!(table.rows()[0].1.counts, [3]);
        assert_eq!(table.rows()[0].1.scores, [3.0]);
    }
}
