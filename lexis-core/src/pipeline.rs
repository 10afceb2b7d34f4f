//! End-to-end scoring runs.
//!
//! A run goes through these stages, each reading the previous one's output:
//!
//! ```text
//! corpus ─► tokenize ─► match (tokens | phrases) ─┐
//!              │                                  ├─► join ─► ScoreTable
//!              └──────────► totals ───────────────┘
//! ```
//!
//! Configuration and lexicon are checked when the [`Pipeline`] is built, so a
//! bad setup fails before any document is touched. Runs share no state: the
//! same corpus always produces the same table.

use std::collections::BTreeMap;
use std::time::Instant;

use lexis_types::{GroupKey, LexisError, Result, ScoredGroup};

use crate::aggregate::{aggregate, top_terms, Attributed, GroupKeyer, GroupTotals, TermCount};
use crate::analyzer::Tokenizer;
use crate::config::PipelineConfig;
use crate::corpus::Corpus;
use crate::lexicon::{Lexicon, LexiconKind, LexiconLookup};
use crate::matcher::{match_phrases, match_tokens};
use crate::stats::RunStats;

/// Result of a run: one scored row per group, sorted by key.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    /// Lexicon categories, in lexicon order.
    pub categories: Vec<String>,
    /// Scored groups, sorted by key.
    pub groups: Vec<ScoredGroup>,
    /// Most frequent matched terms per category. Empty unless requested.
    pub top_terms: BTreeMap<String, Vec<TermCount>>,
    /// Run statistics.
    pub stats: RunStats,
}

impl ScoreTable {
    /// Row for `key`, if the group exists.
    pub fn group(&self, key: &GroupKey) -> Option<&ScoredGroup> {
        self.groups
            .binary_search_by(|g| g.key.cmp(key))
            .ok()
            .map(|idx| &self.groups[idx])
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true when the run produced no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// A validated lexicon and configuration, ready to score corpora.
#[derive(Debug, Clone)]
pub struct Pipeline {
    lexicon: Lexicon,
    config: PipelineConfig,
    tokenizer: Tokenizer,
    keyer: GroupKeyer,
}

impl Pipeline {
    /// Validates `config` against `lexicon` and prepares the stages.
    ///
    /// Lexicon keys are refolded with the run's normalizer, so accented
    /// entries still match when diacritics are stripped.
    ///
    /// # Errors
    ///
    /// [`LexisError::InvalidConfig`] when the configuration is unusable with
    /// this lexicon.
    pub fn new(lexicon: Lexicon, config: PipelineConfig) -> Result<Self> {
        config.validate(lexicon.kind())?;
        if lexicon.is_empty() {
            tracing::warn!(kind = %lexicon.kind(), "lexicon has no entries; every count will be zero");
        }
        let tokenizer = config.tokenizer();
        Ok(Self {
            keyer: config.keyer()?,
            lexicon: lexicon.folded(tokenizer.normalizer()),
            tokenizer,
            config,
        })
    }

    /// The lexicon scored against.
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// The run configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Scores a corpus.
    ///
    /// # Errors
    ///
    /// - [`LexisError::EmptyCorpus`] for a corpus without documents
    /// - [`LexisError::UnknownGroupingKey`] when grouping by source and a
    ///   document has no source id
    /// - [`LexisError::DivisionUndefined`] under `strict_ratios` when a group
    ///   has hits but no tokens
    pub fn run(&self, corpus: &Corpus) -> Result<ScoreTable> {
        let started = Instant::now();
        if corpus.is_empty() {
            return Err(LexisError::EmptyCorpus);
        }
        let documents = corpus.documents();
        self.keyer.check_documents(documents)?;

        let stream = self.tokenizer.tokenize_corpus(documents);
        tracing::debug!(
            documents = documents.len(),
            tokens = stream.len(),
            "tokenized corpus"
        );

        let totals = GroupTotals::build(documents, &stream, &self.keyer)?;
        let categories = self.lexicon.categories();
        let options = self.config.derive_options();

        let (groups, matched, hits, top) = if self.lexicon.kind() == LexiconKind::Phrase {
            let items = match_phrases(documents, &self.lexicon, self.tokenizer.normalizer(), &stream);
            let groups = aggregate(&items, documents, &totals, &self.keyer, categories, options)?;
            (groups, items.len(), count_hits(&items), BTreeMap::new())
        } else {
            let items = match_tokens(&stream, &self.lexicon);
            let groups = aggregate(&items, documents, &totals, &self.keyer, categories, options)?;
            let top = if self.config.top_terms > 0 {
                top_terms(&items, &stream, categories, self.config.top_terms)
            } else {
                BTreeMap::new()
            };
            (groups, items.len(), count_hits(&items), top)
        };

        let stats = RunStats {
            documents: documents.len(),
            empty_documents: stream.empty_documents(),
            tokens: stream.len(),
            token_bytes: stream.text_bytes(),
            matched,
            hits,
            groups: groups.len(),
            zero_total_groups: groups.iter().filter(|g| g.total_tokens == 0).count(),
            elapsed: started.elapsed(),
        };
        tracing::info!(
            group_by = %self.keyer.group_by(),
            lexicon = %self.lexicon.kind(),
            documents = stats.documents,
            tokens = stats.tokens,
            matched = stats.matched,
            groups = stats.groups,
            "scoring run complete"
        );

        Ok(ScoreTable {
            categories: categories.to_vec(),
            groups,
            top_terms: top,
            stats,
        })
    }
}

fn count_hits<A: Attributed>(items: &[A]) -> u64 {
    let mut hits = 0u64;
    for item in items {
        item.for_each_hit(|_, n, _| hits += n);
    }
    hits
}

/// Scores `corpus` against `lexicon` in one call.
pub fn run(corpus: &Corpus, lexicon: Lexicon, config: PipelineConfig) -> Result<ScoreTable> {
    Pipeline::new(lexicon, config)?.run(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::NetBasis;
    use crate::analyzer::NormalizerConfig;
    use crate::config::StopWordsConfig;
    use crate::lexicon::{CategoricalLexicon, FlatLexicon, PhraseLexicon};
    use crate::output::write_wide;
    use chrono::{NaiveDate, TimeZone, Utc};
    use lexis_types::{DateBucket, Document, GroupBy};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn doc(id: &str, source: Option<&str>, d: u32, text: &str) -> Document {
        let ts = Utc.with_ymd_and_hms(2020, 1, d, 10, 0, 0).unwrap();
        Document::new(id, source.map(String::from), ts, text)
    }

    fn bing() -> Lexicon {
        CategoricalLexicon::load(
            "bing",
            [
                ("good", "positive"),
                ("great", "positive"),
                ("bad", "negative"),
                ("awful", "negative"),
            ],
        )
        .unwrap()
        .into()
    }

    fn nrc() -> Lexicon {
        CategoricalLexicon::load(
            "nrc",
            [
                ("abandon", "fear"),
                ("abandon", "negative"),
                ("abandon", "sadness"),
                ("happy", "joy"),
                ("happy", "positive"),
            ],
        )
        .unwrap()
        .into()
    }

    fn repeat(word: &str, n: usize) -> String {
        vec![word; n].join(" ")
    }

    #[test]
    fn groups_without_matches_are_zero_filled() {
        // five posts, 40 words, nothing matches; then three posts, 20 words, 2 matches
        let mut docs: Vec<Document> = (0..5)
            .map(|i| doc(&format!("a{i}"), None, 1, &repeat("neutral", 8)))
            .collect();
        docs.push(doc("b0", None, 2, &format!("{} good", repeat("filler", 6))));
        docs.push(doc("b1", None, 2, &format!("{} good", repeat("filler", 6))));
        docs.push(doc("b2", None, 2, &repeat("filler", 6)));
        let corpus = Corpus::new(docs);
        let table = run(&corpus, bing(), PipelineConfig::default()).unwrap();

        assert_eq!(table.len(), 2);
        let first = table.group(&GroupKey::date(day(1))).unwrap();
        assert_eq!(first.total_tokens, 40);
        assert_eq!(first.count("positive"), 0);
        assert_eq!(first.count("negative"), 0);
        assert_eq!(first.ratios.as_ref().unwrap()["positive"], 0.0);
        assert_eq!(first.net_sentiment, Some(0.0));

        let second = table.group(&GroupKey::date(day(2))).unwrap();
        assert_eq!(second.total_tokens, 20);
        assert_eq!(second.count("positive"), 2);
        assert_eq!(second.ratio("positive").unwrap(), 0.1);
    }

    #[test]
    fn one_date_spans_two_windows() {
        let text = format!("{} good good", repeat("word", 999));
        let corpus = Corpus::new(vec![doc("1", None, 1, &text)]);
        let config = PipelineConfig {
            group_by: GroupBy::Index,
            ..PipelineConfig::default()
        };
        let table = run(&corpus, bing(), config).unwrap();

        assert_eq!(table.len(), 2);
        let w0 = &table.groups[0];
        let w1 = &table.groups[1];
        assert_eq!(w0.key, GroupKey::window(day(1), 0));
        assert_eq!(w1.key, GroupKey::window(day(1), 1));
        assert_eq!((w0.total_tokens, w0.count("positive")), (1000, 1));
        assert_eq!((w1.total_tokens, w1.count("positive")), (1, 1));
    }

    #[test]
    fn windows_run_across_documents_and_days() {
        let corpus = Corpus::new(vec![
            doc("1", None, 1, &repeat("a", 3)),
            doc("2", None, 2, &repeat("b", 3)),
        ]);
        let config = PipelineConfig {
            group_by: GroupBy::Index,
            index_width: 4,
            ..PipelineConfig::default()
        };
        let table = run(&corpus, bing(), config).unwrap();
        let keys: Vec<GroupKey> = table.groups.iter().map(|g| g.key.clone()).collect();
        assert_eq!(
            keys,
            [
                GroupKey::window(day(1), 0),
                GroupKey::window(day(2), 0),
                GroupKey::window(day(2), 1),
            ]
        );
        let totals: Vec<u64> = table.groups.iter().map(|g| g.total_tokens).collect();
        assert_eq!(totals, [3, 1, 2]);
    }

    #[test]
    fn net_sentiment_is_positive_minus_negative() {
        let text = format!("{} {}", repeat("good", 30), repeat("bad", 45));
        let corpus = Corpus::new(vec![doc("1", None, 1, &text)]);
        let table = run(&corpus, bing(), PipelineConfig::default()).unwrap();
        assert_eq!(table.groups[0].net_sentiment, Some(-15.0));

        let config = PipelineConfig {
            net_basis: NetBasis::Ratios,
            ..PipelineConfig::default()
        };
        let table = run(&corpus, bing(), config).unwrap();
        let net = table.groups[0].net_sentiment.unwrap();
        assert!((net - (-15.0 / 75.0)).abs() < 1e-12);
    }

    #[test]
    fn multi_category_token_counts_in_each() {
        let corpus = Corpus::new(vec![doc("1", None, 1, "they abandon ship")]);
        let table = run(&corpus, nrc(), PipelineConfig::default()).unwrap();

        let group = &table.groups[0];
        assert_eq!(group.total_tokens, 3);
        assert_eq!(group.count("fear"), 1);
        assert_eq!(group.count("negative"), 1);
        assert_eq!(group.count("sadness"), 1);
        assert_eq!(group.count("joy"), 0);
        assert_eq!(group.net_sentiment, None);
        assert_eq!(table.stats.matched, 1);
        assert_eq!(table.stats.hits, 3);
    }

    #[test]
    fn flat_lexicon_sums_scores_with_last_duplicate() {
        let afinn = FlatLexicon::load("afinn", [("death", "1"), ("happy", "3"), ("death", "2")])
            .unwrap();
        let corpus = Corpus::new(vec![doc("1", None, 1, "death and a happy death")]);
        let table = run(&corpus, afinn.into(), PipelineConfig::default()).unwrap();

        let group = &table.groups[0];
        assert_eq!(table.categories, ["score"]);
        assert_eq!(group.count("score"), 3);
        assert_eq!(group.scores["score"], 7.0);
    }

    #[test]
    fn matched_counts_never_exceed_totals() {
        let corpus = Corpus::new(vec![
            doc("1", Some("a"), 1, "good good bad"),
            doc("2", Some("b"), 1, "abandon happy abandon"),
            doc("3", Some("a"), 2, "nothing to see"),
            doc("4", Some("b"), 3, "happy happy joy"),
        ]);
        for group_by in [GroupBy::Date, GroupBy::Index, GroupBy::Source, GroupBy::SourceDate] {
            let config = PipelineConfig {
                group_by,
                index_width: 2,
                ..PipelineConfig::default()
            };
            let table = run(&corpus, nrc(), config).unwrap();
            for group in &table.groups {
                for (category, &count) in &group.counts {
                    assert!(
                        count <= group.total_tokens,
                        "{group_by}: {category} {count} > {}",
                        group.total_tokens
                    );
                }
            }
        }
    }

    #[test]
    fn every_totals_key_appears_in_output() {
        let corpus = Corpus::new(vec![
            doc("1", Some("a"), 1, "good"),
            doc("2", Some("b"), 1, "plain"),
            doc("3", Some("a"), 2, "plain"),
        ]);
        let config = PipelineConfig {
            group_by: GroupBy::SourceDate,
            ..PipelineConfig::default()
        };
        let table = run(&corpus, bing(), config).unwrap();
        let keys: Vec<GroupKey> = table.groups.iter().map(|g| g.key.clone()).collect();
        assert_eq!(
            keys,
            [
                GroupKey::source_date("a", day(1)),
                GroupKey::source_date("a", day(2)),
                GroupKey::source_date("b", day(1)),
            ]
        );
        assert!(table.groups.iter().all(|g| g.counts.len() == 2));
    }

    #[test]
    fn runs_are_idempotent() {
        let corpus = Corpus::new(vec![
            doc("1", Some("x"), 1, "good bad great"),
            doc("2", Some("y"), 2, "awful awful"),
            doc("3", Some("x"), 2, ""),
        ]);
        let config = PipelineConfig {
            group_by: GroupBy::SourceDate,
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(bing(), config).unwrap();
        let render = |table: &ScoreTable| {
            let mut buf = Vec::new();
            write_wide(table, &mut buf).unwrap();
            buf
        };
        let first = render(&pipeline.run(&corpus).unwrap());
        let second = render(&pipeline.run(&corpus).unwrap());
        assert_eq!(first, second);
        assert!(String::from_utf8(first).unwrap().lines().count() > 1);
    }

    fn folding() -> PipelineConfig {
        PipelineConfig {
            normalizer: NormalizerConfig {
                strip_diacritics: true,
                ..NormalizerConfig::default()
            },
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn accented_keys_match_when_diacritics_are_stripped() {
        let lexicon = CategoricalLexicon::load("custom", [("café", "positive"), ("naïve", "negative")])
            .unwrap();
        let corpus = Corpus::new(vec![doc("1", None, 1, "Café is naïve")]);
        let table = run(&corpus, lexicon.into(), folding()).unwrap();

        let group = &table.groups[0];
        assert_eq!(group.total_tokens, 3);
        assert_eq!(group.count("positive"), 1);
        assert_eq!(group.count("negative"), 1);
    }

    #[test]
    fn accented_phrases_match_when_diacritics_are_stripped() {
        let lexicon = PhraseLexicon::load("topics", [("food", vec!["café culture"])]).unwrap();
        let corpus = Corpus::new(vec![doc("1", None, 1, "Café culture is back")]);
        let config = PipelineConfig {
            phrase_mode: true,
            ..folding()
        };
        let table = run(&corpus, lexicon.into(), config).unwrap();
        assert_eq!(table.groups[0].count("food"), 1);
    }

    #[test]
    fn accented_stop_words_apply_when_diacritics_are_stripped() {
        let corpus = Corpus::new(vec![doc("1", None, 1, "déjà vu good")]);
        let config = PipelineConfig {
            stop_words: StopWordsConfig::Custom(vec!["Déjà".into()]),
            ..folding()
        };
        let table = run(&corpus, bing(), config).unwrap();
        assert_eq!(table.groups[0].total_tokens, 2);
    }

    #[test]
    fn week_buckets_merge_days() {
        // 2020-01-01 (Wed) and 2020-01-03 (Fri) share the ISO week starting 2019-12-30
        let corpus = Corpus::new(vec![doc("1", None, 1, "good"), doc("2", None, 3, "bad")]);
        let config = PipelineConfig {
            date_bucket: DateBucket::Week,
            ..PipelineConfig::default()
        };
        let table = run(&corpus, bing(), config).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.groups[0].key,
            GroupKey::date(NaiveDate::from_ymd_opt(2019, 12, 30).unwrap())
        );
        assert_eq!(table.groups[0].total_tokens, 2);
    }

    #[test]
    fn stop_words_shrink_totals() {
        let corpus = Corpus::new(vec![doc("1", None, 1, "the food is good")]);
        let config = PipelineConfig {
            stop_words: StopWordsConfig::English,
            ..PipelineConfig::default()
        };
        let table = run(&corpus, bing(), config).unwrap();
        assert_eq!(table.groups[0].total_tokens, 2);
        assert_eq!(table.groups[0].ratio("positive").unwrap(), 0.5);
    }

    #[test]
    fn phrase_mode_counts_documents_phrases() {
        let corpus = Corpus::new(vec![
            doc("1", None, 1, "Climate change is real. CLIMATE-CHANGE!"),
            doc("2", None, 2, "nothing relevant"),
        ]);
        let lexicon = PhraseLexicon::load("topics", [("climate", vec!["climate change"])]).unwrap();
        let config = PipelineConfig {
            phrase_mode: true,
            ..PipelineConfig::default()
        };
        let table = run(&corpus, lexicon.into(), config).unwrap();

        assert_eq!(table.categories, ["climate"]);
        assert_eq!(table.groups[0].count("climate"), 2);
        assert_eq!(table.groups[0].total_tokens, 6);
        assert_eq!(table.groups[1].count("climate"), 0);
        assert_eq!(table.stats.matched, 1);
    }

    #[test]
    fn top_terms_are_reported_on_request() {
        let corpus = Corpus::new(vec![doc("1", None, 1, "good good great bad")]);
        let config = PipelineConfig {
            top_terms: 1,
            ..PipelineConfig::default()
        };
        let table = run(&corpus, bing(), config).unwrap();
        assert_eq!(table.top_terms["positive"][0].term, "good");
        assert_eq!(table.top_terms["positive"].len(), 1);
        assert_eq!(table.top_terms["negative"][0].count, 1);
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let pipeline = Pipeline::new(bing(), PipelineConfig::default()).unwrap();
        assert!(matches!(
            pipeline.run(&Corpus::default()),
            Err(LexisError::EmptyCorpus)
        ));
    }

    #[test]
    fn missing_source_fails_before_scoring() {
        let corpus = Corpus::new(vec![doc("1", Some("a"), 1, "good"), doc("2", None, 1, "bad")]);
        let config = PipelineConfig {
            group_by: GroupBy::Source,
            ..PipelineConfig::default()
        };
        match run(&corpus, bing(), config) {
            Err(LexisError::UnknownGroupingKey { key, doc_id }) => {
                assert_eq!(key, "source_id");
                assert_eq!(doc_id, "2");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn mismatched_phrase_mode_is_a_config_error() {
        let config = PipelineConfig {
            phrase_mode: true,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            Pipeline::new(bing(), config),
            Err(LexisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn documents_without_tokens_are_tolerated() {
        let corpus = Corpus::new(vec![doc("1", None, 1, "!!! 2020"), doc("2", None, 1, "good")]);
        let table = run(&corpus, bing(), PipelineConfig::default()).unwrap();
        assert_eq!(table.stats.empty_documents, 1);
        assert_eq!(table.groups[0].total_tokens, 1);
    }
}
