//! Batch Scoring Tool
//!
//! Scores a CSV corpus against a lexicon file and writes the grouped table as
//! CSV, to stdout or a file.
//!
//! ## Usage
//!
//! ```bash
//! # Bing-style polarity lexicon, grouped by date (default config)
//! ./target/release/score_corpus tweets.csv categorical bing.csv
//!
//! # AFINN scores with a config file, long layout, written to a file
//! ./target/release/score_corpus tweets.csv flat afinn.csv config.json --long --out scores.csv
//!
//! # Phrase dictionary (config must set "phrase_mode": true)
//! ./target/release/score_corpus tweets.csv phrase keywords.json phrase.json
//! ```
//!
//! With `"top_terms": N` in the config, the most frequent matched terms of each
//! category are listed in the summary and, with `--out scores.csv`, also
//! written to `scores.top_terms.csv`.
//!
//! Set `RUST_LOG=debug` for per-stage logging. The run summary is printed to
//! stderr:
//!
//! ```text
//! --------------------------------
//! Lexicon     : categorical (2 categories, 6786 entries)
//! Documents   : 120_000 (312 empty)
//! Tokens      : 1_842_113
//! Matched     : 96_004 (5.21%)
//! Groups      : 31
//! Elapsed     : 0.412 s
//! Tokens/sec  : 4_471_148
//! --------------------------------
//! ```

use std::env;
use std::fs::File;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::str::FromStr;

use lexis_core::output::{write_table, write_table_to_path, write_top_terms};
use lexis_core::{Corpus, Lexicon, LexiconKind, LexiconLookup, OutputFormat, Pipeline, PipelineConfig, ScoreTable};
use lexis_types::Result;
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "Usage: score_corpus <corpus.csv> <flat|categorical|phrase> <lexicon> [config.json] [--long] [--out <path>]";

struct Args {
    corpus: String,
    kind: LexiconKind,
    lexicon: String,
    config: Option<String>,
    format: OutputFormat,
    out: Option<String>,
}

fn parse_args(args: &[String]) -> Option<Args> {
    let mut positional = Vec::new();
    let mut format = OutputFormat::Wide;
    let mut out = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--long" => format = OutputFormat::Long,
            "--out" => out = Some(iter.next()?.clone()),
            _ => positional.push(arg.clone()),
        }
    }

    if !(3..=4).contains(&positional.len()) {
        return None;
    }
    let mut positional = positional.into_iter();
    let corpus = positional.next()?;
    let kind = LexiconKind::from_str(&positional.next()?).ok()?;
    let lexicon = positional.next()?;
    Some(Args {
        corpus,
        kind,
        lexicon,
        config: positional.next(),
        format,
        out,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(args) = parse_args(&args) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match score(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn score(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig {
            phrase_mode: args.kind == LexiconKind::Phrase,
            ..PipelineConfig::default()
        },
    };
    let lexicon = Lexicon::from_path(args.kind, &args.lexicon)?;
    let pipeline = Pipeline::new(lexicon, config)?;

    let corpus = Corpus::from_csv_path(&args.corpus)?;
    let table = pipeline.run(&corpus)?;

    match &args.out {
        Some(path) => {
            write_table_to_path(&table, args.format, path)?;
            if !table.top_terms.is_empty() {
                let path = Path::new(path).with_extension("top_terms.csv");
                write_top_terms(&table, File::create(&path)?)?;
                tracing::info!(path = %path.display(), "wrote top terms");
            }
        }
        None => write_table(&table, args.format, io::stdout().lock())?,
    }

    print_summary(pipeline.lexicon(), &table);
    if table.stats.zero_total_groups > 0 {
        tracing::warn!(
            groups = table.stats.zero_total_groups,
            "groups without tokens have empty ratios"
        );
    }
    Ok(())
}

fn print_summary(lexicon: &Lexicon, table: &ScoreTable) {
    let stats = &table.stats;
    eprintln!("--------------------------------");
    eprintln!(
        "Lexicon     : {} ({} categories, {} entries)",
        lexicon.kind(),
        table.categories.len(),
        lexicon.len()
    );
    eprintln!(
        "Documents   : {} ({} empty)",
        fmt_count(stats.documents as u64),
        stats.empty_documents
    );
    eprintln!("Tokens      : {}", fmt_count(stats.tokens as u64));
    eprintln!(
        "Matched     : {} ({:.2}%)",
        fmt_count(stats.matched as u64),
        stats.match_rate()
    );
    eprintln!("Groups      : {}", stats.groups);
    eprintln!("Elapsed     : {:.3} s", stats.elapsed.as_secs_f64());
    eprintln!("Tokens/sec  : {}", fmt_count(stats.throughput() as u64));
    if !table.top_terms.is_empty() {
        eprintln!("Top terms   :");
        for (category, terms) in &table.top_terms {
            let listed: Vec<String> = terms
                .iter()
                .map(|t| format!("{} ({})", t.term, fmt_count(t.count)))
                .collect();
            eprintln!("  {category:<10}: {}", listed.join(", "));
        }
    }
    eprintln!("--------------------------------");
}

fn fmt_count(n: u64) -> String {
    let s = n.to_string();
    let mut out = String::with_capacity(s.len() + s.len() / 3);

    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push('_');
        }
        out.push(ch);
    }

    out.chars().rev().collect()
}
