//! Tidy CSV output.
//!
//! - **Wide**: one row per group with `<category>_count`, `<category>_score`
//!   and `<category>_ratio` columns.
//! - **Long**: one row per group and category.
//!
//! Key columns (`source`, `date`, `window`) are written only when some group
//! uses them. Undefined values (ratios of empty groups, net sentiment for
//! non-polarity lexicons) are empty cells.
//!
//! [`write_top_terms`] writes the per-category term report as
//! `category,rank,term,count,score`.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use lexis_types::{GroupKey, Result, ScoredGroup};
use serde::{Deserialize, Serialize};

use crate::pipeline::ScoreTable;

/// Table layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One row per group.
    #[default]
    Wide,
    /// One row per group and category.
    Long,
}

#[derive(Debug, Clone, Copy)]
struct KeyColumns {
    source: bool,
    date: bool,
    window: bool,
}

impl KeyColumns {
    fn of(groups: &[ScoredGroup]) -> Self {
        Self {
            source: groups.iter().any(|g| g.key.source.is_some()),
            date: groups.iter().any(|g| g.key.date.is_some()),
            window: groups.iter().any(|g| g.key.window.is_some()),
        }
    }

    fn header(self, out: &mut Vec<String>) {
        if self.source {
            out.push("source".into());
        }
        if self.date {
            out.push("date".into());
        }
        if self.window {
            out.push("window".into());
        }
    }

    fn cells(self, key: &GroupKey, out: &mut Vec<String>) {
        if self.source {
            out.push(key.source.clone().unwrap_or_default());
        }
        if self.date {
            out.push(key.date.map(|d| d.to_string()).unwrap_or_default());
        }
        if self.window {
            out.push(key.window.map(|w| w.to_string()).unwrap_or_default());
        }
    }
}

fn opt_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes `table` in the given layout.
pub fn write_table<W: Write>(table: &ScoreTable, format: OutputFormat, writer: W) -> Result<()> {
    match format {
        OutputFormat::Wide => write_wide(table, writer),
        OutputFormat::Long => write_long(table, writer),
    }
}

/// Writes `table` to a file, replacing it.
pub fn write_table_to_path(
    table: &ScoreTable,
    format: OutputFormat,
    path: impl AsRef<Path>,
) -> Result<()> {
    write_table(table, format, File::create(path)?)
}

/// One row per group.
pub fn write_wide<W: Write>(table: &ScoreTable, writer: W) -> Result<()> {
    let keys = KeyColumns::of(&table.groups);
    let with_net = table.groups.iter().any(|g| g.net_sentiment.is_some());
    let mut csv = csv::Writer::from_writer(writer);

    let mut row = Vec::with_capacity(4 + table.categories.len() * 3);
    keys.header(&mut row);
    row.push("total_tokens".into());
    for category in &table.categories {
        row.push(format!("{category}_count"));
        row.push(format!("{category}_score"));
        row.push(format!("{category}_ratio"));
    }
    if with_net {
        row.push("net_sentiment".into());
    }
    csv.write_record(&row).map_err(io::Error::from)?;

    for group in &table.groups {
        row.clear();
        keys.cells(&group.key, &mut row);
        row.push(group.total_tokens.to_string());
        for category in &table.categories {
            row.push(group.count(category).to_string());
            row.push(group.scores.get(category).copied().unwrap_or(0.0).to_string());
            row.push(opt_cell(
                group.ratios.as_ref().and_then(|r| r.get(category).copied()),
            ));
        }
        if with_net {
            row.push(opt_cell(group.net_sentiment));
        }
        csv.write_record(&row).map_err(io::Error::from)?;
    }
    csv.flush()?;
    Ok(())
}

/// One row per group and category.
pub fn write_long<W: Write>(table: &ScoreTable, writer: W) -> Result<()> {
    let keys = KeyColumns::of(&table.groups);
    let mut csv = csv::Writer::from_writer(writer);

    let mut row = Vec::with_capacity(8);
    keys.header(&mut row);
    row.extend(["category", "count", "score", "ratio", "total_tokens"].map(String::from));
    csv.write_record(&row).map_err(io::Error::from)?;

    for group in &table.groups {
        for category in &table.categories {
            row.clear();
            keys.cells(&group.key, &mut row);
            row.push(category.clone());
            row.push(group.count(category).to_string());
            row.push(group.scores.get(category).copied().unwrap_or(0.0).to_string());
            row.push(opt_cell(
                group.ratios.as_ref().and_then(|r| r.get(category).copied()),
            ));
            row.push(group.total_tokens.to_string());
            csv.write_record(&row).map_err(io::Error::from)?;
        }
    }
    csv.flush()?;
    Ok(())
}

/// Writes the top-terms report, one row per category and rank (1-based).
pub fn write_top_terms<W: Write>(table: &ScoreTable, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["category", "rank", "term", "count", "score"])
        .map_err(io::Error::from)?;
    for (category, terms) in &table.top_terms {
        for (rank, term) in terms.iter().enumerate() {
            csv.write_record([
                category.clone(),
                (rank + 1).to_string(),
                term.term.clone(),
                term.count.to_string(),
                term.score.to_string(),
            ])
            .map_err(io::Error::from)?;
        }
    }
    csv.flush()?;
    Ok(())
}
