//! File readers for lexicons.
//!
//! - Flat and categorical lexicons: two-column CSV with a header row
//!   (`word,score` / `word,category`). Extra columns are ignored.
//! - Phrase dictionaries: JSON object `{"category": ["phrase", ...]}`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use lexis_types::{LexisError, Result};
use serde_json::Value;

use crate::lexicon::{CategoricalLexicon, FlatLexicon, Lexicon, LexiconKind, PhraseLexicon};

/// Reads `(key, value)` pairs from a headed CSV table.
///
/// Missing cells come back as empty strings so the lexicon loaders can
/// report them as malformed entries with their entry number.
fn read_pairs<R: Read>(reader: R, source_name: &str) -> Result<Vec<(String, String)>> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut pairs = Vec::new();
    for record in csv.records() {
        let record = record.map_err(|e| LexisError::parse(source_name, e))?;
        let key = record.get(0).unwrap_or_default().to_string();
        let value = record.get(1).unwrap_or_default().to_string();
        pairs.push((key, value));
    }
    Ok(pairs)
}

fn source_name(path: &Path) -> String {
    path.display().to_string()
}

impl FlatLexicon {
    /// Loads a `word,score` CSV table.
    pub fn from_csv_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        Self::load(source_name, read_pairs(reader, source_name)?)
    }

    /// Loads a `word,score` CSV file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::from_csv_reader(File::open(path)?, &source_name(path))
    }
}

impl CategoricalLexicon {
    /// Loads a `word,category` CSV table.
    pub fn from_csv_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        Self::load(source_name, read_pairs(reader, source_name)?)
    }

    /// Loads a `word,category` CSV file.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::from_csv_reader(File::open(path)?, &source_name(path))
    }
}

impl PhraseLexicon {
    /// Parses a `{"category": ["phrase", ...]}` JSON dictionary.
    ///
    /// Categories are loaded in name order. A phrase that is not a JSON
    /// string is a malformed entry.
    pub fn from_json_str(json: &str, source_name: &str) -> Result<Self> {
        let raw: BTreeMap<String, Vec<Value>> =
            serde_json::from_str(json).map_err(|e| LexisError::parse(source_name, e))?;

        let mut groups = Vec::with_capacity(raw.len());
        let mut line = 0usize;
        for (category, values) in raw {
            let mut phrases = Vec::with_capacity(values.len());
            for value in values {
                line += 1;
                match value {
                    Value::String(s) => phrases.push(s),
                    other => {
                        return Err(LexisError::malformed(
                            source_name,
                            line,
                            format!("phrase in '{category}' is not a string: {other}"),
                        ))
                    }
                }
            }
            groups.push((category, phrases));
        }
        Self::load(source_name, groups)
    }

    /// Loads a JSON dictionary file.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json, &source_name(path))
    }
}

impl Lexicon {
    /// Loads a lexicon file of the given shape.
    pub fn from_path(kind: LexiconKind, path: impl AsRef<Path>) -> Result<Self> {
        let lexicon = match kind {
            LexiconKind::Flat => FlatLexicon::from_csv_path(path)?.into(),
            LexiconKind::Categorical => CategoricalLexicon::from_csv_path(path)?.into(),
            LexiconKind::Phrase => PhraseLexicon::from_json_path(path)?.into(),
        };
        Ok(lexicon)
    }
}
