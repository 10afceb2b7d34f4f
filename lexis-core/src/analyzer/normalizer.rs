//! Text normalization for short social-media posts.

use serde::{Deserialize, Serialize};

/// HTML entities that social-media APIs leave escaped in post text.
const HTML_ENTITIES: [&str; 7] = ["&amp;", "&lt;", "&gt;", "&quot;", "&apos;", "&#39;", "&nbsp;"];

const URL_PREFIXES: [&str; 3] = ["http://", "https://", "www."];

/// Configuration options for text normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Drops whitespace-delimited chunks that start with `http://`, `https://` or `www.`.
    pub strip_urls: bool,
    /// Replaces escaped HTML entities (`&amp;`, `&lt;`, ...) with a space.
    pub strip_html_entities: bool,
    /// Drops `@handle` chunks.
    pub strip_mentions: bool,
    /// When enabled, strips diacritical marks from Latin characters.
    /// For example, "café" becomes "cafe".
    pub strip_diacritics: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            strip_urls: true,
            strip_html_entities: true,
            strip_mentions: false,
            strip_diacritics: false,
        }
    }
}

impl NormalizerConfig {
    /// Lowercasing and whitespace collapsing only.
    pub const fn plain() -> Self {
        Self {
            strip_urls: false,
            strip_html_entities: false,
            strip_mentions: false,
            strip_diacritics: false,
        }
    }
}

/// Unicode text normalizer for short social-media posts.
///
/// Performs the following operations:
/// - Converts all characters to lowercase (Unicode-aware)
/// - Collapses consecutive whitespace into single spaces
/// - Removes leading/trailing whitespace
/// - Optionally drops URLs and mentions, and blanks out HTML entities
/// - Optionally strips diacritical marks from Latin characters
///
/// The output contract is the one the tokenizer relies on: lowercase, no
/// leading or trailing space, never two spaces in a row.
///
/// # Examples
///
/// ```
/// use lexis_core::analyzer::normalizer::{NormalizerConfig, TextNormalizer};
///
/// let normalizer = TextNormalizer::default();
/// assert_eq!(normalizer.normalize("  HELLO  WORLD  "), "hello world");
/// assert_eq!(normalizer.normalize("Cats &amp; dogs https://t.co/x1"), "cats dogs");
///
/// let stripper = TextNormalizer::new(NormalizerConfig {
///     strip_diacritics: true,
///     ..NormalizerConfig::default()
/// });
/// assert_eq!(stripper.normalize("Café"), "cafe");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer {
    config: NormalizerConfig,
}

impl TextNormalizer {
    /// Creates a normalizer with the given configuration.
    pub const fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration.
    #[inline(always)]
    pub const fn config(&self) -> NormalizerConfig {
        self.config
    }

    /// Normalizes text into an existing String buffer.
    ///
    /// Clears the buffer before writing and reuses its capacity.
    pub fn normalize_into(&self, input: &str, out: &mut String) {
        out.clear();
        out.reserve(input.len());

        let NormalizerConfig {
            strip_urls,
            strip_html_entities,
            strip_mentions,
            strip_diacritics,
        } = self.config;

        for chunk in input.split_whitespace() {
            if strip_urls && is_url(chunk) {
                continue;
            }
            if strip_mentions && is_mention(chunk) {
                continue;
            }

            push_separator(out);

            let mut rest = chunk;
            while let Some(ch) = rest.chars().next() {
                if strip_html_entities && ch == '&' {
                    if let Some(len) = entity_len(rest) {
                        push_separator(out);
                        rest = &rest[len..];
                        continue;
                    }
                }
                rest = &rest[ch.len_utf8()..];

                for lowered in ch.to_lowercase() {
                    if strip_diacritics {
                        let folded = fold_latin1(lowered);
                        if folded != '\0' {
                            out.push(folded);
                        }
                    } else {
                        out.push(lowered);
                    }
                }
            }
        }

        if out.ends_with(' ') {
            out.pop();
        }
    }

    /// Normalizes text and returns a new String.
    #[inline]
    pub fn normalize(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        self.normalize_into(input, &mut out);
        out
    }

    /// Normalizes a lexicon key or stop word the way document text is folded.
    ///
    /// Lowercases, collapses whitespace and strips diacritics when enabled.
    /// URL, mention and entity stripping never apply to keys.
    pub fn normalize_key(&self, key: &str) -> String {
        let keys = TextNormalizer::new(NormalizerConfig {
            strip_diacritics: self.config.strip_diacritics,
            ..NormalizerConfig::plain()
        });
        keys.normalize(key)
    }

    /// Returns true when keys loaded with plain lowercasing need refolding.
    #[inline]
    pub const fn folds_keys(&self) -> bool {
        self.config.strip_diacritics
    }
}

#[inline(always)]
fn push_separator(out: &mut String) {
    if !out.is_empty() && !out.ends_with(' ') {
        out.push(' ');
    }
}

#[inline]
fn starts_with_ignore_ascii_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}

fn is_url(chunk: &str) -> bool {
    let chunk = chunk.trim_start_matches(|c: char| c.is_ascii_punctuation());
    URL_PREFIXES
        .iter()
        .any(|prefix| starts_with_ignore_ascii_case(chunk, prefix))
}

#[inline]
fn is_mention(chunk: &str) -> bool {
    chunk.len() > 1 && chunk.starts_with('@')
}

#[inline]
fn entity_len(rest: &str) -> Option<usize> {
    HTML_ENTITIES
        .iter()
        .find(|entity| starts_with_ignore_ascii_case(rest, entity))
        .map(|entity| entity.len())
}

/// Folds a lowercase Latin letter onto its ASCII base; combining marks become `'\0'`.
#[inline(always)]
fn fold_latin1(c: char) -> char {
    if ('\u{0300}'..='\u{036F}').contains(&c) {
        return '\0';
    }

    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' | 'ă' | 'ą' | 'æ' => 'a',
        'ç' | 'ć' | 'č' | 'ĉ' | 'ċ' => 'c',
        'ð' | 'đ' => 'd',
        'é' | 'è' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ñ' | 'ń' | 'ň' | 'ņ' => 'n',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ō' | 'ŏ' | 'ő' | 'ø' | 'œ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ý' | 'ÿ' => 'y',
        'ś' | 'š' | 'ş' | 'ß' => 's',
        'ź' | 'ž' | 'ż' => 'z',
        'ł' => 'l',
        _ => c,
    }
}
