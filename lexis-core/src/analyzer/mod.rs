//! Text analysis pipeline.
//!
//! This module provides the text processing components:
//! - **Normalizer**: Cleans and lowercases raw post text
//! - **Tokenizer**: Splits normalized text into filtered word tokens
//! - **StopWords**: Word sets dropped during tokenization
//! - **TokenStream**: The corpus-wide, position-ordered token sequence

pub mod normalizer;
pub mod stopwords;
pub mod stream;
pub mod tokenizer;

pub use normalizer::{NormalizerConfig, TextNormalizer};
pub use stopwords::StopWords;
pub use stream::TokenStream;
pub use tokenizer::Tokenizer;
