//! # Lexical Feature Extraction
//!
//! Turns pre-tokenized sentences into arrays of hashed attribute keys, one
//! row per token and one column per attribute.

pub mod attrs;
pub mod extractor;

pub use attrs::{word_shape, Attr};
pub use extractor::{FeatureArray, FeatureExtractor};
