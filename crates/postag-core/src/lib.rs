//! # postag core
//!
//! Building blocks of a part-of-speech tagger: lexical feature extraction,
//! hashed embeddings, a maxout projection, a bidirectional LSTM and a softmax
//! classifier, all on top of candle.
//!
//! ## Quick Start
//!
//! ```rust
//! use postag_core::features::FeatureExtractor;
//!
//! let extractor = FeatureExtractor::default();
//! let features = extractor.extract(&["El", "gato", "duerme"]);
//!
//! assert_eq!(features.n_tokens(), 3);
//! assert_eq!(features.n_attrs(), 4);
//! ```
pub mod data;
pub mod error;
pub mod features;
pub mod hashing;
pub mod model;

// Re-export primary API
pub use data::{to_categorical, Corpus, Dataset, Sentence, TagColumn, TagMap};
pub use error::{Result, TaggerError};
pub use features::{Attr, FeatureArray, FeatureExtractor};
pub use model::{Accuracy, Tagger, TaggerConfig};
