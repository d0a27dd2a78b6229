//! Feature extractor producing row-major key arrays.

use crate::features::attrs::Attr;
use crate::hashing::hash_string;

/// Hashed attribute keys for one sentence, shape `[n_tokens, n_attrs]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureArray {
    keys: Vec<u64>,
    n_attrs: usize,
}

impl FeatureArray {
    /// Build an array from row-major keys.
    pub fn from_keys(keys: Vec<u64>, n_attrs: usize) -> Self {
        debug_assert!(n_attrs > 0 && keys.len() % n_attrs == 0);
        Self { keys, n_attrs }
    }

    /// Number of tokens (rows).
    pub fn n_tokens(&self) -> usize {
        if self.n_attrs == 0 {
            0
        } else {
            self.keys.len() / self.n_attrs
        }
    }

    /// Number of attributes (columns).
    pub fn n_attrs(&self) -> usize {
        self.n_attrs
    }

    /// Keys of a single token.
    pub fn row(&self, token: usize) -> &[u64] {
        &self.keys[token * self.n_attrs..(token + 1) * self.n_attrs]
    }

    /// Iterate over the keys of one column.
    pub fn column(&self, column: usize) -> impl Iterator<Item = u64> + '_ {
        self.keys.iter().skip(column).step_by(self.n_attrs).copied()
    }
}

/// Extracts lexical attributes from pre-tokenized text.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    attrs: Vec<Attr>,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(Attr::DEFAULT.to_vec())
    }
}

impl FeatureExtractor {
    /// Create an extractor with the given column order.
    pub fn new(attrs: Vec<Attr>) -> Self {
        Self { attrs }
    }

    /// The attribute of each column.
    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    /// Extract the feature array of one tokenized sentence.
    pub fn extract<S: AsRef<str>>(&self, words: &[S]) -> FeatureArray {
        let mut keys = Vec::with_capacity(words.len() * self.attrs.len());
        for word in words {
            let word = word.as_ref();
            for attr in &self.attrs {
                keys.push(hash_string(&attr.value(word)));
            }
        }
        FeatureArray::from_keys(keys, self.attrs.len())
    }

    /// Extract features for a batch of sentences.
    pub fn extract_batch<S: AsRef<str>>(&self, sentences: &[Vec<S>]) -> Vec<FeatureArray> {
        sentences.iter().map(|words| self.extract(words)).collect()
    }
}
