//! # Training Data
//!
//! Sentences, tag inventories and the encoded train/dev corpus.

pub mod conllu;
pub mod tagmap;

use std::path::Path;

use candle_core::{Device, Tensor};

use crate::error::{Result, TaggerError};
use crate::features::{FeatureArray, FeatureExtractor};

pub use conllu::{parse_conllu, read_conllu, TagColumn};
pub use tagmap::TagMap;

/// A tokenized sentence with one tag per word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub words: Vec<String>,
    pub tags: Vec<String>,
}

impl Sentence {
    pub fn new(words: Vec<String>, tags: Vec<String>) -> Self {
        Self { words, tags }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Feature arrays paired with gold tag indices.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub features: Vec<FeatureArray>,
    pub labels: Vec<Vec<usize>>,
}

impl Dataset {
    /// Extract features and encode tags for a list of sentences.
    pub fn encode(
        sentences: &[Sentence],
        extractor: &FeatureExtractor,
        tags: &TagMap,
    ) -> Result<Self> {
        let mut features = Vec::with_capacity(sentences.len());
        let mut labels = Vec::with_capacity(sentences.len());

        for sentence in sentences {
            if sentence.is_empty() {
                continue;
            }
            features.push(extractor.extract(sentence.words.as_slice()));
            labels.push(tags.encode(sentence.tags.as_slice())?);
        }

        Ok(Self { features, labels })
    }

    /// Number of sentences.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Total number of tokens.
    pub fn n_tokens(&self) -> usize {
        self.labels.iter().map(Vec::len).sum()
    }

    /// Gather the sentences at the given indices.
    pub fn take(&self, indices: &[usize]) -> (Vec<FeatureArray>, Vec<Vec<usize>>) {
        let features = indices.iter().map(|&i| self.features[i].clone()).collect();
        let labels = indices.iter().map(|&i| self.labels[i].clone()).collect();
        (features, labels)
    }
}

/// The encoded training and development sets with their shared tag map.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub train: Dataset,
    pub dev: Dataset,
    pub tags: TagMap,
}

impl Corpus {
    /// Build a corpus from in-memory sentences. The tag map is taken from the
    /// training sentences only.
    pub fn from_sentences(
        train: &[Sentence],
        dev: &[Sentence],
        extractor: &FeatureExtractor,
    ) -> Result<Self> {
        let tags = TagMap::from_sequences(train.iter().map(|s| s.tags.as_slice()));
        if tags.is_empty() {
            return Err(TaggerError::EmptyInput("training set has no tagged tokens"));
        }

        let train = Dataset::encode(train, extractor, &tags)?;
        let dev = Dataset::encode(dev, extractor, &tags)?;

        Ok(Self { train, dev, tags })
    }

    /// Load train and dev CoNLL-U files.
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(
        train: P,
        dev: Q,
        column: TagColumn,
        extractor: &FeatureExtractor,
    ) -> Result<Self> {
        let train = read_conllu(train, column)?;
        let dev = read_conllu(dev, column)?;
        tracing::debug!(train = train.len(), dev = dev.len(), "read CoNLL-U sentences");
        Self::from_sentences(&train, &dev, extractor)
    }
}

/// One-hot encode labels as an `(n, n_classes)` f32 tensor.
pub fn to_categorical(labels: &[usize], n_classes: usize, device: &Device) -> Result<Tensor> {
    let mut data = vec![0f32; labels.len() * n_classes];
    for (row, &label) in labels.iter().enumerate() {
        if label >= n_classes {
            return Err(TaggerError::InvalidConfig(format!(
                "label {label} out of range for {n_classes} classes"
            )));
        }
        data[row * n_classes + label] = 1.0;
    }
    Ok(Tensor::from_vec(data, (labels.len(), n_classes), device)?)
}
