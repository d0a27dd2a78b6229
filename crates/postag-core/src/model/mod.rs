//! # Tagger Model
//!
//! Hashed embeddings for four lexical attributes, a maxout projection, a
//! bidirectional LSTM and a per-token softmax classifier.
//!
//! ```text
//! (lower | shape | prefix | suffix) >> Maxout(width, pieces)
//!     >> BiLstm(width, depth) >> Softmax(n_tags)
//! ```

pub mod bilstm;
pub mod hash_embed;
pub mod maxout;

use std::path::Path;

use candle_core::{D, DType, Device, Tensor, Var};
use candle_nn::{Linear, Module, VarBuilder, VarMap};
use serde::{Deserialize, Serialize};

use crate::data::TagMap;
use crate::error::{Result, TaggerError};
use crate::features::{FeatureArray, FeatureExtractor};

pub use bilstm::BiLstm;
pub use hash_embed::{HashEmbed, NUM_HASHES};
pub use maxout::Maxout;

/// Weights file inside a model directory.
pub const WEIGHTS_FILE: &str = "model.safetensors";
/// Architecture file inside a model directory.
pub const CONFIG_FILE: &str = "config.json";
/// Tag inventory file inside a model directory.
pub const TAGS_FILE: &str = "tags.json";

/// Sentences per forward pass during evaluation.
const EVAL_BATCH: usize = 256;

/// Architecture hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggerConfig {
    /// Width of the hidden layers.
    pub width: usize,
    /// Number of BiLSTM layers.
    pub depth: usize,
    /// Width of the lowercase-form vectors.
    pub vector_length: usize,
    /// Linear pieces per maxout unit.
    pub pieces: usize,
    pub lower_rows: usize,
    pub shape_rows: usize,
    pub prefix_rows: usize,
    pub suffix_rows: usize,
    /// Size of the output tag set.
    pub n_tags: usize,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            width: 128,
            depth: 1,
            vector_length: 128,
            pieces: 3,
            lower_rows: 100,
            shape_rows: 200,
            prefix_rows: 100,
            suffix_rows: 100,
            n_tags: 0,
        }
    }
}

impl TaggerConfig {
    /// Widths and row counts of the four tables, in feature-column order.
    fn tables(&self) -> [(&'static str, usize, usize); 4] {
        let half = self.width / 2;
        [
            ("embed_lower", self.vector_length, self.lower_rows),
            ("embed_shape", half, self.shape_rows),
            ("embed_prefix", half, self.prefix_rows),
            ("embed_suffix", half, self.suffix_rows),
        ]
    }

    /// Width of the concatenated embeddings.
    pub fn concat_width(&self) -> usize {
        self.tables().iter().map(|(_, n_out, _)| n_out).sum()
    }

    pub fn validate(&self) -> Result<()> {
        if self.width < 2 || self.width % 2 != 0 {
            return Err(TaggerError::InvalidConfig(format!(
                "width must be an even number >= 2, got {}",
                self.width
            )));
        }
        if self.depth == 0 || self.pieces == 0 || self.vector_length == 0 {
            return Err(TaggerError::InvalidConfig(
                "depth, pieces and vector_length must be positive".into(),
            ));
        }
        if self.tables().iter().any(|(_, _, rows)| *rows == 0) {
            return Err(TaggerError::InvalidConfig("embedding tables need rows".into()));
        }
        if self.n_tags == 0 {
            return Err(TaggerError::InvalidConfig("tag set is empty".into()));
        }
        Ok(())
    }
}

/// Token-level accuracy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accuracy {
    pub correct: usize,
    pub total: usize,
}

impl Accuracy {
    pub fn value(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

impl std::ops::AddAssign for Accuracy {
    fn add_assign(&mut self, rhs: Self) {
        self.correct += rhs.correct;
        self.total += rhs.total;
    }
}

/// The part-of-speech tagger.
pub struct Tagger {
    config: TaggerConfig,
    tags: TagMap,
    extractor: FeatureExtractor,
    varmap: VarMap,
    device: Device,
    embeds: Vec<HashEmbed>,
    maxout: Maxout,
    bilstm: BiLstm,
    output: Linear,
}

impl Tagger {
    /// Build a tagger with freshly initialized parameters.
    pub fn new(config: TaggerConfig, tags: TagMap, device: &Device) -> Result<Self> {
        config.validate()?;
        if config.n_tags != tags.len() {
            return Err(TaggerError::InvalidConfig(format!(
                "config has {} tags but the tag map has {}",
                config.n_tags,
                tags.len()
            )));
        }

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);

        let embeds = config
            .tables()
            .iter()
            .enumerate()
            .map(|(column, (name, n_out, rows))| {
                HashEmbed::new(*n_out, *rows, column, column as u32, vb.pp(*name))
            })
            .collect::<candle_core::Result<Vec<_>>>()?;
        let maxout = Maxout::new(config.concat_width(), config.width, config.pieces, vb.pp("maxout"))?;
        let bilstm = BiLstm::new(config.width, config.width, config.depth, vb.pp("bilstm"))?;
        let output = candle_nn::linear(config.width, config.n_tags, vb.pp("softmax"))?;

        tracing::debug!(
            width = config.width,
            depth = config.depth,
            n_tags = config.n_tags,
            "built tagger"
        );

        Ok(Self {
            config,
            tags,
            extractor: FeatureExtractor::default(),
            varmap,
            device: device.clone(),
            embeds,
            maxout,
            bilstm,
            output,
        })
    }

    /// Load a model directory written by [`Tagger::save`].
    pub fn load<P: AsRef<Path>>(dir: P, device: &Device) -> Result<Self> {
        let dir = dir.as_ref();
        let model_load = |reason: String| TaggerError::ModelLoad {
            path: dir.display().to_string(),
            reason,
        };

        let config_path = dir.join(CONFIG_FILE);
        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| model_load(format!("failed to read {}: {e}", config_path.display())))?;
        let config: TaggerConfig = serde_json::from_str(&config_str)
            .map_err(|e| model_load(format!("failed to parse config: {e}")))?;
        let tags = TagMap::load(dir.join(TAGS_FILE))
            .map_err(|e| model_load(format!("failed to read tags: {e}")))?;

        let mut tagger = Self::new(config, tags, device)?;
        tagger
            .varmap
            .load(dir.join(WEIGHTS_FILE))
            .map_err(|e| model_load(e.to_string()))?;

        tracing::info!(path = %dir.display(), "loaded tagger");
        Ok(tagger)
    }

    /// Write weights, architecture and tag inventory into `dir`.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        self.varmap.save(dir.join(WEIGHTS_FILE))?;
        std::fs::write(
            dir.join(CONFIG_FILE),
            serde_json::to_string_pretty(&self.config)?,
        )?;
        self.tags.save(dir.join(TAGS_FILE))?;
        Ok(())
    }

    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }

    pub fn tags(&self) -> &TagMap {
        &self.tags
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Trainable parameters.
    pub fn vars(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    /// Unnormalized tag scores for every token of the batch, `[n_tokens, n_tags]`.
    ///
    /// Rows follow the sentences in order. Dropout with rate `dropout` is
    /// applied after the maxout and BiLSTM layers when it is positive.
    pub fn forward(&self, batch: &[FeatureArray], dropout: f32) -> Result<Tensor> {
        if batch.is_empty() {
            return Err(TaggerError::EmptyInput("batch has no sentences"));
        }
        let lengths: Vec<usize> = batch.iter().map(FeatureArray::n_tokens).collect();
        if lengths.contains(&0) {
            return Err(TaggerError::EmptyInput("batch contains an empty sentence"));
        }
        if let Some(bad) = batch.iter().find(|f| f.n_attrs() < self.embeds.len()) {
            return Err(TaggerError::InvalidConfig(format!(
                "expected {} feature columns, got {}",
                self.embeds.len(),
                bad.n_attrs()
            )));
        }

        let vectors = self
            .embeds
            .iter()
            .map(|embed| embed.forward(batch, &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;
        let xs = Tensor::cat(&vectors, 1)?;

        let xs = self.maxout.forward(&xs)?;
        let xs = apply_dropout(xs, dropout)?;
        let xs = self.bilstm.forward(&xs, &lengths)?;
        let xs = apply_dropout(xs, dropout)?;

        Ok(self.output.forward(&xs)?)
    }

    /// Tag probabilities for every token of the batch.
    pub fn predict_proba(&self, batch: &[FeatureArray]) -> Result<Tensor> {
        let logits = self.forward(batch, 0.0)?;
        Ok(candle_nn::ops::softmax_last_dim(&logits)?)
    }

    /// Best tag index for every token, grouped by sentence.
    pub fn predict(&self, batch: &[FeatureArray]) -> Result<Vec<Vec<usize>>> {
        let best = self.forward(batch, 0.0)?.argmax(D::Minus1)?.to_vec1::<u32>()?;

        let mut out = Vec::with_capacity(batch.len());
        let mut offset = 0;
        for features in batch {
            let n = features.n_tokens();
            out.push(best[offset..offset + n].iter().map(|&i| i as usize).collect());
            offset += n;
        }
        Ok(out)
    }

    /// Token-level accuracy against gold tag indices.
    pub fn evaluate(&self, features: &[FeatureArray], gold: &[Vec<usize>]) -> Result<Accuracy> {
        let mut acc = Accuracy::default();
        for (batch, labels) in features.chunks(EVAL_BATCH).zip(gold.chunks(EVAL_BATCH)) {
            let guesses = self.predict(batch)?;
            for (guess, truth) in guesses.iter().zip(labels) {
                acc.total += truth.len();
                acc.correct += guess.iter().zip(truth).filter(|(g, t)| g == t).count();
            }
        }
        Ok(acc)
    }

    /// Tag pre-tokenized sentences, returning tag strings.
    pub fn tag<S: AsRef<str>>(&self, sentences: &[Vec<S>]) -> Result<Vec<Vec<String>>> {
        let mut out = vec![Vec::new(); sentences.len()];
        let nonempty: Vec<usize> = (0..sentences.len())
            .filter(|&i| !sentences[i].is_empty())
            .collect();

        for chunk in nonempty.chunks(EVAL_BATCH) {
            let batch: Vec<FeatureArray> = chunk
                .iter()
                .map(|&i| self.extractor.extract(sentences[i].as_slice()))
                .collect();
            for (&i, guess) in chunk.iter().zip(self.predict(&batch)?) {
                out[i] = guess
                    .into_iter()
                    .map(|idx| self.tags.tag(idx).unwrap_or_default().to_string())
                    .collect();
            }
        }
        Ok(out)
    }
}

fn apply_dropout(xs: Tensor, rate: f32) -> Result<Tensor> {
    if rate > 0.0 {
        Ok(candle_nn::ops::dropout(&xs, rate)?)
    } else {
        Ok(xs)
    }
}
