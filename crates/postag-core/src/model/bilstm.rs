//! Bidirectional multi-layer LSTM over padded sentence batches.

use candle_core::{Device, Result, Tensor};
use candle_nn::rnn::{lstm, Direction, LSTMConfig, LSTM, RNN};
use candle_nn::VarBuilder;

/// Stacked bidirectional LSTM. Each direction has `width / 2` hidden units,
/// so every layer maps to `width` features.
pub struct BiLstm {
    layers: Vec<(LSTM, LSTM)>,
    width: usize,
}

/// Index maps between flat token rows and a padded `[batch, max_len]` grid.
struct Padding {
    batch: usize,
    max_len: usize,
    /// For each grid cell, the flat row to read, or `n_tokens` for padding.
    to_grid: Tensor,
    /// For each flat row, its grid cell.
    to_flat: Tensor,
    /// For each grid cell, the cell holding the same sequence position in
    /// reverse order. Padding cells map to themselves.
    reverse: Tensor,
}

impl Padding {
    fn new(lengths: &[usize], device: &Device) -> Result<Self> {
        let batch = lengths.len();
        let max_len = lengths.iter().copied().max().unwrap_or(0);
        let n_tokens: usize = lengths.iter().sum();

        let mut to_grid = Vec::with_capacity(batch * max_len);
        let mut to_flat = Vec::with_capacity(n_tokens);
        let mut reverse = Vec::with_capacity(batch * max_len);

        let mut offset = 0usize;
        for (b, &len) in lengths.iter().enumerate() {
            let row = b * max_len;
            for t in 0..max_len {
                if t < len {
                    to_grid.push((offset + t) as u32);
                    to_flat.push((row + t) as u32);
                    reverse.push((row + len - 1 - t) as u32);
                } else {
                    to_grid.push(n_tokens as u32);
                    reverse.push((row + t) as u32);
                }
            }
            offset += len;
        }

        Ok(Self {
            batch,
            max_len,
            to_grid: Tensor::new(to_grid, device)?,
            to_flat: Tensor::new(to_flat, device)?,
            reverse: Tensor::new(reverse, device)?,
        })
    }

    /// `[n_tokens, d]` -> `[batch, max_len, d]`, zero-filled.
    fn pad(&self, xs: &Tensor) -> Result<Tensor> {
        let d = xs.dim(1)?;
        let zero = Tensor::zeros((1, d), xs.dtype(), xs.device())?;
        Tensor::cat(&[xs, &zero], 0)?
            .index_select(&self.to_grid, 0)?
            .reshape((self.batch, self.max_len, d))
    }

    /// `[batch, max_len, d]` -> `[n_tokens, d]`.
    fn unpad(&self, xs: &Tensor) -> Result<Tensor> {
        let d = xs.dim(2)?;
        xs.reshape((self.batch * self.max_len, d))?
            .index_select(&self.to_flat, 0)
    }

    /// Reverse every sequence within its own length.
    fn reverse(&self, xs: &Tensor) -> Result<Tensor> {
        let d = xs.dim(2)?;
        xs.reshape((self.batch * self.max_len, d))?
            .index_select(&self.reverse, 0)?
            .reshape((self.batch, self.max_len, d))
    }
}

impl BiLstm {
    pub fn new(n_in: usize, width: usize, depth: usize, vb: VarBuilder) -> Result<Self> {
        let hidden = width / 2;
        let mut layers = Vec::with_capacity(depth);
        for layer_idx in 0..depth {
            let in_dim = if layer_idx == 0 { n_in } else { width };
            let forward = lstm(
                in_dim,
                hidden,
                LSTMConfig {
                    layer_idx,
                    direction: Direction::Forward,
                    ..Default::default()
                },
                vb.clone(),
            )?;
            let backward = lstm(
                in_dim,
                hidden,
                LSTMConfig {
                    layer_idx,
                    direction: Direction::Backward,
                    ..Default::default()
                },
                vb.clone(),
            )?;
            layers.push((forward, backward));
        }
        Ok(Self { layers, width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Run over the concatenated tokens of a batch.
    ///
    /// `xs` is `[n_tokens, n_in]` with the sentences laid out back to back,
    /// `lengths` gives each sentence's token count. Returns `[n_tokens, width]`
    /// in the same row order.
    pub fn forward(&self, xs: &Tensor, lengths: &[usize]) -> Result<Tensor> {
        let padding = Padding::new(lengths, xs.device())?;
        let mut hidden = padding.pad(xs)?;

        for (forward, backward) in &self.layers {
            let fwd = forward.states_to_tensor(&forward.seq(&hidden)?)?;
            let reversed = padding.reverse(&hidden)?;
            let bwd = backward.states_to_tensor(&backward.seq(&reversed)?)?;
            let bwd = padding.reverse(&bwd)?;
            hidden = Tensor::cat(&[&fwd, &bwd], 2)?;
        }

        padding.unpad(&hidden)
    }
}
