//! Fixed-size embedding table addressed by hashed keys.

use candle_core::{Device, Result, Tensor};
use candle_nn::{Embedding, Init, Module, VarBuilder};

use crate::features::FeatureArray;
use crate::hashing::murmur3_32;

/// Rows summed per key.
pub const NUM_HASHES: usize = 4;

/// Embeds one feature column through a hashed lookup table.
///
/// Every key selects [`NUM_HASHES`] rows, each with a different seed, and the
/// selected rows are summed. Distinct keys rarely share all of their rows,
/// so a small table can serve an unbounded vocabulary.
pub struct HashEmbed {
    table: Embedding,
    n_out: usize,
    n_rows: usize,
    column: usize,
    seed: u32,
}

impl HashEmbed {
    pub fn new(
        n_out: usize,
        n_rows: usize,
        column: usize,
        seed: u32,
        vb: VarBuilder,
    ) -> Result<Self> {
        let weight = vb.get_with_hints(
            (n_rows, n_out),
            "weight",
            Init::Uniform { lo: -0.1, up: 0.1 },
        )?;
        Ok(Self {
            table: Embedding::new(weight, n_out),
            n_out,
            n_rows,
            column,
            seed,
        })
    }

    pub fn n_out(&self) -> usize {
        self.n_out
    }

    /// Row indices for every token of the batch, `NUM_HASHES` per token.
    pub fn bucket_ids(&self, batch: &[FeatureArray]) -> Vec<u32> {
        let n_tokens: usize = batch.iter().map(FeatureArray::n_tokens).sum();
        let mut ids = Vec::with_capacity(n_tokens * NUM_HASHES);
        for features in batch {
            for key in features.column(self.column) {
                let bytes = key.to_le_bytes();
                for i in 0..NUM_HASHES {
                    let seed = self.seed.wrapping_mul(NUM_HASHES as u32).wrapping_add(i as u32);
                    ids.push(murmur3_32(&bytes, seed) % self.n_rows as u32);
                }
            }
        }
        ids
    }

    /// Embed the column of every token: output shape `(n_tokens, n_out)`.
    pub fn forward(&self, batch: &[FeatureArray], device: &Device) -> Result<Tensor> {
        let ids = self.bucket_ids(batch);
        let n_tokens = ids.len() / NUM_HASHES;
        let ids = Tensor::from_vec(ids, (n_tokens, NUM_HASHES), device)?;
        self.table.forward(&ids)?.sum(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureExtractor;
    use candle_core::DType;
    use candle_nn::VarMap;

    fn embed(n_rows: usize, column: usize, seed: u32) -> (VarMap, HashEmbed) {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let embed = HashEmbed::new(8, n_rows, column, seed, vb).unwrap();
        (varmap, embed)
    }

    #[test]
    fn test_bucket_ids_in_range() {
        let (_varmap, embed) = embed(100, 0, 0);
        let batch = vec![FeatureExtractor::default().extract(&["uno", "dos", "tres"])];
        let ids = embed.bucket_ids(&batch);

        assert_eq!(ids.len(), 3 * NUM_HASHES);
        assert!(ids.iter().all(|&id| id < 100));
    }

    #[test]
    fn test_same_key_same_vector() {
        let (_varmap, embed) = embed(50, 0, 3);
        let batch = vec![FeatureExtractor::default().extract(&["Casa", "casa"])];
        let out = embed.forward(&batch, &Device::Cpu).unwrap();

        assert_eq!(out.dims(), &[2, 8]);
        let rows = out.to_vec2::<f32>().unwrap();
        assert_eq!(rows[0], rows[1]);
    }

    #[test]
    fn test_seed_changes_buckets() {
        let (_a, first) = embed(1000, 1, 0);
        let (_b, second) = embed(1000, 1, 1);
        let batch = vec![FeatureExtractor::default().extract(&["Madrid"])];

        assert_ne!(first.bucket_ids(&batch), second.bucket_ids(&batch));
    }

    #[test]
    fn test_bucket_ids_follow_table_seed() {
        let (_varmap, embed) = embed(97, 0, 2);
        let features = FeatureExtractor::default().extract(&["perro"]);
        let bytes = features.column(0).next().unwrap().to_le_bytes();
        let expected: Vec<u32> = (0..NUM_HASHES as u32)
            .map(|i| murmur3_32(&bytes, 2 * NUM_HASHES as u32 + i) % 97)
            .collect();

        assert_eq!(embed.bucket_ids(&[features]), expected);
    }
}
