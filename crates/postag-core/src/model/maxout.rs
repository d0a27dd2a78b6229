//! Maxout projection layer.

use candle_core::{D, Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder};

/// Linear layer with `pieces` outputs per unit, reduced by a max.
pub struct Maxout {
    linear: Linear,
    width: usize,
    pieces: usize,
}

impl Maxout {
    pub fn new(n_in: usize, width: usize, pieces: usize, vb: VarBuilder) -> Result<Self> {
        let linear = candle_nn::linear(n_in, width * pieces, vb)?;
        Ok(Self {
            linear,
            width,
            pieces,
        })
    }
}

impl Module for Maxout {
    /// `xs`: [n, n_in] -> [n, width]
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let n = xs.dim(0)?;
        self.linear
            .forward(xs)?
            .reshape((n, self.width, self.pieces))?
            .max(D::Minus1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn test_output_shape() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let maxout = Maxout::new(6, 4, 3, vb).unwrap();

        let xs = Tensor::ones((5, 6), DType::F32, &Device::Cpu).unwrap();
        let ys = maxout.forward(&xs).unwrap();
        assert_eq!(ys.dims(), &[5, 4]);
    }

    #[test]
    fn test_takes_max_piece() {
        let dev = Device::Cpu;
        // Two units, three pieces each, identity-like weights on a 1-d input
        let weight = Tensor::new(&[[1f32], [-2.], [3.], [0.5], [4.], [-1.]], &dev).unwrap();
        let bias = Tensor::zeros(6, DType::F32, &dev).unwrap();
        let maxout = Maxout {
            linear: Linear::new(weight, Some(bias)),
            width: 2,
            pieces: 3,
        };

        let xs = Tensor::new(&[[1f32], [-1.]], &dev).unwrap();
        let ys = maxout.forward(&xs).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(ys, vec![vec![3.0, 4.0], vec![2.0, 1.0]]);
    }
}
