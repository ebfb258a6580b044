//! Problem instances shared by every kernel adapter.
//!
//! A [`ProblemInstance`] is derived from a [`ConvShape`] once per benchmark
//! configuration and owns the four buffers the kernels read and write. It is
//! never shared across configurations: each configuration builds a fresh one
//! and drops it when its timing loop ends.

use crate::conv_shape::ConvShape;
use crate::errors::{ConvResult, ShapeError};
use serde::{Deserialize, Serialize};

/// How the source, weight and bias buffers are filled at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferInit {
    /// Every element is `0.0`.
    #[default]
    Zeroed,
    /// A deterministic, bounded, non-zero sequence. Used when kernel outputs
    /// are compared against each other.
    Pattern,
}

impl BufferInit {
    fn fill(self, len: usize, phase: f32) -> Vec<f32> {
        match self {
            BufferInit::Zeroed => vec![0.0f32; len],
            BufferInit::Pattern => (0..len)
                .map(|i| ((i % 9973) as f32 * 0.013 + phase).sin() * 0.5)
                .collect(),
        }
    }
}

/// Options applied when building a [`ProblemInstance`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceOptions {
    /// Extra multiplicative factor consumed by the candidate kernel.
    pub scale: f32,
    pub init: BufferInit,
}

impl Default for InstanceOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            init: BufferInit::Zeroed,
        }
    }
}

/// A fully sized convolution problem: shape, derived output extent and buffers.
#[derive(Debug, Clone)]
pub struct ProblemInstance {
    shape: ConvShape,
    out_dim: usize,
    scale: f32,
    src: Vec<f32>,
    weights: Vec<f32>,
    bias: Vec<f32>,
    dst: Vec<f32>,
}

impl ProblemInstance {
    /// Builds an instance with zero-filled buffers and `scale = 1.0`.
    pub fn build(shape: ConvShape) -> ConvResult<Self> {
        Self::build_with(shape, &InstanceOptions::default())
    }

    /// Builds an instance using the given options.
    pub fn build_with(shape: ConvShape, options: &InstanceOptions) -> ConvResult<Self> {
        let (out_dim, src_len, weights_len, dst_len) = Self::derive(&shape)?;

        Ok(Self {
            shape,
            out_dim,
            scale: options.scale,
            src: options.init.fill(src_len, 0.0),
            weights: options.init.fill(weights_len, 1.0),
            bias: options.init.fill(shape.out_channels, 2.0),
            dst: vec![0.0f32; dst_len],
        })
    }

    /// Builds an instance around caller-provided input buffers. Each buffer
    /// must hold exactly the element count the shape implies.
    pub fn from_buffers(
        shape: ConvShape,
        scale: f32,
        src: Vec<f32>,
        weights: Vec<f32>,
        bias: Vec<f32>,
    ) -> ConvResult<Self> {
        let (out_dim, src_len, weights_len, dst_len) = Self::derive(&shape)?;

        let lengths = [
            ("source", src_len, src.len()),
            ("weights", weights_len, weights.len()),
            ("bias", shape.out_channels, bias.len()),
        ];
        for (buffer, expected, actual) in lengths {
            if expected != actual {
                return Err(ShapeError::BufferLengthMismatch {
                    buffer,
                    expected,
                    actual,
                }
                .into());
            }
        }

        Ok(Self {
            shape,
            out_dim,
            scale,
            src,
            weights,
            bias,
            dst: vec![0.0f32; dst_len],
        })
    }

    /// Output extent and the source, weights and destination element counts.
    fn derive(shape: &ConvShape) -> ConvResult<(usize, usize, usize, usize)> {
        let out_dim = shape.out_dim()?;

        let src_len = element_count(
            "source",
            &[shape.batch, shape.in_channels, shape.in_dim, shape.in_dim],
        )?;
        let weights_len = element_count(
            "weights",
            &[
                shape.out_channels,
                shape.in_channels,
                shape.kernel_size,
                shape.kernel_size,
            ],
        )?;
        let dst_len = element_count(
            "destination",
            &[shape.batch, shape.out_channels, out_dim, out_dim],
        )?;

        Ok((out_dim, src_len, weights_len, dst_len))
    }

    pub fn shape(&self) -> &ConvShape {
        &self.shape
    }

    pub fn batch(&self) -> usize {
        self.shape.batch
    }

    pub fn in_channels(&self) -> usize {
        self.shape.in_channels
    }

    pub fn out_channels(&self) -> usize {
        self.shape.out_channels
    }

    pub fn ih(&self) -> usize {
        self.shape.in_dim
    }

    pub fn iw(&self) -> usize {
        self.shape.in_dim
    }

    pub fn kh(&self) -> usize {
        self.shape.kernel_size
    }

    pub fn kw(&self) -> usize {
        self.shape.kernel_size
    }

    pub fn oh(&self) -> usize {
        self.out_dim
    }

    pub fn ow(&self) -> usize {
        self.out_dim
    }

    pub fn padding(&self) -> usize {
        self.shape.padding
    }

    pub fn stride(&self) -> usize {
        self.shape.stride
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn src(&self) -> &[f32] {
        &self.src
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn bias(&self) -> &[f32] {
        &self.bias
    }

    pub fn dst(&self) -> &[f32] {
        &self.dst
    }

    /// Splits the instance into read-only inputs and the writable destination,
    /// in the order `(src, weights, bias, dst)`.
    pub fn buffers_mut(&mut self) -> (&[f32], &[f32], &[f32], &mut [f32]) {
        (&self.src, &self.weights, &self.bias, &mut self.dst)
    }

    /// Total number of f32 elements held by the four buffers.
    pub fn total_elements(&self) -> usize {
        self.src.len() + self.weights.len() + self.bias.len() + self.dst.len()
    }
}

fn element_count(buffer: &'static str, extents: &[usize]) -> ConvResult<usize> {
    extents
        .iter()
        .try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
        .ok_or_else(|| ShapeError::BufferSizeOverflow { buffer }.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConvError;

    #[test]
    fn test_buffer_sizes_for_first_resnet_layer() {
        let instance = ProblemInstance::build(ConvShape::new(4, 224, 3, 64, 7, 3, 2)).unwrap();
        assert_eq!(instance.oh(), 112);
        assert_eq!(instance.ow(), 112);
        assert_eq!(instance.src().len(), 602_112);
        assert_eq!(instance.weights().len(), 64 * 3 * 7 * 7);
        assert_eq!(instance.bias().len(), 64);
        assert_eq!(instance.dst().len(), 3_211_264);
    }

    #[test]
    fn test_zeroed_by_default() {
        let instance = ProblemInstance::build(ConvShape::new(1, 5, 2, 2, 3, 0, 1)).unwrap();
        assert!(instance.src().iter().all(|&v| v == 0.0));
        assert!(instance.weights().iter().all(|&v| v == 0.0));
        assert!(instance.bias().iter().all(|&v| v == 0.0));
        assert_eq!(instance.scale(), 1.0);
    }

    #[test]
    fn test_pattern_fill_is_deterministic_and_finite() {
        let options = InstanceOptions {
            scale: 0.5,
            init: BufferInit::Pattern,
        };
        let shape = ConvShape::new(2, 6, 3, 4, 3, 1, 1);
        let a = ProblemInstance::build_with(shape, &options).unwrap();
        let b = ProblemInstance::build_with(shape, &options).unwrap();
        assert_eq!(a.src(), b.src());
        assert_eq!(a.weights(), b.weights());
        assert!(a.src().iter().any(|&v| v != 0.0));
        assert!(a.weights().iter().all(|v| v.is_finite() && v.abs() <= 0.5));
        assert_eq!(a.scale(), 0.5);
    }

    #[test]
    fn test_rejects_overflowing_buffers() {
        let shape = ConvShape::new(usize::MAX / 2, 4, 4, 1, 1, 0, 1);
        let result = ProblemInstance::build(shape);
        assert!(matches!(
            result,
            Err(ConvError::InvalidShape(ShapeError::BufferSizeOverflow {
                buffer: "source"
            }))
        ));
    }

    #[test]
    fn test_from_buffers_checks_lengths() {
        let shape = ConvShape::new(1, 4, 2, 3, 3, 0, 1);
        let instance =
            ProblemInstance::from_buffers(shape, 2.0, vec![1.0; 32], vec![0.5; 54], vec![0.0; 3])
                .unwrap();
        assert_eq!(instance.dst().len(), 3 * 2 * 2);
        assert_eq!(instance.scale(), 2.0);

        let result =
            ProblemInstance::from_buffers(shape, 1.0, vec![1.0; 32], vec![0.5; 53], vec![0.0; 3]);
        assert!(matches!(
            result,
            Err(ConvError::InvalidShape(ShapeError::BufferLengthMismatch {
                buffer: "weights",
                expected: 54,
                actual: 53
            }))
        ));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: InstanceOptions = serde_json::from_str(r#"{"init":"pattern"}"#).unwrap();
        assert_eq!(options.scale, 1.0);
        assert_eq!(options.init, BufferInit::Pattern);
    }
}
