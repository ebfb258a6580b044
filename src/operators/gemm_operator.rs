//! GEMM operator.
//!
//! Computes `dst[oc, pixel] = bias[oc] + weights[oc, :] . column[pixel, :]` for
//! one image. The column matrix is either the im2col scratch or, for
//! pointwise convolutions, the source image itself.

use crate::dnn::ConvDesc;
use crate::errors::DnnResult;
use crate::operators::{ExecContext, Operator, image_slice, image_slice_mut};
use crate::utils::dot::{DotKernel, dot};

/// Where the GEMM reads its column matrix from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GemmInput {
    /// Im2col scratch, one contiguous row per output pixel.
    Scratch,
    /// The NCHW source image, read channel plane by channel plane.
    Source,
}

pub struct GemmOperator {
    input: GemmInput,
    out_channels: usize,
    patch_len: usize,
    pixels: usize,
    dot_kernel: DotKernel,
}

impl GemmOperator {
    pub(crate) fn new(desc: &ConvDesc, input: GemmInput, dot_kernel: DotKernel) -> Self {
        Self {
            input,
            out_channels: desc.out_channels,
            patch_len: desc.patch_len(),
            pixels: desc.out_h() * desc.out_w(),
            dot_kernel,
        }
    }

    fn apply_scratch(&self, columns: &[f32], weights: &[f32], bias: &[f32], dst: &mut [f32]) {
        for ((dst_row, weights_row), &bias_value) in dst
            .chunks_exact_mut(self.pixels)
            .zip(weights.chunks_exact(self.patch_len))
            .zip(bias)
        {
            for (out, column) in dst_row.iter_mut().zip(columns.chunks_exact(self.patch_len)) {
                *out = bias_value + dot(self.dot_kernel, weights_row, column);
            }
        }
    }

    fn apply_source(&self, src: &[f32], weights: &[f32], bias: &[f32], dst: &mut [f32]) {
        for ((dst_row, weights_row), &bias_value) in dst
            .chunks_exact_mut(self.pixels)
            .zip(weights.chunks_exact(self.patch_len))
            .zip(bias)
        {
            dst_row.fill(bias_value);
            for (&weight, plane) in weights_row.iter().zip(src.chunks_exact(self.pixels)) {
                for (out, &value) in dst_row.iter_mut().zip(plane) {
                    *out = weight.mul_add(value, *out);
                }
            }
        }
    }
}

impl Operator for GemmOperator {
    fn name(&self) -> &'static str {
        "gemm"
    }

    fn apply(&self, ctx: &mut ExecContext<'_>) -> DnnResult<()> {
        let weights = image_slice(self.name(), ctx.weights, 0, self.out_channels * self.patch_len)?;
        let bias = image_slice(self.name(), ctx.bias, 0, self.out_channels)?;
        let dst = image_slice_mut(self.name(), ctx.dst, ctx.image, self.out_channels * self.pixels)?;

        match self.input {
            GemmInput::Scratch => {
                let columns = image_slice(self.name(), ctx.scratch, 0, self.pixels * self.patch_len)?;
                self.apply_scratch(columns, weights, bias, dst);
            }
            GemmInput::Source => {
                // Pointwise: patch_len equals the input channel count.
                let src = image_slice(self.name(), ctx.src, ctx.image, self.patch_len * self.pixels)?;
                self.apply_source(src, weights, bias, dst);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELTA: f32 = 1e-5;

    fn desc(kernel: usize) -> ConvDesc {
        ConvDesc {
            batch: 1,
            in_channels: 2,
            in_h: 2,
            in_w: 2,
            out_channels: 2,
            kernel_h: kernel,
            kernel_w: kernel,
            pad_h: 0,
            pad_w: 0,
            stride_h: 1,
            stride_w: 1,
            post_ops: vec![],
        }
    }

    #[test]
    fn test_scratch_gemm_adds_bias() {
        // kernel 2 on a 2x2 input -> one output pixel with an 8-wide patch
        let op = GemmOperator::new(&desc(2), GemmInput::Scratch, DotKernel::Scalar);
        let mut scratch: Vec<f32> = (1..=8).map(|v| v as f32).collect();
        let weights: Vec<f32> = [vec![1.0f32; 8], vec![0.5f32; 8]].concat();
        let bias = [1.0, -1.0];
        let mut dst = [0.0f32; 2];
        let mut ctx = ExecContext {
            image: 0,
            src: &[],
            weights: &weights,
            bias: &bias,
            scratch: &mut scratch,
            dst: &mut dst,
        };
        op.apply(&mut ctx).unwrap();

        assert!((dst[0] - 37.0).abs() < DELTA);
        assert!((dst[1] - 17.0).abs() < DELTA);
    }

    #[test]
    fn test_pointwise_gemm_reads_source_planes() {
        let op = GemmOperator::new(&desc(1), GemmInput::Source, DotKernel::detect());
        // two channel planes of four pixels
        let src = [1.0, 2.0, 3.0, 4.0, 10.0, 20.0, 30.0, 40.0];
        // oc0 = c0 + c1, oc1 = 2 * c0
        let weights = [1.0, 1.0, 2.0, 0.0];
        let bias = [0.0, 0.5];
        let mut dst = [0.0f32; 8];
        let mut ctx = ExecContext {
            image: 0,
            src: &src,
            weights: &weights,
            bias: &bias,
            scratch: &mut [],
            dst: &mut dst,
        };
        op.apply(&mut ctx).unwrap();

        assert_eq!(dst, [11.0, 22.0, 33.0, 44.0, 2.5, 4.5, 6.5, 8.5]);
    }
}
