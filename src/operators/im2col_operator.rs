//! Im2col operator.
//!
//! Unfolds every receptive field of one image into a row of the scratch
//! matrix, so the convolution becomes a matrix product. Scratch layout is
//! `[out_h * out_w, in_channels * kernel_h * kernel_w]`, matching the OIHW
//! weight row order; padded positions are written as zero.

use crate::dnn::ConvDesc;
use crate::errors::DnnResult;
use crate::operators::{ExecContext, Operator, image_slice, image_slice_mut};

pub struct Im2ColOperator {
    in_channels: usize,
    in_h: usize,
    in_w: usize,
    kernel_h: usize,
    kernel_w: usize,
    pad_h: usize,
    pad_w: usize,
    stride_h: usize,
    stride_w: usize,
    out_h: usize,
    out_w: usize,
}

impl Im2ColOperator {
    pub fn new(desc: &ConvDesc) -> Self {
        Self {
            in_channels: desc.in_channels,
            in_h: desc.in_h,
            in_w: desc.in_w,
            kernel_h: desc.kernel_h,
            kernel_w: desc.kernel_w,
            pad_h: desc.pad_h,
            pad_w: desc.pad_w,
            stride_h: desc.stride_h,
            stride_w: desc.stride_w,
            out_h: desc.out_h(),
            out_w: desc.out_w(),
        }
    }

    fn patch_len(&self) -> usize {
        self.in_channels * self.kernel_h * self.kernel_w
    }
}

impl Operator for Im2ColOperator {
    fn name(&self) -> &'static str {
        "im2col"
    }

    fn scratch_len(&self) -> usize {
        self.out_h * self.out_w * self.patch_len()
    }

    fn apply(&self, ctx: &mut ExecContext<'_>) -> DnnResult<()> {
        let plane = self.in_h * self.in_w;
        let src = image_slice(self.name(), ctx.src, ctx.image, self.in_channels * plane)?;
        let patch_len = self.patch_len();
        let scratch = image_slice_mut(self.name(), ctx.scratch, 0, self.scratch_len())?;

        for (pixel, row) in scratch.chunks_exact_mut(patch_len).enumerate() {
            let oy = pixel / self.out_w;
            let ox = pixel % self.out_w;
            let mut col = 0;
            for channel in src.chunks_exact(plane) {
                for ky in 0..self.kernel_h {
                    // Input coordinates are shifted by the padding to stay unsigned.
                    let iy = oy * self.stride_h + ky;
                    let row_in_bounds = iy >= self.pad_h && iy - self.pad_h < self.in_h;
                    for kx in 0..self.kernel_w {
                        let ix = ox * self.stride_w + kx;
                        row[col] = if row_in_bounds && ix >= self.pad_w && ix - self.pad_w < self.in_w {
                            channel[(iy - self.pad_h) * self.in_w + (ix - self.pad_w)]
                        } else {
                            0.0
                        };
                        col += 1;
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(pad: usize, stride: usize) -> ConvDesc {
        ConvDesc {
            batch: 2,
            in_channels: 1,
            in_h: 3,
            in_w: 3,
            out_channels: 1,
            kernel_h: 2,
            kernel_w: 2,
            pad_h: pad,
            pad_w: pad,
            stride_h: stride,
            stride_w: stride,
            post_ops: vec![],
        }
    }

    #[test]
    fn test_unfolds_second_image() {
        let op = Im2ColOperator::new(&desc(0, 1));
        let src: Vec<f32> = (0..18).map(|v| v as f32).collect();
        let mut scratch = vec![0.0f32; op.scratch_len()];
        let mut dst = [0.0f32; 0];
        let mut ctx = ExecContext {
            image: 1,
            src: &src,
            weights: &[],
            bias: &[],
            scratch: &mut scratch,
            dst: &mut dst,
        };
        op.apply(&mut ctx).unwrap();

        // image 1 holds 9..18; first window is [9, 10, 12, 13]
        assert_eq!(&scratch[..4], &[9.0, 10.0, 12.0, 13.0]);
        // last window (1, 1) is [13, 14, 16, 17]
        assert_eq!(&scratch[12..16], &[13.0, 14.0, 16.0, 17.0]);
    }

    #[test]
    fn test_padding_writes_zeros() {
        let op = Im2ColOperator::new(&desc(1, 2));
        let src = vec![1.0f32; 18];
        let mut scratch = vec![-1.0f32; op.scratch_len()];
        let mut dst = [0.0f32; 0];
        let mut ctx = ExecContext {
            image: 0,
            src: &src,
            weights: &[],
            bias: &[],
            scratch: &mut scratch,
            dst: &mut dst,
        };
        op.apply(&mut ctx).unwrap();

        // out = (3 + 2 - 2) / 2 + 1 = 2; window (0, 0) covers padded corner
        assert_eq!(&scratch[..4], &[0.0, 0.0, 0.0, 1.0]);
        // window (1, 1) starts at padded (2, 2) -> input (1, 1), fully inside
        assert_eq!(&scratch[12..16], &[1.0, 1.0, 1.0, 1.0]);
    }
}
