//! Convolution operator descriptor.

use crate::errors::{DnnError, DnnResult};

/// Operation fused after the convolution, applied to each destination element
/// in the order listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOp {
    /// `max(0, x)`.
    Relu,
}

/// Describes a forward 2D convolution over NCHW activations and OIHW weights.
///
/// The descriptor is plain data; [`ConvDesc::validate`] decides whether the
/// primitive supports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvDesc {
    pub batch: usize,
    pub in_channels: usize,
    pub in_h: usize,
    pub in_w: usize,
    pub out_channels: usize,
    pub kernel_h: usize,
    pub kernel_w: usize,
    pub pad_h: usize,
    pub pad_w: usize,
    pub stride_h: usize,
    pub stride_w: usize,
    pub post_ops: Vec<PostOp>,
}

impl ConvDesc {
    pub fn validate(&self) -> DnnResult<()> {
        let dims = [
            ("batch", self.batch),
            ("in_channels", self.in_channels),
            ("in_h", self.in_h),
            ("in_w", self.in_w),
            ("out_channels", self.out_channels),
            ("kernel_h", self.kernel_h),
            ("kernel_w", self.kernel_w),
            ("stride_h", self.stride_h),
            ("stride_w", self.stride_w),
        ];
        for (field, value) in dims {
            if value == 0 {
                return Err(DnnError::ZeroDimension { field });
            }
        }

        Self::validate_axis("height", self.in_h, self.kernel_h, self.pad_h)?;
        Self::validate_axis("width", self.in_w, self.kernel_w, self.pad_w)?;

        // Every size helper below is unchecked once these hold.
        let out_pixels = checked_len("output plane", &[self.out_h(), self.out_w()])?;
        let patch_len = checked_len("patch", &[self.in_channels, self.kernel_h, self.kernel_w])?;
        checked_len("im2col workspace", &[out_pixels, patch_len])?;
        checked_len("source", &[self.batch, self.in_channels, self.in_h, self.in_w])?;
        checked_len("weights", &[self.out_channels, patch_len])?;
        checked_len("destination", &[self.batch, self.out_channels, out_pixels])?;
        Ok(())
    }

    fn validate_axis(axis: &'static str, input: usize, kernel: usize, padding: usize) -> DnnResult<()> {
        let padded = padding
            .checked_mul(2)
            .and_then(|pad| pad.checked_add(input))
            .ok_or(DnnError::SizeOverflow {
                what: "padded input",
            })?;
        if kernel > padded {
            return Err(DnnError::KernelDoesNotFit {
                axis,
                kernel,
                padded,
            });
        }
        Ok(())
    }

    /// Output height. Only meaningful for a validated descriptor.
    pub fn out_h(&self) -> usize {
        (self.in_h + 2 * self.pad_h - self.kernel_h) / self.stride_h + 1
    }

    /// Output width. Only meaningful for a validated descriptor.
    pub fn out_w(&self) -> usize {
        (self.in_w + 2 * self.pad_w - self.kernel_w) / self.stride_w + 1
    }

    /// Number of input elements contributing to one output element.
    pub fn patch_len(&self) -> usize {
        self.in_channels * self.kernel_h * self.kernel_w
    }

    pub fn src_image_len(&self) -> usize {
        self.in_channels * self.in_h * self.in_w
    }

    pub fn dst_image_len(&self) -> usize {
        self.out_channels * self.out_h() * self.out_w()
    }

    pub fn src_len(&self) -> usize {
        self.batch * self.src_image_len()
    }

    pub fn weights_len(&self) -> usize {
        self.out_channels * self.patch_len()
    }

    pub fn bias_len(&self) -> usize {
        self.out_channels
    }

    pub fn dst_len(&self) -> usize {
        self.batch * self.dst_image_len()
    }

    /// True when the convolution is a plain per-pixel channel mix and the
    /// source can be read without an im2col copy.
    pub fn is_pointwise(&self) -> bool {
        self.kernel_h == 1
            && self.kernel_w == 1
            && self.stride_h == 1
            && self.stride_w == 1
            && self.pad_h == 0
            && self.pad_w == 0
    }
}


fn checked_len(what: &'static str, extents: &[usize]) -> DnnResult<usize> {
    extents
        .iter()
        .try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
        .ok_or(DnnError::SizeOverflow { what })
}
