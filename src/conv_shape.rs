//! Convolution problem shape.
//!
//! A shape is the seven scalar parameters a benchmark configuration is
//! registered with. Input and kernel are square: only one spatial extent and
//! one kernel extent are stored, so `IH == IW` and `KH == KW` hold by
//! construction.

use crate::errors::{ConvResult, ShapeError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The seven parameters of a 2D convolution problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConvShape {
    /// Batch size (N).
    pub batch: usize,
    /// Input height and width (IH = IW).
    pub in_dim: usize,
    /// Input channels (IC).
    pub in_channels: usize,
    /// Output channels (OC).
    pub out_channels: usize,
    /// Kernel height and width (KH = KW).
    pub kernel_size: usize,
    /// Zero padding applied on every spatial border (P).
    pub padding: usize,
    /// Stride along both spatial axes (S).
    pub stride: usize,
}

impl ConvShape {
    /// Creates a shape in the registration order used by the benchmark tables:
    /// `N, in-dim, in-chan, out-chan, kern-dim, pad, stride`.
    pub const fn new(
        batch: usize,
        in_dim: usize,
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        padding: usize,
        stride: usize,
    ) -> Self {
        Self {
            batch,
            in_dim,
            in_channels,
            out_channels,
            kernel_size,
            padding,
            stride,
        }
    }

    /// Checks that every extent is positive and that the kernel fits the
    /// padded input.
    pub fn validate(&self) -> ConvResult<()> {
        let positive = [
            ("batch size", self.batch),
            ("input dimension", self.in_dim),
            ("input channel count", self.in_channels),
            ("output channel count", self.out_channels),
            ("kernel size", self.kernel_size),
            ("stride", self.stride),
        ];
        for (parameter, value) in positive {
            if value == 0 {
                return Err(ShapeError::NonPositiveParameter { parameter }.into());
            }
        }

        let padded_extent = self.padded_extent()?;
        if self.kernel_size > padded_extent {
            return Err(ShapeError::KernelExceedsPaddedInput {
                kernel_size: self.kernel_size,
                padded_extent,
            }
            .into());
        }

        Ok(())
    }

    /// Output height and width: `floor((IH + 2P - K) / S) + 1`.
    pub fn out_dim(&self) -> ConvResult<usize> {
        self.validate()?;
        Ok((self.padded_extent()? - self.kernel_size) / self.stride + 1)
    }

    /// Multiply-accumulate count of one forward pass, counted as two flops each.
    pub fn flops(&self) -> ConvResult<u64> {
        let out_dim = self.out_dim()? as u64;
        let per_output =
            (self.in_channels as u64) * (self.kernel_size as u64) * (self.kernel_size as u64);
        Ok(2 * self.batch as u64
            * self.out_channels as u64
            * out_dim
            * out_dim
            * per_output)
    }

    /// Short label used for benchmark identifiers, e.g. `n4_i224_c3_o64_k7_p3_s2`.
    pub fn label(&self) -> String {
        format!(
            "n{}_i{}_c{}_o{}_k{}_p{}_s{}",
            self.batch,
            self.in_dim,
            self.in_channels,
            self.out_channels,
            self.kernel_size,
            self.padding,
            self.stride
        )
    }

    fn padded_extent(&self) -> ConvResult<usize> {
        self.padding
            .checked_mul(2)
            .and_then(|pad| pad.checked_add(self.in_dim))
            .ok_or_else(|| {
                ShapeError::BufferSizeOverflow {
                    buffer: "padded input",
                }
                .into()
            })
    }
}

impl fmt::Display for ConvShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N={} IH=IW={} IC={} OC={} K={} P={} S={}",
            self.batch,
            self.in_dim,
            self.in_channels,
            self.out_channels,
            self.kernel_size,
            self.padding,
            self.stride
        )
    }
}

/// A shape as written in a suite file.
///
/// Fields are signed so that a negative value still loads and is reported
/// against its own configuration when converted into a [`ConvShape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeEntry {
    pub batch: i64,
    pub in_dim: i64,
    pub in_channels: i64,
    pub out_channels: i64,
    pub kernel_size: i64,
    pub padding: i64,
    pub stride: i64,
}

impl ShapeEntry {
    /// Same format as [`ConvShape::label`], negative values included.
    pub fn label(&self) -> String {
        format!(
            "n{}_i{}_c{}_o{}_k{}_p{}_s{}",
            self.batch,
            self.in_dim,
            self.in_channels,
            self.out_channels,
            self.kernel_size,
            self.padding,
            self.stride
        )
    }
}

impl From<ConvShape> for ShapeEntry {
    fn from(shape: ConvShape) -> Self {
        // usize -> i64 saturates; such a shape overflows its buffers anyway.
        let signed = |value: usize| i64::try_from(value).unwrap_or(i64::MAX);
        Self {
            batch: signed(shape.batch),
            in_dim: signed(shape.in_dim),
            in_channels: signed(shape.in_channels),
            out_channels: signed(shape.out_channels),
            kernel_size: signed(shape.kernel_size),
            padding: signed(shape.padding),
            stride: signed(shape.stride),
        }
    }
}

impl TryFrom<ShapeEntry> for ConvShape {
    type Error = ShapeError;

    /// Rejects negative values. Zero extents convert and are left to
    /// [`ConvShape::validate`].
    fn try_from(entry: ShapeEntry) -> Result<Self, Self::Error> {
        let extent = |parameter: &'static str, value: i64| {
            if value < 0 {
                return Err(ShapeError::NonPositiveParameter { parameter });
            }
            usize::try_from(value).map_err(|_| ShapeError::ParameterOutOfRange { parameter, value })
        };
        let padding = usize::try_from(entry.padding).map_err(|_| {
            ShapeError::ParameterOutOfRange {
                parameter: "padding",
                value: entry.padding,
            }
        })?;

        Ok(Self {
            batch: extent("batch size", entry.batch)?,
            in_dim: extent("input dimension", entry.in_dim)?,
            in_channels: extent("input channel count", entry.in_channels)?,
            out_channels: extent("output channel count", entry.out_channels)?,
            kernel_size: extent("kernel size", entry.kernel_size)?,
            padding,
            stride: extent("stride", entry.stride)?,
        })
    }
}
