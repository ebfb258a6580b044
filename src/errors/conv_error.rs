//! Error types for problem construction and kernel execution.

use thiserror::Error;

/// Reasons a [`ConvShape`](crate::ConvShape) cannot produce a problem instance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("The {parameter} must be greater than 0")]
    NonPositiveParameter { parameter: &'static str },

    #[error(
        "Kernel size {kernel_size} exceeds the padded input extent {padded_extent}, the output would be empty"
    )]
    KernelExceedsPaddedInput {
        kernel_size: usize,
        padded_extent: usize,
    },

    #[error("The {parameter} value {value} is out of range")]
    ParameterOutOfRange { parameter: &'static str, value: i64 },

    #[error("The {buffer} buffer element count overflows usize")]
    BufferSizeOverflow { buffer: &'static str },

    #[error("The {buffer} buffer has {actual} elements, the shape requires {expected}")]
    BufferLengthMismatch {
        buffer: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Errors raised while building a problem instance or driving a kernel over it.
#[derive(Error, Debug)]
pub enum ConvError {
    #[error("Invalid convolution shape: {0}")]
    InvalidShape(#[from] ShapeError),

    #[error("Kernel '{kernel}' rejected the configuration: {reason}")]
    KernelRejected { kernel: String, reason: String },

    #[error("Kernel '{kernel}' faulted during execution: {message}")]
    RuntimeFault { kernel: String, message: String },
}

impl ConvError {
    /// Shape and setup errors only invalidate the configuration that raised them.
    /// A fault inside the timed loop invalidates the whole comparison.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ConvError::RuntimeFault { .. })
    }
}
