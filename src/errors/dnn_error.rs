//! Error types for the operator-based convolution primitive.

use thiserror::Error;

/// Errors raised by [`ConvPrimitive`](crate::dnn::ConvPrimitive) creation, binding or execution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnnError {
    #[error("Descriptor field '{field}' must be greater than 0")]
    ZeroDimension { field: &'static str },

    #[error(
        "Kernel extent {kernel} does not fit the padded input extent {padded} along the {axis} axis"
    )]
    KernelDoesNotFit {
        axis: &'static str,
        kernel: usize,
        padded: usize,
    },

    #[error("The {what} size overflows usize")]
    SizeOverflow { what: &'static str },

    #[error("Scratch workspace exceeds the maximum allowed elements: {actual} > {max}")]
    WorkspaceTooLarge { actual: usize, max: usize },

    #[error("Bound {argument} memory has {actual} elements, the descriptor requires {expected}")]
    MemorySizeMismatch {
        argument: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("Operator '{operator}' failed: {message}")]
    OperatorFailed {
        operator: &'static str,
        message: String,
    },
}

pub type DnnResult<T> = std::result::Result<T, DnnError>;
