//! Error types for the convolution benchmark harness.
//!
//! Each area owns a specific error enum instead of a generic wrapper such as
//! `anyhow` or `Box<dyn Error>`.

mod conv_error;
mod dnn_error;

pub use conv_error::{ConvError, ShapeError};
pub use dnn_error::{DnnError, DnnResult};

/// Result type alias for problem construction and kernel operations.
pub type ConvResult<T> = std::result::Result<T, ConvError>;
