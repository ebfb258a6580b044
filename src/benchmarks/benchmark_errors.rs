//! Error types for benchmark operations.

use crate::conv_shape::ConvShape;
use crate::errors::ConvError;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum BenchmarkError {
    ConfigFileNotFound {
        path: String,
    },
    ConfigParseError {
        path: String,
        source: serde_json::Error,
    },
    ConfigValidationError {
        field: String,
        message: String,
    },
    IoError {
        source: std::io::Error,
    },
    InvalidNumExecutions {
        value: u32,
    },
    UnknownKernel {
        name: String,
    },
    Conv {
        source: ConvError,
    },
    VerificationFailed {
        shape: ConvShape,
        message: String,
    },
    BenchmarkExecutionError {
        benchmark_name: String,
        message: String,
    },
}

impl fmt::Display for BenchmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchmarkError::ConfigFileNotFound { path } => {
                write!(f, "Configuration file not found: {}", path)
            }
            BenchmarkError::ConfigParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse configuration file '{}': {}",
                    path, source
                )
            }
            BenchmarkError::ConfigValidationError { field, message } => {
                write!(
                    f,
                    "Configuration validation error for field '{}': {}",
                    field, message
                )
            }
            BenchmarkError::IoError { source } => {
                write!(f, "IO error: {}", source)
            }
            BenchmarkError::InvalidNumExecutions { value } => {
                write!(
                    f,
                    "Invalid number of executions: {}. Must be greater than 0",
                    value
                )
            }
            BenchmarkError::UnknownKernel { name } => {
                write!(
                    f,
                    "Unknown kernel: '{}'. Supported: reference, candidate",
                    name
                )
            }
            BenchmarkError::Conv { source } => {
                write!(f, "Convolution error: {}", source)
            }
            BenchmarkError::VerificationFailed { shape, message } => {
                write!(f, "Output verification failed for [{}]: {}", shape, message)
            }
            BenchmarkError::BenchmarkExecutionError {
                benchmark_name,
                message,
            } => {
                write!(
                    f,
                    "Benchmark '{}' execution error: {}",
                    benchmark_name, message
                )
            }
        }
    }
}

impl Error for BenchmarkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BenchmarkError::ConfigParseError { source, .. } => Some(source),
            BenchmarkError::IoError { source } => Some(source),
            BenchmarkError::Conv { source } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BenchmarkError {
    fn from(error: std::io::Error) -> Self {
        BenchmarkError::IoError { source: error }
    }
}

impl From<ConvError> for BenchmarkError {
    fn from(error: ConvError) -> Self {
        BenchmarkError::Conv { source: error }
    }
}

pub type BenchmarkResult<T> = Result<T, BenchmarkError>;
