//! Micro-benchmark harness for 2D convolution kernels.
//!
//! A convolution problem is described by a [`ConvShape`], materialised once
//! as a [`ProblemInstance`] and handed to a kernel adapter. Two kernels are
//! compared: a reference built from an operator primitive that is described,
//! created and bound once and then executed repeatedly, and a candidate
//! direct kernel called with a flat argument list on every run.

pub mod adapters;
pub mod benchmarks;
pub mod conv_shape;
pub mod direct_conv;
pub mod dnn;
pub mod errors;
pub mod operators;
pub mod problem_instance;
pub mod utils;

pub use adapters::{CandidateConv, ConvKernel, KernelExtent, KernelKind, ReferenceConv};
pub use conv_shape::{ConvShape, ShapeEntry};
pub use errors::{ConvError, ConvResult, ShapeError};
pub use problem_instance::{BufferInit, InstanceOptions, ProblemInstance};
