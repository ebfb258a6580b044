//! Operator-based convolution library backing the reference kernel.
//!
//! Usage follows a describe / create / bind / execute sequence:
//! a [`ConvDesc`] is validated and planned by [`ConvPrimitive::new`], the
//! caller's buffers are checked once by [`ConvPrimitive::bind`], and
//! [`ConvPrimitive::execute`] can then be called any number of times.

mod conv_desc;
mod conv_primitive;

pub use conv_desc::{ConvDesc, PostOp};
pub use conv_primitive::{ConvMemory, ConvPrimitive};
