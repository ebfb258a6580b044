//! Numeric helpers shared by the kernels.

pub(crate) mod dot;
pub mod layout;
