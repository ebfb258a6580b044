//! Operators composing the reference convolution primitive.
//!
//! A primitive is planned once into a sequence of operators. At execution
//! time every operator is applied in order for each image of the batch, all of
//! them sharing one [`ExecContext`].

use crate::dnn::ConvDesc;
use crate::errors::{DnnError, DnnResult};
use crate::utils::dot::DotKernel;

pub mod gemm_operator;
pub mod im2col_operator;
pub mod post_op_operator;

pub use gemm_operator::{GemmInput, GemmOperator};
pub use im2col_operator::Im2ColOperator;
pub use post_op_operator::PostOpOperator;

/// Buffers visible to operators while one image of the batch is processed.
pub struct ExecContext<'a> {
    /// Index of the image inside the batch.
    pub image: usize,
    pub src: &'a [f32],
    pub weights: &'a [f32],
    pub bias: &'a [f32],
    pub scratch: &'a mut [f32],
    pub dst: &'a mut [f32],
}

/// A single planned step of a convolution primitive.
pub trait Operator: Send + Sync {
    /// Stable operator name used in error messages.
    fn name(&self) -> &'static str;

    /// Scratch elements this operator needs, shared across operators.
    fn scratch_len(&self) -> usize {
        0
    }

    /// Applies the operator to the current image.
    fn apply(&self, ctx: &mut ExecContext<'_>) -> DnnResult<()>;
}

/// Plans the operator sequence for a validated descriptor.
pub(crate) fn create_operators(desc: &ConvDesc, dot_kernel: DotKernel) -> Vec<Box<dyn Operator>> {
    let mut operators: Vec<Box<dyn Operator>> = Vec::with_capacity(2 + desc.post_ops.len());

    let gemm_input = if desc.is_pointwise() {
        GemmInput::Source
    } else {
        operators.push(Box::new(Im2ColOperator::new(desc)));
        GemmInput::Scratch
    };
    operators.push(Box::new(GemmOperator::new(desc, gemm_input, dot_kernel)));

    for &post_op in &desc.post_ops {
        operators.push(Box::new(PostOpOperator::new(post_op, desc.dst_image_len())));
    }

    operators
}

/// Returns `len` elements starting at `image * len`, or an operator failure.
pub(crate) fn image_slice<'a>(
    operator: &'static str,
    buffer: &'a [f32],
    image: usize,
    len: usize,
) -> DnnResult<&'a [f32]> {
    let start = image * len;
    buffer
        .get(start..start + len)
        .ok_or_else(|| out_of_bounds(operator, start + len, buffer.len()))
}

/// Mutable counterpart of [`image_slice`].
pub(crate) fn image_slice_mut<'a>(
    operator: &'static str,
    buffer: &'a mut [f32],
    image: usize,
    len: usize,
) -> DnnResult<&'a mut [f32]> {
    let start = image * len;
    let buffer_len = buffer.len();
    buffer
        .get_mut(start..start + len)
        .ok_or_else(|| out_of_bounds(operator, start + len, buffer_len))
}

fn out_of_bounds(operator: &'static str, required: usize, available: usize) -> DnnError {
    DnnError::OperatorFailed {
        operator,
        message: format!("buffer of {available} elements cannot hold {required}"),
    }
}
