//! Convolution primitive: describe once, bind once, execute many times.

use crate::dnn::ConvDesc;
use crate::errors::{DnnError, DnnResult};
use crate::operators::{ExecContext, Operator, create_operators};
use crate::utils::dot::DotKernel;

/// Maximum scratch workspace a primitive may allocate, in f32 elements.
const MAX_SCRATCH_ELEMENTS: usize = 64 * 1024 * 1024;

/// Memory handed to a primitive for binding and execution.
pub struct ConvMemory<'a> {
    pub src: &'a [f32],
    pub weights: &'a [f32],
    pub bias: &'a [f32],
    pub dst: &'a mut [f32],
}

/// An execution-ready convolution.
///
/// Creation validates the descriptor, plans the operator sequence and
/// allocates the scratch workspace. Nothing is allocated by [`execute`].
///
/// [`execute`]: ConvPrimitive::execute
pub struct ConvPrimitive {
    desc: ConvDesc,
    operators: Vec<Box<dyn Operator>>,
    scratch: Vec<f32>,
}

impl ConvPrimitive {
    pub fn new(desc: ConvDesc) -> DnnResult<Self> {
        desc.validate()?;

        let operators = create_operators(&desc, DotKernel::detect());
        let scratch_len = operators
            .iter()
            .map(|op| op.scratch_len())
            .max()
            .unwrap_or(0);
        if scratch_len > MAX_SCRATCH_ELEMENTS {
            return Err(DnnError::WorkspaceTooLarge {
                actual: scratch_len,
                max: MAX_SCRATCH_ELEMENTS,
            });
        }

        Ok(Self {
            desc,
            operators,
            scratch: vec![0.0f32; scratch_len],
        })
    }

    pub fn desc(&self) -> &ConvDesc {
        &self.desc
    }

    pub fn scratch_len(&self) -> usize {
        self.scratch.len()
    }

    /// Names of the planned operators, in execution order.
    pub fn operator_names(&self) -> Vec<&'static str> {
        self.operators.iter().map(|op| op.name()).collect()
    }

    /// Checks that every buffer matches the descriptor exactly.
    pub fn bind(&self, memory: &ConvMemory<'_>) -> DnnResult<()> {
        let expected = [
            ("source", memory.src.len(), self.desc.src_len()),
            ("weights", memory.weights.len(), self.desc.weights_len()),
            ("bias", memory.bias.len(), self.desc.bias_len()),
            ("destination", memory.dst.len(), self.desc.dst_len()),
        ];
        for (argument, actual, expected) in expected {
            if actual != expected {
                return Err(DnnError::MemorySizeMismatch {
                    argument,
                    actual,
                    expected,
                });
            }
        }
        Ok(())
    }

    /// Runs every operator over every image of the batch.
    ///
    /// The memory is expected to have passed [`bind`](ConvPrimitive::bind);
    /// undersized buffers surface as [`DnnError::OperatorFailed`].
    pub fn execute(&mut self, memory: ConvMemory<'_>) -> DnnResult<()> {
        let ConvMemory {
            src,
            weights,
            bias,
            dst,
        } = memory;

        for image in 0..self.desc.batch {
            let mut ctx = ExecContext {
                image,
                src,
                weights,
                bias,
                scratch: &mut self.scratch,
                dst: &mut *dst,
            };
            for operator in &self.operators {
                operator.apply(&mut ctx)?;
            }
        }
        Ok(())
    }
}
