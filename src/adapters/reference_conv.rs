//! Reference adapter over the operator-based convolution primitive.

use crate::adapters::{ConvKernel, KernelExtent};
use crate::dnn::{ConvDesc, ConvMemory, ConvPrimitive, PostOp};
use crate::errors::{ConvError, ConvResult};
use crate::problem_instance::ProblemInstance;

/// Binds a [`ProblemInstance`] to a [`ConvPrimitive`].
///
/// The descriptor is built, validated, planned and bound at construction;
/// [`run`](ConvKernel::run) only executes. The primitive's scratch memory
/// lives as long as the adapter.
pub struct ReferenceConv {
    instance: ProblemInstance,
    primitive: ConvPrimitive,
}

impl ReferenceConv {
    pub const NAME: &'static str = "reference";

    pub fn new(mut instance: ProblemInstance) -> ConvResult<Self> {
        let desc = ConvDesc {
            batch: instance.batch(),
            in_channels: instance.in_channels(),
            in_h: instance.ih(),
            in_w: instance.iw(),
            out_channels: instance.out_channels(),
            kernel_h: instance.kh(),
            kernel_w: instance.kw(),
            pad_h: instance.padding(),
            pad_w: instance.padding(),
            stride_h: instance.stride(),
            stride_w: instance.stride(),
            post_ops: vec![PostOp::Relu],
        };

        let primitive = ConvPrimitive::new(desc).map_err(|e| rejected(e.to_string()))?;
        let (src, weights, bias, dst) = instance.buffers_mut();
        primitive
            .bind(&ConvMemory {
                src,
                weights,
                bias,
                dst,
            })
            .map_err(|e| rejected(e.to_string()))?;

        Ok(Self {
            instance,
            primitive,
        })
    }

    /// Names of the operators the primitive planned for this shape.
    pub fn operator_names(&self) -> Vec<&'static str> {
        self.primitive.operator_names()
    }
}

impl ConvKernel for ReferenceConv {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn instance(&self) -> &ProblemInstance {
        &self.instance
    }

    fn extent(&self) -> KernelExtent {
        let desc = self.primitive.desc();
        KernelExtent {
            out_h: desc.out_h(),
            out_w: desc.out_w(),
            in_channels: desc.in_channels,
            out_channels: desc.out_channels,
            kernel_h: desc.kernel_h,
            kernel_w: desc.kernel_w,
        }
    }

    fn run(&mut self) -> ConvResult<()> {
        let (src, weights, bias, dst) = self.instance.buffers_mut();
        self.primitive
            .execute(ConvMemory {
                src,
                weights,
                bias,
                dst,
            })
            .map_err(|e| ConvError::RuntimeFault {
                kernel: Self::NAME.to_string(),
                message: e.to_string(),
            })
    }
}

fn rejected(reason: String) -> ConvError {
    ConvError::KernelRejected {
        kernel: ReferenceConv::NAME.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conv_shape::ConvShape;

    #[test]
    fn test_plans_im2col_for_spatial_kernels() {
        let instance = ProblemInstance::build(ConvShape::new(1, 8, 2, 4, 3, 1, 2)).unwrap();
        let kernel = ReferenceConv::new(instance).unwrap();
        assert_eq!(kernel.operator_names(), vec!["im2col", "gemm", "post_op"]);
        assert_eq!(kernel.extent().out_h, 4);
    }

    #[test]
    fn test_padding_wider_than_kernel_yields_bias_at_border() {
        let shape = ConvShape::new(1, 4, 1, 1, 1, 1, 1);
        let instance =
            ProblemInstance::from_buffers(shape, 1.0, vec![1.0; 16], vec![2.0], vec![0.5]).unwrap();
        let mut kernel = ReferenceConv::new(instance).unwrap();
        assert_eq!(kernel.operator_names(), vec!["im2col", "gemm", "post_op"]);
        assert_eq!(kernel.extent().out_h, 6);
        kernel.run().unwrap();

        let dst = kernel.instance().dst();
        for y in 0..6 {
            for x in 0..6 {
                let border = y == 0 || x == 0 || y == 5 || x == 5;
                let expected = if border { 0.5 } else { 2.5 };
                assert_eq!(dst[y * 6 + x], expected, "({}, {})", y, x);
            }
        }
    }

    #[test]
    fn test_oversized_workspace_is_rejected() {
        let instance = ProblemInstance::build(ConvShape::new(1, 1, 1, 1, 9, 500, 1)).unwrap();
        let result = ReferenceConv::new(instance);
        assert!(matches!(
            result,
            Err(ConvError::KernelRejected { ref kernel, .. }) if kernel == "reference"
        ));
    }

    #[test]
    fn test_run_leaves_zeroed_output_at_zero() {
        let instance = ProblemInstance::build(ConvShape::new(2, 5, 3, 2, 3, 1, 1)).unwrap();
        let mut kernel = ReferenceConv::new(instance).unwrap();
        kernel.run().unwrap();
        assert!(kernel.instance().dst().iter().all(|&v| v == 0.0));
    }
}
