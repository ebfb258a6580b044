//! Candidate adapter over the flat-argument direct convolution kernel.

use crate::adapters::{ConvKernel, KernelExtent};
use crate::direct_conv;
use crate::errors::{ConvError, ConvResult};
use crate::problem_instance::ProblemInstance;

/// Calls [`direct_conv::conv`] afresh on every [`run`](ConvKernel::run).
///
/// The kernel's preconditions (square input, square kernel, square output,
/// no padding, unit stride) are checked once here so a violation is reported
/// before any timing starts.
pub struct CandidateConv {
    instance: ProblemInstance,
}

impl CandidateConv {
    pub const NAME: &'static str = "candidate";

    pub fn new(instance: ProblemInstance) -> ConvResult<Self> {
        Self::check_contract(&instance)?;
        Ok(Self { instance })
    }

    fn check_contract(instance: &ProblemInstance) -> ConvResult<()> {
        let checks = [
            (instance.ih() == instance.iw(), "input must be square"),
            (instance.kh() == instance.kw(), "kernel must be square"),
            (instance.oh() == instance.ow(), "output must be square"),
            (instance.padding() == 0, "padding is not supported"),
            (instance.stride() == 1, "only unit stride is supported"),
        ];
        if let Some((_, reason)) = checks.iter().find(|(ok, _)| !ok) {
            return Err(ConvError::KernelRejected {
                kernel: Self::NAME.to_string(),
                reason: reason.to_string(),
            });
        }

        // Implied by the checks above, asserted to keep the kernel call safe.
        debug_assert_eq!(instance.oh(), instance.ih() - instance.kh() + 1);
        Ok(())
    }
}

impl ConvKernel for CandidateConv {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn instance(&self) -> &ProblemInstance {
        &self.instance
    }

    fn extent(&self) -> KernelExtent {
        KernelExtent {
            out_h: self.instance.oh(),
            out_w: self.instance.ow(),
            in_channels: self.instance.in_channels(),
            out_channels: self.instance.out_channels(),
            kernel_h: self.instance.kh(),
            kernel_w: self.instance.kw(),
        }
    }

    fn run(&mut self) -> ConvResult<()> {
        let instance = &mut self.instance;
        let (oh, ow, oc, kw) = (
            instance.oh(),
            instance.ow(),
            instance.out_channels(),
            instance.kw(),
        );
        let (ic, ih, iw, batch) = (
            instance.in_channels(),
            instance.ih(),
            instance.iw(),
            instance.batch(),
        );
        let scale = instance.scale();
        let (src, weights, bias, dst) = instance.buffers_mut();

        direct_conv::conv(
            None, oh, ow, oc, kw, ic, ih, iw, &scale, batch, src, dst, weights, bias,
        );
        Ok(())
    }
}
