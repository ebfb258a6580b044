//! Cross-kernel output verification.

use super::benchmark_errors::{BenchmarkError, BenchmarkResult};
use super::performance_metrics::verify_outputs_match;
use crate::adapters::{CandidateConv, ConvKernel, ReferenceConv};
use crate::conv_shape::ConvShape;
use crate::errors::ConvError;
use crate::problem_instance::{BufferInit, InstanceOptions, ProblemInstance};
use crate::utils::layout::{nchw_to_nhwc, nhwc_to_nchw, oihw_to_hwio};
use log::{debug, info};

/// Relative tolerance between kernels accumulating in different orders.
pub const VERIFY_TOLERANCE: f32 = 1e-4;

/// Outcome of a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verification {
    /// Both kernels produced the same output; holds the largest difference.
    Agreed { max_diff: f32 },
    /// The candidate kernel does not accept this shape.
    Skipped,
}

/// Runs both kernels over the same pattern-filled problem and compares the
/// destinations.
///
/// The reference reads NCHW/OIHW and the candidate NHWC/HWIO, so the inputs
/// are converted for the candidate and its output converted back. Scale is
/// fixed to 1.0 so both epilogues reduce to `relu(bias + sum)`.
pub fn verify_kernels_agree(shape: ConvShape, tolerance: f32) -> BenchmarkResult<Verification> {
    let options = InstanceOptions {
        scale: 1.0,
        init: BufferInit::Pattern,
    };
    let reference_instance = ProblemInstance::build_with(shape, &options)?;

    let (n, c, h, w) = (
        reference_instance.batch(),
        reference_instance.in_channels(),
        reference_instance.ih(),
        reference_instance.iw(),
    );
    let (oc, kh, kw) = (
        reference_instance.out_channels(),
        reference_instance.kh(),
        reference_instance.kw(),
    );
    let candidate_instance = ProblemInstance::from_buffers(
        shape,
        options.scale,
        nchw_to_nhwc(reference_instance.src(), n, c, h, w),
        oihw_to_hwio(reference_instance.weights(), oc, c, kh, kw),
        reference_instance.bias().to_vec(),
    )?;

    let mut candidate = match CandidateConv::new(candidate_instance) {
        Ok(candidate) => candidate,
        Err(ConvError::KernelRejected { reason, .. }) => {
            debug!("Skipping verification for [{}]: {}", shape, reason);
            return Ok(Verification::Skipped);
        }
        Err(e) => return Err(e.into()),
    };
    let mut reference = ReferenceConv::new(reference_instance)?;

    reference.run()?;
    candidate.run()?;

    let instance = candidate.instance();
    let candidate_nchw = nhwc_to_nchw(
        instance.dst(),
        instance.batch(),
        instance.out_channels(),
        instance.oh(),
        instance.ow(),
    );

    match verify_outputs_match(reference.instance().dst(), &candidate_nchw, tolerance) {
        Ok(max_diff) => {
            info!("✅ Outputs match for [{}] (max diff {:e})", shape, max_diff);
            Ok(Verification::Agreed { max_diff })
        }
        Err(message) => Err(BenchmarkError::VerificationFailed { shape, message }),
    }
}
