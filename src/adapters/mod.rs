//! Kernel adapters.
//!
//! Each adapter binds one [`ProblemInstance`] to one convolution
//! implementation and exposes a single repeatable [`ConvKernel::run`]. The
//! benchmark driver only sees the trait, so new kernel variants plug in
//! without touching it.

use crate::errors::ConvResult;
use crate::problem_instance::ProblemInstance;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod candidate_conv;
pub mod reference_conv;

pub use candidate_conv::CandidateConv;
pub use reference_conv::ReferenceConv;

/// Extents a kernel actually computes with, as seen through its own API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelExtent {
    pub out_h: usize,
    pub out_w: usize,
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_h: usize,
    pub kernel_w: usize,
}

/// A convolution bound to its problem instance, ready to be timed.
pub trait ConvKernel {
    /// Kernel name used in logs and reports.
    fn name(&self) -> &'static str;

    /// The instance this kernel reads and writes.
    fn instance(&self) -> &ProblemInstance;

    fn extent(&self) -> KernelExtent;

    /// Computes the convolution over the bound buffers. Safe to call any
    /// number of times.
    fn run(&mut self) -> ConvResult<()>;
}

/// Registered kernel implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelKind {
    Reference,
    Candidate,
}

impl KernelKind {
    pub const ALL: [KernelKind; 2] = [KernelKind::Reference, KernelKind::Candidate];

    pub fn name(self) -> &'static str {
        match self {
            KernelKind::Reference => ReferenceConv::NAME,
            KernelKind::Candidate => CandidateConv::NAME,
        }
    }

    pub fn get_by_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Binds a kernel of this kind to the instance, doing all one-time setup.
    pub fn create(self, instance: ProblemInstance) -> ConvResult<Box<dyn ConvKernel>> {
        Ok(match self {
            KernelKind::Reference => Box::new(ReferenceConv::new(instance)?),
            KernelKind::Candidate => Box::new(CandidateConv::new(instance)?),
        })
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
