//! The four pipeline phases, in run order.

pub mod acquire;
pub mod analyze;
pub mod report;
pub mod verify;

pub use acquire::*;
pub use analyze::*;
pub use report::*;
pub use verify::*;

use ff_core::{ErrorKind, PhaseName, PhaseOutcome};
use ff_evidence::FsRecorder;

use crate::{Phase, RunContext};

/// Verify, acquire, analyze, report, with tools resolved from the run's config.
pub fn standard_phases() -> Vec<Box<dyn Phase>> {
    vec![
        Box::new(VerifyEnvironmentPhase::new()),
        Box::new(AcquirePhase::new()),
        Box::new(AnalyzePhase::new()),
        Box::new(ReportPhase),
    ]
}

/// The recorder, or the hard outcome to return when the evidence tree was never created.
pub(crate) fn require_recorder(ctx: &RunContext, phase: PhaseName) -> Result<FsRecorder, PhaseOutcome> {
    ctx.recorder().ok_or_else(|| PhaseOutcome::hard(phase, "evidence directory not initialised", ErrorKind::Io))
}
