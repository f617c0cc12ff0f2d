use crate::{CaptureMode, CaseState, PhaseName, PhaseOutcome, PhaseStatus};

/// Health of one acquisition sub-step, as seen by the gating rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepHealth {
    Ok,
    Degraded,
    Failed,
    Skipped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Proceed,
    Abort,
}

pub fn gate(outcome: &PhaseOutcome) -> Gate {
    if outcome.status.passes() {
        Gate::Proceed
    } else {
        Gate::Abort
    }
}

/// Acquisition passes as long as memory capture produced an artifact and, in complete mode,
/// the verified working copy exists. Everything else only degrades the phase.
pub fn acquisition_status(mode: CaptureMode, memory: StepHealth, disk: StepHealth, auxiliary_degraded: bool) -> PhaseStatus {
    if memory == StepHealth::Failed {
        return PhaseStatus::HardFailure;
    }
    if mode == CaptureMode::Complete && disk != StepHealth::Ok {
        return PhaseStatus::HardFailure;
    }
    let degraded = memory == StepHealth::Degraded
        || matches!(disk, StepHealth::Degraded | StepHealth::Failed)
        || auxiliary_degraded;
    if degraded {
        PhaseStatus::SoftFailure
    } else {
        PhaseStatus::Success
    }
}

/// State the case is in while `phase` runs.
pub fn state_for_phase(phase: PhaseName) -> CaseState {
    match phase {
        PhaseName::VerifyEnvironment => CaseState::Created,
        PhaseName::Acquire => CaseState::Acquiring,
        PhaseName::Analyze => CaseState::Analyzing,
        PhaseName::Report => CaseState::Reporting,
    }
}

impl CaseState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaseState::Complete | CaseState::Failed | CaseState::Stopped)
    }

    pub fn can_transition_to(&self, next: CaseState) -> bool {
        use CaseState::*;
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (_, Failed) | (_, Stopped) => true,
            (Created, Acquiring) => true,
            (Acquiring, Analyzing) => true,
            (Analyzing, Reporting) => true,
            (Reporting, Complete) => true,
            (a, b) => *a == b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn complete_mode_requires_verified_disk() {
        assert_eq!(
            acquisition_status(CaptureMode::Complete, StepHealth::Ok, StepHealth::Failed, false),
            PhaseStatus::HardFailure
        );
        assert_eq!(
            acquisition_status(CaptureMode::Complete, StepHealth::Ok, StepHealth::Ok, false),
            PhaseStatus::Success
        );
    }

    #[test]
    fn selective_disk_failure_is_soft() {
        assert_eq!(
            acquisition_status(CaptureMode::Selective, StepHealth::Ok, StepHealth::Failed, false),
            PhaseStatus::SoftFailure
        );
        assert_eq!(
            acquisition_status(CaptureMode::None, StepHealth::Degraded, StepHealth::Skipped, false),
            PhaseStatus::SoftFailure
        );
    }

    #[test]
    fn lost_memory_capture_is_hard() {
        assert_eq!(
            acquisition_status(CaptureMode::None, StepHealth::Failed, StepHealth::Skipped, false),
            PhaseStatus::HardFailure
        );
    }

    #[test]
    fn hard_outcome_aborts() {
        let o = PhaseOutcome::hard(PhaseName::Acquire, "digests differ", ErrorKind::IntegrityMismatch);
        assert_eq!(gate(&o), Gate::Abort);
        assert_eq!(gate(&PhaseOutcome::soft(PhaseName::Acquire, "placeholder")), Gate::Proceed);
    }

    #[test]
    fn lifecycle_transitions() {
        assert!(CaseState::Created.can_transition_to(CaseState::Acquiring));
        assert!(CaseState::Analyzing.can_transition_to(CaseState::Stopped));
        assert!(!CaseState::Created.can_transition_to(CaseState::Analyzing));
        assert!(!CaseState::Complete.can_transition_to(CaseState::Failed));
        assert!(!CaseState::Stopped.can_transition_to(CaseState::Acquiring));
    }
}
