use ff_core::{ErrorKind, LogEntry, LogLevel, PhaseName, PhaseStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseState {
    Running,
    Done(PhaseStatus),
    /// Never started because an earlier phase aborted or the run was stopped.
    Skipped,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed { phase: PhaseName, kind: Option<ErrorKind>, diagnostic: String },
    /// Cancelled by the operator; `before` is the phase that never started.
    Stopped { before: PhaseName },
}

impl RunOutcome {
    pub fn is_integrity_mismatch(&self) -> bool {
        matches!(self, RunOutcome::Failed { kind: Some(ErrorKind::IntegrityMismatch), .. })
    }
}

/// Everything the worker tells the foreground, in order.
#[derive(Clone, Debug)]
pub enum PipelineEvent {
    Log(LogEntry),
    Phase { phase: PhaseName, state: PhaseState },
    Finished(RunOutcome),
}

/// Foreground view of a run, rebuilt from events only.
#[derive(Clone, Debug, Default)]
pub struct StatusBoard {
    pub phases: [Option<PhaseState>; 4],
    pub warnings: usize,
    pub errors: usize,
    pub finished: Option<RunOutcome>,
}

impl StatusBoard {
    pub fn apply(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Log(entry) => match entry.level {
                LogLevel::Warning => self.warnings += 1,
                LogLevel::Error => self.errors += 1,
                _ => {}
            },
            PipelineEvent::Phase { phase, state } => self.phases[phase.index()] = Some(*state),
            PipelineEvent::Finished(outcome) => self.finished = Some(outcome.clone()),
        }
    }

    pub fn state(&self, phase: PhaseName) -> Option<PhaseState> {
        self.phases[phase.index()]
    }

    /// Names of the phases that reported `Running`, in pipeline order.
    pub fn started(&self) -> Vec<PhaseName> {
        PhaseName::ORDER.into_iter().filter(|p| self.state(*p).is_some_and(|s| s != PhaseState::Skipped)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_tracks_phases_and_counts() {
        let mut board = StatusBoard::default();
        board.apply(&PipelineEvent::Phase { phase: PhaseName::VerifyEnvironment, state: PhaseState::Running });
        board.apply(&PipelineEvent::Log(LogEntry::now(LogLevel::Warning, "x")));
        board.apply(&PipelineEvent::Phase {
            phase: PhaseName::VerifyEnvironment,
            state: PhaseState::Done(PhaseStatus::SoftFailure),
        });
        board.apply(&PipelineEvent::Phase { phase: PhaseName::Acquire, state: PhaseState::Skipped });
        board.apply(&PipelineEvent::Finished(RunOutcome::Stopped { before: PhaseName::Acquire }));
        assert_eq!(board.warnings, 1);
        assert_eq!(board.started(), vec![PhaseName::VerifyEnvironment]);
        assert_eq!(board.finished, Some(RunOutcome::Stopped { before: PhaseName::Acquire }));
    }
}
