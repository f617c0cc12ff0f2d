use ff_capture::{record_dump_digests, CaptureExecutor};
use ff_core::{
    acquisition_status, produced_artifact, CaptureMode, Degraded, ErrorKind, FlowError, Journal, PhaseName, PhaseOutcome,
    PhaseStatus, StepHealth,
};
use ff_evidence::Recorder;

use super::require_recorder;
use crate::{Phase, RunContext};

/// Phase 2: memory image, system inventory, disk capture per mode, dump digests.
pub struct AcquirePhase {
    executor: Option<CaptureExecutor>,
}

impl AcquirePhase {
    /// Resolve the capture tools from the run's config when the phase starts.
    pub fn new() -> Self {
        Self { executor: None }
    }

    pub fn with_executor(executor: CaptureExecutor) -> Self {
        Self { executor: Some(executor) }
    }
}

impl Default for AcquirePhase {
    fn default() -> Self {
        Self::new()
    }
}

impl Phase for AcquirePhase {
    fn name(&self) -> PhaseName {
        PhaseName::Acquire
    }

    fn run(&mut self, ctx: &mut RunContext) -> PhaseOutcome {
        let name = self.name();
        let recorder = match require_recorder(ctx, name) {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };
        let exec = self.executor.get_or_insert_with(|| ctx.config.capture_executor());
        let layout = recorder.layout().clone();
        let mode = ctx.request.mode;
        ctx.journal.info(&format!("capture mode: {}", mode.label()));
        let mut notes: Vec<String> = Vec::new();

        // Memory first: it is the most volatile evidence.
        ctx.journal.phase("VOLATILE MEMORY CAPTURE");
        let memory = exec.capture_memory(&layout.dumps(), &ctx.journal);
        let memory_health = match &memory {
            Ok(_) => StepHealth::Ok,
            Err(Degraded::Fallback { reason, .. }) => {
                notes.push(format!("memory: {}", reason));
                StepHealth::Degraded
            }
            Err(Degraded::Unavailable { reason, fallback_error }) => {
                notes.push(format!("memory: {}; placeholder failed: {}", reason, fallback_error));
                StepHealth::Failed
            }
        };
        if let Some(artifact) = produced_artifact(&memory) {
            ctx.memory_dump = Some(artifact.clone());
            ctx.artifacts.push(artifact.clone());
        }
        if memory_health == StepHealth::Failed {
            ctx.invocations.extend(exec.take_invocations());
            ctx.journal.error("memory capture produced no artifact");
            return PhaseOutcome::hard(name, notes.join("; "), ErrorKind::Io);
        }

        let mut auxiliary_degraded = false;
        if ctx.config.capture.system_info {
            match exec.capture_system_info(&layout.dumps(), &ctx.journal) {
                Ok(artifact) => ctx.artifacts.push(artifact),
                Err(e) => {
                    ctx.journal.warn(&format!("system information not captured: {}", e));
                    notes.push(format!("system info: {}", e));
                    auxiliary_degraded = true;
                }
            }
        }

        let mut disk_error: Option<FlowError> = None;
        let disk_health = match mode {
            CaptureMode::Selective => {
                let capture = exec.capture_disk_selective(&ctx.request.device, &recorder, &ctx.journal);
                ctx.artifacts.extend(capture.artifacts());
                let health = capture.health();
                if health != StepHealth::Ok {
                    notes.push("selective disk capture incomplete".to_string());
                }
                health
            }
            CaptureMode::Complete => match exec.capture_disk_complete(&ctx.request.device, &recorder, &ctx.journal) {
                Ok(done) => {
                    ctx.artifacts.push(done.original);
                    ctx.artifacts.push(done.working_copy);
                    ctx.custody = Some(done.custody);
                    StepHealth::Ok
                }
                Err(e) => {
                    if let FlowError::IntegrityMismatch { .. } = e {
                        ctx.journal.error("INTEGRITY MISMATCH: the working copy does not match the original image");
                    }
                    notes.push(format!("disk: {}", e));
                    disk_error = Some(e);
                    StepHealth::Failed
                }
            },
            CaptureMode::None => {
                ctx.journal.info("disk capture disabled for this case");
                StepHealth::Skipped
            }
        };

        ctx.journal.phase("COMPUTING EVIDENCE DIGESTS");
        if let Err(e) = record_dump_digests(&recorder, &ctx.journal) {
            ctx.journal.warn(&format!("could not record evidence digests: {:#}", e));
            notes.push("evidence digests not recorded".to_string());
            auxiliary_degraded = true;
        }
        ctx.invocations.extend(exec.take_invocations());

        let status = acquisition_status(mode, memory_health, disk_health, auxiliary_degraded);
        let diagnostic = if notes.is_empty() { "evidence acquired".to_string() } else { notes.join("; ") };
        let kind = match status {
            PhaseStatus::HardFailure => Some(disk_error.map(|e| e.kind()).unwrap_or(ErrorKind::Io)),
            _ => None,
        };
        PhaseOutcome::new(name, status, diagnostic, kind)
    }
}
