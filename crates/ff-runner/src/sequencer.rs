use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{anyhow, Context, Result};
use chrono::Local;

use ff_core::{
    gate, state_for_phase, CaptureArtifact, CaptureMode, CaseId, CaseState, CustodyRecord, EvidenceCase, Gate, Journal,
    PhaseName, PhaseOutcome, PhaseStatus,
};
use ff_evidence::{CaseManifest, FsRecorder, Recorder};
use ff_tools::InvocationRecord;

use crate::{standard_phases, ChannelJournal, Config, ElevationPolicy, PhaseState, PipelineEvent, RunOutcome};

pub const EVENT_CAPACITY: usize = 1024;

/// Cooperative stop flag, checked by the worker before each phase.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-run choices, fixed before the worker starts.
#[derive(Clone, Debug)]
pub struct RunRequest {
    pub mode: CaptureMode,
    pub device: String,
    pub elevation: ElevationPolicy,
}

impl RunRequest {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self { mode: cfg.mode()?, device: cfg.capture.device.clone(), elevation: cfg.elevation_policy()? })
    }
}

/// State shared by the phases of one run. Owned by the worker thread.
pub struct RunContext {
    pub config: Config,
    pub request: RunRequest,
    pub case: EvidenceCase,
    pub started_at: String,
    pub journal: ChannelJournal,
    pub cancel: CancelToken,
    /// Set once the evidence directory exists.
    pub recorder: Option<FsRecorder>,
    pub memory_dump: Option<CaptureArtifact>,
    pub artifacts: Vec<CaptureArtifact>,
    pub custody: Option<CustodyRecord>,
    pub outcomes: Vec<PhaseOutcome>,
    pub invocations: Vec<InvocationRecord>,
}

impl RunContext {
    pub fn transition(&mut self, next: CaseState) {
        if self.case.state.can_transition_to(next) {
            self.case.state = next;
        } else {
            tracing::warn!("ignoring case transition {:?} -> {:?}", self.case.state, next);
        }
    }

    pub fn recorder(&self) -> Option<FsRecorder> {
        self.recorder.clone()
    }
}

pub trait Phase: Send {
    fn name(&self) -> PhaseName;
    fn run(&mut self, ctx: &mut RunContext) -> PhaseOutcome;
}

pub struct Pipeline {
    config: Config,
    request: RunRequest,
    phases: Vec<Box<dyn Phase>>,
    cancel: CancelToken,
}

impl Pipeline {
    pub fn new(config: Config, request: RunRequest) -> Self {
        Self::with_phases(config, request, standard_phases())
    }

    pub fn with_phases(config: Config, request: RunRequest, phases: Vec<Box<dyn Phase>>) -> Self {
        Self { config, request, phases, cancel: CancelToken::new() }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Start the run on its own worker thread.
    pub fn spawn(self) -> Result<PipelineHandle> {
        let (tx, rx) = sync_channel(EVENT_CAPACITY);
        let cancel = self.cancel.clone();
        let case = EvidenceCase::new(CaseId::now(), self.config.evidence_root(), self.request.mode);
        let ctx = RunContext {
            config: self.config,
            request: self.request,
            case,
            started_at: Local::now().to_rfc3339(),
            journal: ChannelJournal::new(tx),
            cancel: self.cancel,
            recorder: None,
            memory_dump: None,
            artifacts: Vec::new(),
            custody: None,
            outcomes: Vec::new(),
            invocations: Vec::new(),
        };
        let phases = self.phases;
        let worker = std::thread::Builder::new()
            .name("forensicflow-pipeline".into())
            .spawn(move || drive(phases, ctx))
            .context("spawn pipeline worker")?;
        Ok(PipelineHandle { events: rx, cancel, worker })
    }
}

pub struct PipelineHandle {
    pub events: Receiver<PipelineEvent>,
    pub cancel: CancelToken,
    worker: JoinHandle<RunReport>,
}

impl PipelineHandle {
    pub fn join(self) -> Result<RunReport> {
        let PipelineHandle { events, worker, .. } = self;
        // Keep draining so a full channel cannot block the worker while we wait.
        let drain = std::thread::spawn(move || events.iter().count());
        let report = worker.join().map_err(|_| anyhow!("pipeline worker panicked"))?;
        let _ = drain.join();
        Ok(report)
    }
}

#[derive(Clone, Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub case: EvidenceCase,
    pub outcomes: Vec<PhaseOutcome>,
}

fn drive(mut phases: Vec<Box<dyn Phase>>, mut ctx: RunContext) -> RunReport {
    let mut outcome = RunOutcome::Completed;
    let mut not_started = phases.len();

    for (i, phase) in phases.iter_mut().enumerate() {
        let name = phase.name();
        if ctx.cancel.is_cancelled() {
            ctx.journal.warn("analysis stopped by user");
            ctx.transition(CaseState::Stopped);
            outcome = RunOutcome::Stopped { before: name };
            not_started = i;
            break;
        }

        ctx.transition(state_for_phase(name));
        ctx.journal.emit(PipelineEvent::Phase { phase: name, state: PhaseState::Running });
        ctx.journal.phase(&format!("PHASE {}: {}", name.index() + 1, name.title().to_uppercase()));

        let result = phase.run(&mut ctx);
        ctx.journal.emit(PipelineEvent::Phase { phase: name, state: PhaseState::Done(result.status) });
        match result.status {
            PhaseStatus::Success => ctx.journal.success(&format!("phase {} completed", name.index() + 1)),
            PhaseStatus::SoftFailure => ctx.journal.warn(&format!(
                "phase {} completed with warnings: {}",
                name.index() + 1,
                result.diagnostic
            )),
            PhaseStatus::HardFailure => ctx.journal.error(&format!("phase {} failed: {}", name.index() + 1, result.diagnostic)),
        }

        let verdict = gate(&result);
        ctx.outcomes.push(result.clone());
        if verdict == Gate::Abort {
            ctx.transition(CaseState::Failed);
            outcome = RunOutcome::Failed { phase: name, kind: result.error_kind, diagnostic: result.diagnostic };
            not_started = i + 1;
            break;
        }
    }

    for phase in &phases[not_started.min(phases.len())..] {
        ctx.journal.emit(PipelineEvent::Phase { phase: phase.name(), state: PhaseState::Skipped });
    }
    if outcome == RunOutcome::Completed {
        ctx.transition(CaseState::Complete);
        ctx.journal.success("ANALYSIS COMPLETED");
    }

    persist(&ctx);
    ctx.journal.emit(PipelineEvent::Finished(outcome.clone()));
    RunReport { outcome, case: ctx.case, outcomes: ctx.outcomes }
}

/// Write `case.json` and `tool_invocations.json` for whatever the run got to.
fn persist(ctx: &RunContext) {
    let Some(recorder) = &ctx.recorder else {
        tracing::warn!("evidence directory was never created; nothing persisted");
        return;
    };
    let mut manifest = CaseManifest::new(ctx.case.clone(), ctx.started_at.clone());
    manifest.finished_at = Some(Local::now().to_rfc3339());
    if ctx.request.mode != CaptureMode::None {
        manifest.device = Some(ctx.request.device.clone());
    }
    manifest.outcomes = ctx.outcomes.clone();
    manifest.artifacts = ctx.artifacts.clone();
    manifest.custody = ctx.custody.clone();
    match recorder.write_manifest(&manifest) {
        Ok(()) => ctx.journal.info(&format!("case manifest: {}", recorder.layout().case_manifest().display())),
        Err(e) => ctx.journal.warn(&format!("could not write case manifest: {:#}", e)),
    }

    let written = serde_json::to_value(&ctx.invocations)
        .context("serialize invocations")
        .and_then(|v| recorder.write_json(&recorder.layout().invocations_file(), &v));
    if let Err(e) = written {
        ctx.journal.warn(&format!("could not write tool invocation log: {:#}", e));
    }
}
