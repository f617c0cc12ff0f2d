use ff_core::{ErrorKind, Journal, PhaseName, PhaseOutcome};
use ff_evidence::{EvidenceLayout, FsRecorder};
use ff_tools::ToolManager;

use crate::{evaluate, Environment, Phase, RunContext};

/// Phase 1: host checks, evidence tree, tool inventory.
pub struct VerifyEnvironmentPhase {
    environment: Option<Environment>,
}

impl VerifyEnvironmentPhase {
    pub fn new() -> Self {
        Self { environment: None }
    }

    /// Use `env` instead of probing the host.
    pub fn with_environment(env: Environment) -> Self {
        Self { environment: Some(env) }
    }
}

impl Default for VerifyEnvironmentPhase {
    fn default() -> Self {
        Self::new()
    }
}

impl Phase for VerifyEnvironmentPhase {
    fn name(&self) -> PhaseName {
        PhaseName::VerifyEnvironment
    }

    fn run(&mut self, ctx: &mut RunContext) -> PhaseOutcome {
        let name = self.name();
        let env = self.environment.clone().unwrap_or_else(Environment::detect);
        ctx.journal.info(&format!("operating system: {}", env.os));

        let warnings = match evaluate(&env, &ctx.config.environment.supported_os, ctx.request.elevation) {
            Ok(w) => w,
            Err(e) => {
                ctx.journal.error(&e.to_string());
                return PhaseOutcome::hard(name, e.to_string(), e.kind());
            }
        };
        if env.elevated {
            ctx.journal.success("running with administrator privileges");
        }
        for w in &warnings {
            ctx.journal.warn(w);
        }

        let layout = match EvidenceLayout::create(&ctx.config.evidence_root(), &ctx.case.id) {
            Ok(l) => l,
            Err(e) => {
                let msg = format!("could not create evidence directory: {:#}", e);
                ctx.journal.error(&msg);
                return PhaseOutcome::hard(name, msg, ErrorKind::Io);
            }
        };
        ctx.case.root = layout.root().to_path_buf();
        let recorder = FsRecorder::new(layout);
        ctx.journal.attach(recorder.clone());
        ctx.recorder = Some(recorder);
        ctx.journal.success(&format!("evidence directory: {}", ctx.case.root.display()));

        let locator = ctx.config.locator();
        let statuses = ToolManager::new(&locator, &ctx.journal).ensure_all(ctx.config.tools.auto_install);
        let missing: Vec<&str> = statuses.iter().filter(|s| !s.available()).map(|s| s.display_name).collect();
        for s in statuses.iter().filter(|s| s.available()) {
            ctx.journal.success(&format!("{} available", s.display_name));
        }

        let mut notes = warnings;
        if !missing.is_empty() {
            notes.push(format!("missing tools: {}", missing.join(", ")));
        }
        if notes.is_empty() {
            PhaseOutcome::success(name, "environment verified")
        } else {
            PhaseOutcome::soft(name, notes.join("; "))
        }
    }
}
