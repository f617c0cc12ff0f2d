use ff_analysis::{find_memory_dump, TskRunner, VolatilityRunner};
use ff_capture::SIMULATED_DUMP;
use ff_core::{Journal, PhaseName, PhaseOutcome};
use ff_evidence::Recorder;

use super::require_recorder;
use crate::{Phase, RunContext};

/// Phase 3: Volatility modules over the memory dump, TSK over the working disk image.
pub struct AnalyzePhase {
    volatility: Option<VolatilityRunner>,
    tsk: Option<TskRunner>,
}

impl AnalyzePhase {
    pub fn new() -> Self {
        Self { volatility: None, tsk: None }
    }

    pub fn with_runners(volatility: VolatilityRunner, tsk: TskRunner) -> Self {
        Self { volatility: Some(volatility), tsk: Some(tsk) }
    }
}

impl Default for AnalyzePhase {
    fn default() -> Self {
        Self::new()
    }
}

impl Phase for AnalyzePhase {
    fn name(&self) -> PhaseName {
        PhaseName::Analyze
    }

    fn run(&mut self, ctx: &mut RunContext) -> PhaseOutcome {
        let name = self.name();
        let recorder = match require_recorder(ctx, name) {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };
        let layout = recorder.layout().clone();
        let volatility = self.volatility.get_or_insert_with(|| ctx.config.volatility_runner());
        let tsk = self.tsk.get_or_insert_with(|| ctx.config.tsk_runner());

        let captured = ctx.memory_dump.as_ref().map(|a| a.path.clone());
        let dump = find_memory_dump(&layout.dumps(), captured.as_deref());
        if let Some(d) = &dump {
            ctx.journal.info(&format!("analyzing memory dump {}", d.display()));
        }
        let (mut results, records) = volatility.analyze(dump.as_deref(), &layout.volatility_output(), &ctx.journal);
        ctx.invocations.extend(records);
        let placeholder = ctx.memory_dump.as_ref().is_some_and(|a| a.is_simulated())
            || dump.as_deref().and_then(|d| d.file_name()).is_some_and(|n| n == SIMULATED_DUMP);
        if placeholder && !results.simulated {
            ctx.journal.warn("Volatility ran over the simulated placeholder dump; results are flagged as simulated");
            results.simulated = true;
        }

        let (tsk_outputs, records) = tsk.analyze(&layout.disk_images(), &layout.tsk_output(), &ctx.journal);
        ctx.invocations.extend(records);
        results.tsk_outputs = tsk_outputs;

        let mut notes = Vec::new();
        if results.simulated {
            notes.push("memory analysis results are simulated".to_string());
        }
        match recorder.write_json(&layout.analysis_results(), &results.to_json()) {
            Ok(()) => ctx.journal.success("analysis results saved"),
            Err(e) => {
                ctx.journal.warn(&format!("could not save analysis results: {:#}", e));
                notes.push("analysis_results.json not written".to_string());
            }
        }

        if notes.is_empty() {
            PhaseOutcome::success(name, format!("{} Volatility modules analyzed", results.modules.len()))
        } else {
            PhaseOutcome::soft(name, notes.join("; "))
        }
    }
}
