use ff_core::{ErrorKind, Journal, PhaseName, PhaseOutcome};
use ff_evidence::Recorder;
use ff_report::{write_report, ReportData};

use super::require_recorder;
use crate::{Phase, RunContext};

/// Phase 4: consolidate the evidence tree into the Markdown report.
pub struct ReportPhase;

impl Phase for ReportPhase {
    fn name(&self) -> PhaseName {
        PhaseName::Report
    }

    fn run(&mut self, ctx: &mut RunContext) -> PhaseOutcome {
        let name = self.name();
        let recorder = match require_recorder(ctx, name) {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };
        ctx.journal.info("consolidating collected evidence");
        let data = ReportData::consolidate(recorder.layout(), &ctx.outcomes);
        match write_report(&recorder, &data, &ctx.journal) {
            Ok(path) => PhaseOutcome::success(name, format!("report: {}", path.display())),
            Err(e) => {
                let msg = format!("could not write report: {:#}", e);
                ctx.journal.error(&msg);
                PhaseOutcome::hard(name, msg, ErrorKind::Io)
            }
        }
    }
}
