use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Local};
use ff_analysis::ModuleSummary;
use ff_core::{Journal, PhaseStatus};
use ff_evidence::Recorder;

use crate::{DiskEvidence, ReportData};

const MB: f64 = 1024.0 * 1024.0;

fn status_label(status: PhaseStatus) -> &'static str {
    match status {
        PhaseStatus::Success => "success",
        PhaseStatus::SoftFailure => "completed with warnings",
        PhaseStatus::HardFailure => "failed",
    }
}

/// Markdown rendering of the consolidated case.
pub fn render_markdown(data: &ReportData, generated_at: DateTime<Local>) -> String {
    let mut md = String::new();
    let when = generated_at.format("%d/%m/%Y %H:%M:%S");

    let _ = writeln!(md, "# Digital Forensic Analysis Report\n");
    let _ = writeln!(md, "ForensicFlow {}  \nDate: {}\n", env!("CARGO_PKG_VERSION"), when);

    let _ = writeln!(md, "## 1. Executive summary\n");
    let _ = writeln!(
        md,
        "This report presents the results of the automated forensic analysis performed with ForensicFlow: \
         volatile memory acquisition, process and network connection analysis, and system artifacts.\n"
    );
    if data.analysis.as_ref().map(|a| a.simulated).unwrap_or(false) {
        let _ = writeln!(md, "> **Note:** memory analysis results are SIMULATED and must not be used as findings.\n");
    }
    if !data.outcomes.is_empty() {
        let _ = writeln!(md, "| Phase | Status | Detail |\n|---|---|---|");
        for o in &data.outcomes {
            let _ = writeln!(md, "| {}. {} | {} | {} |", o.index + 1, o.phase.title(), status_label(o.status), o.diagnostic);
        }
        md.push('\n');
    }

    let _ = writeln!(md, "## 2. Case information\n");
    let _ = writeln!(md, "| | |\n|---|---|");
    let _ = writeln!(md, "| Analyst | ForensicFlow Automated System |");
    let _ = writeln!(md, "| Analysis date | {} |", when);
    let _ = writeln!(md, "| Evidence location | `{}` |", data.case_dir.display());
    let _ = writeln!(md, "| Tools | WinPmem, dd, Volatility 3, The Sleuth Kit |\n");

    let _ = writeln!(md, "## 3. Collected evidence\n");
    for f in &data.evidence_files {
        let _ = writeln!(md, "- {} ({:.2} MB)", f.name, f.size_bytes as f64 / MB);
    }
    md.push('\n');

    if let Some(hashes) = &data.hashes {
        let _ = writeln!(md, "## 4. Chain of custody - hashes\n\n```\n{}\n```\n", hashes.trim_end());
    }

    let _ = writeln!(md, "## 5. Analysis findings\n");
    let _ = writeln!(md, "### 5.1 Volatile memory capture\n");
    let real_dump = data.evidence_files.iter().find(|f| f.name == "memory_dump.raw");
    match real_dump {
        Some(f) => {
            let _ = writeln!(md, "Memory dump `{}` ({:.2} GB).\n", f.name, f.size_bytes as f64 / (MB * 1024.0));
        }
        None => {
            let _ = writeln!(md, "A simulated memory dump was used for demonstration.\n");
        }
    }

    let _ = writeln!(md, "### 5.2 System information\n");
    match &data.system_info {
        Some(info) => {
            let _ = writeln!(md, "```\n{}\n```\n", info.trim_end());
        }
        None => {
            let _ = writeln!(md, "No additional system information was captured.\n");
        }
    }

    let _ = writeln!(md, "### 5.3 Disk capture and chain of custody\n");
    match &data.disk {
        DiskEvidence::Complete { custody } => {
            let _ = writeln!(md, "**Capture mode:** complete forensic image\n");
            if let Some(c) = custody {
                let _ = writeln!(md, "```\n{}\n```\n", c.trim_end());
            }
        }
        DiskEvidence::Selective { images, digests } => {
            let _ = writeln!(md, "**Capture mode:** selective capture of critical areas\n");
            for f in images {
                let _ = writeln!(md, "- {} ({} bytes)", f.name, f.size_bytes);
            }
            md.push('\n');
            if let Some(d) = digests {
                let _ = writeln!(md, "```\n{}\n```\n", d.trim_end());
            }
        }
        DiskEvidence::InfoOnly => {
            let _ = writeln!(md, "No block-copy tool was available; disk and partition listings only.\n");
        }
        DiskEvidence::None => {
            let _ = writeln!(md, "No disk capture was performed in this analysis.\n");
        }
    }

    let _ = writeln!(md, "### 5.4 Memory analysis (Volatility)\n");
    match &data.analysis {
        Some(a) if !a.modules.is_empty() => {
            for (module, summary) in &a.modules {
                let _ = writeln!(md, "**{}**: {}\n", module, summary.headline());
                match summary {
                    ModuleSummary::Processes { processes, .. } => {
                        for p in processes.iter().take(10) {
                            let _ = writeln!(md, "- {} (PID {})", p.name, p.pid);
                        }
                    }
                    ModuleSummary::Connections { connections, .. } => {
                        for c in connections.iter().take(10) {
                            let _ = writeln!(md, "- `{}`", c);
                        }
                    }
                    ModuleSummary::CommandLines { cmdlines } => {
                        for c in cmdlines.iter().take(5) {
                            let _ = writeln!(md, "- `{}`", c);
                        }
                    }
                    ModuleSummary::Preview { .. } => {}
                }
                md.push('\n');
            }
        }
        _ => {
            let _ = writeln!(md, "No memory analysis results.\n");
        }
    }

    let _ = writeln!(md, "### 5.5 Disk analysis (The Sleuth Kit)\n");
    if data.tsk_outputs.is_empty() {
        let _ = writeln!(md, "TSK was not run: no disk images (.dd, .img, .E01) were found.\n");
    } else {
        for name in &data.tsk_outputs {
            let _ = writeln!(md, "- `{}`", name);
        }
        md.push('\n');
    }

    let _ = writeln!(md, "## 6. Recommendations\n");
    let _ = writeln!(
        md,
        "1. Perform an in-depth review with Autopsy to examine additional files and artifacts\n\
         2. Manually review the suspicious network connections identified\n\
         3. Analyze the detected suspicious processes in detail\n\
         4. Verify the integrity of system files\n\
         5. Document every additional finding made during manual analysis\n"
    );

    let _ = writeln!(md, "## 7. Follow-up analysis with Autopsy\n");
    let _ = writeln!(
        md,
        "The collected evidence is ready for detailed manual analysis with Autopsy: timeline analysis, \
         deleted file recovery, registry analysis, keyword search and web artifacts."
    );
    md
}

pub fn autopsy_readme(data: &ReportData) -> String {
    let mut s = String::from("INSTRUCTIONS FOR ANALYSIS WITH AUTOPSY\n");
    s.push_str(&"=".repeat(60));
    s.push_str("\n\n");
    s.push_str("1. Open Autopsy\n");
    s.push_str("2. Create a new case\n");
    s.push_str("3. Add the files in the 'dumps' folder as data sources\n");
    s.push_str("4. In particular add:\n");
    s.push_str("   - .raw files (memory dump)\n");
    s.push_str("   - .dd or .img files (disk images, if any; use the working copy)\n");
    s.push_str("5. Run the Autopsy ingest modules\n");
    s.push_str("6. Review the results in the Autopsy interface\n\n");
    s.push_str("Evidence location:\n");
    s.push_str(&format!("{}\n\n", data.case_dir.display()));
    s.push_str("NOTE: this is a manual analysis and requires expert interpretation.\n");
    s
}

/// Write `Reporte/Forensic_Report_<ts>.md` and the Autopsy instructions (the latter is best-effort).
pub fn write_report(recorder: &dyn Recorder, data: &ReportData, journal: &dyn Journal) -> Result<PathBuf> {
    let now = Local::now();
    let path = recorder
        .layout()
        .reports()
        .join(format!("Forensic_Report_{}.md", now.format("%Y%m%d_%H%M%S")));
    recorder.write_text(&path, &render_markdown(data, now))?;
    journal.success(&format!("report written: {}", path.display()));

    match recorder.write_text(&recorder.layout().autopsy_readme(), &autopsy_readme(data)) {
        Ok(()) => {
            journal.success("Autopsy instructions created");
            journal.info("remember: Autopsy requires expert manual analysis");
        }
        Err(e) => journal.warn(&format!("could not prepare Autopsy instructions: {:#}", e)),
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ff_analysis::{AnalysisResults, ProcessEntry};
    use ff_core::{CaseId, MemoryJournal, PhaseName, PhaseOutcome};
    use ff_evidence::{EvidenceLayout, FsRecorder};
    use tempfile::tempdir;

    fn data(case_dir: PathBuf) -> ReportData {
        ReportData {
            case_dir,
            analysis: None,
            hashes: None,
            system_info: None,
            evidence_files: vec![],
            disk: DiskEvidence::None,
            tsk_outputs: vec![],
            outcomes: vec![],
        }
    }

    #[test]
    fn missing_sections_are_omitted_or_explained() {
        let md = render_markdown(&data(PathBuf::from("/cases/x")), Local::now());
        assert!(!md.contains("## 4. Chain of custody"));
        assert!(md.contains("No disk capture was performed"));
        assert!(md.contains("No memory analysis results"));
    }

    #[test]
    fn simulated_results_are_called_out() {
        let mut d = data(PathBuf::from("/cases/x"));
        let mut a = AnalysisResults { simulated: true, ..Default::default() };
        a.modules.insert(
            "pslist".into(),
            ModuleSummary::Processes { processes: vec![ProcessEntry { name: "System".into(), pid: "4".into() }], total_count: 1 },
        );
        d.analysis = Some(a);
        d.outcomes = vec![PhaseOutcome::soft(PhaseName::Acquire, "simulated memory dump")];
        let md = render_markdown(&d, Local::now());
        assert!(md.contains("SIMULATED"));
        assert!(md.contains("- System (PID 4)"));
        assert!(md.contains("| 2. Evidence acquisition | completed with warnings |"));
    }

    #[test]
    fn report_and_readme_are_written() {
        let dir = tempdir().unwrap();
        let rec = FsRecorder::new(EvidenceLayout::create(dir.path(), &CaseId::from_str("Analysis_t")).unwrap());
        let d = ReportData::consolidate(rec.layout(), &[]);
        let path = write_report(&rec, &d, &MemoryJournal::new()).unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("Forensic_Report_"));
        assert!(rec.layout().autopsy_readme().is_file());
    }
}
