use std::path::Path;

use anyhow::Context;
use ff_core::{ArtifactKind, CaptureArtifact, DigestEntry, FlowError, Journal};
use ff_digest::digest_or_error;
use ff_evidence::Recorder;
use ff_tools::Invocation;

use crate::{CaptureExecutor, NATIVE_COMMAND_TIMEOUT};

pub const SYSTEM_INFO: &str = "system_info.txt";

fn inventory_commands() -> &'static [(&'static str, &'static str)] {
    if cfg!(windows) {
        &[
            ("systeminfo", "General system information"),
            ("wmic process list brief", "Running processes"),
            ("netstat -ano", "Active network connections"),
            ("tasklist /v", "System tasks"),
            ("ipconfig /all", "Network configuration"),
        ]
    } else {
        &[
            ("uname -a", "General system information"),
            ("ps aux", "Running processes"),
            ("ss -tunap", "Active network connections"),
            ("who -a", "Logged-in users"),
            ("ip addr show", "Network configuration"),
        ]
    }
}

impl CaptureExecutor {
    /// Native inventory commands into `<dumps>/system_info.txt`, one stanza each.
    /// A failing command is noted in its stanza and does not stop the others.
    pub fn capture_system_info(&self, dumps: &Path, journal: &dyn Journal) -> Result<CaptureArtifact, FlowError> {
        journal.phase("COLLECTING SYSTEM INFORMATION");
        let rule = "=".repeat(60);
        let mut text = String::new();
        for (cmd, description) in inventory_commands() {
            journal.info(&format!("running: {}", description));
            text.push_str(&format!("\n{}\nCommand: {}\nDescription: {}\n{}\n\n", rule, cmd, description, rule));
            let rec = self.run(&Invocation::shell("system-info", cmd, NATIVE_COMMAND_TIMEOUT));
            text.push_str(&rec.stdout);
            if rec.succeeded() {
                journal.success(&format!("{} done ({} lines)", description, rec.stdout_lines));
            } else {
                text.push_str(&format!("Error running {}: {}\n", cmd, rec.summary()));
                journal.warn(&format!("{} failed: {}", description, rec.summary()));
            }
        }
        let path = dumps.join(SYSTEM_INFO);
        std::fs::write(&path, text).map_err(|e| FlowError::io(format!("write {}", path.display()), e))?;
        journal.success(&format!("system information saved to {}", SYSTEM_INFO));
        CaptureArtifact::from_file(&path, ArtifactKind::SystemInfo).map_err(|e| FlowError::io("stat system info", e))
    }
}

/// Digest every file in the dumps folder into `hashes.txt`, sorted by name.
pub fn record_dump_digests(recorder: &dyn Recorder, journal: &dyn Journal) -> anyhow::Result<Vec<DigestEntry>> {
    let dumps = recorder.layout().dumps();
    let mut files: Vec<_> = std::fs::read_dir(&dumps)
        .with_context(|| format!("list {}", dumps.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    let entries: Vec<DigestEntry> = files
        .iter()
        .map(|p| {
            let name = p.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            journal.info(&format!("digesting {}", name));
            DigestEntry { name, digests: digest_or_error(p) }
        })
        .collect();
    recorder.write_digest_table(&recorder.layout().hashes_file(), "EVIDENCE INTEGRITY HASHES", &entries)?;
    journal.success("evidence digests written");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ff_core::{CaseId, MemoryJournal};
    use ff_evidence::{EvidenceLayout, FsRecorder};
    use tempfile::tempdir;

    #[cfg(unix)]
    #[test]
    fn inventory_has_one_stanza_per_command() {
        let dir = tempdir().unwrap();
        let exec = CaptureExecutor::new(None, None);
        let artifact = exec.capture_system_info(dir.path(), &MemoryJournal::new()).unwrap();
        let text = std::fs::read_to_string(&artifact.path).unwrap();
        assert_eq!(text.matches("Command: ").count(), inventory_commands().len());
        assert_eq!(exec.take_invocations().len(), inventory_commands().len());
    }

    #[test]
    fn dump_digests_cover_every_file() {
        let dir = tempdir().unwrap();
        let rec = FsRecorder::new(EvidenceLayout::create(dir.path(), &CaseId::from_str("Analysis_t")).unwrap());
        std::fs::write(rec.layout().dumps().join("b.raw"), b"abc").unwrap();
        std::fs::write(rec.layout().dumps().join("a.txt"), b"").unwrap();
        let entries = record_dump_digests(&rec, &MemoryJournal::new()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.raw"]);
        let table = std::fs::read_to_string(rec.layout().hashes_file()).unwrap();
        assert!(table.contains("900150983cd24fb0d6963f7d28e17f72"));
    }
}
