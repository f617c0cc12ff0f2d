use std::path::Path;

use ff_core::{ArtifactKind, CaptureArtifact, DegradeReason, Degraded, Journal};
use ff_tools::InvocationStatus;

use crate::CaptureExecutor;

pub const MEMORY_DUMP: &str = "memory_dump.raw";
pub const SIMULATED_DUMP: &str = "memory_dump_simulated.raw";
const PLACEHOLDER_LINE: &[u8] = b"SIMULATED MEMORY DUMP FOR TESTING\n";
const PLACEHOLDER_REPEAT: usize = 1000;

pub fn placeholder_bytes() -> Vec<u8> {
    PLACEHOLDER_LINE.repeat(PLACEHOLDER_REPEAT)
}

impl CaptureExecutor {
    /// Image physical memory into `<dumps>/memory_dump.raw`.
    ///
    /// Missing imager, timeout or no output file all fall back to the simulated placeholder.
    pub fn capture_memory(&self, dumps: &Path, journal: &dyn Journal) -> Result<CaptureArtifact, Degraded> {
        let Some(imager) = &self.imager else {
            journal.warn("memory imager not found, writing simulated dump for testing");
            return Err(write_placeholder(dumps, DegradeReason::ToolMissing { tool: "winpmem".into() }, journal));
        };

        let output = dumps.join(MEMORY_DUMP);
        let out_str = output.display().to_string();
        let args = self.imager_args.iter().map(|a| a.replace("{output}", &out_str)).collect();
        journal.info(&format!("imaging memory with {} into {}", imager.path.display(), MEMORY_DUMP));
        journal.info("this can take several minutes depending on installed RAM");

        let rec = self.run(&imager.invocation(args, self.memory_timeout));
        let tool = imager.id.key().to_string();
        let reason = match rec.status {
            InvocationStatus::TimedOut => DegradeReason::Timeout { tool, secs: self.memory_timeout.as_secs() },
            InvocationStatus::NotFound => DegradeReason::ToolMissing { tool },
            InvocationStatus::SpawnFailed => {
                DegradeReason::ToolFailed { tool, detail: rec.error.clone().unwrap_or_default() }
            }
            InvocationStatus::Succeeded | InvocationStatus::Failed => {
                if output.is_file() {
                    if !rec.succeeded() {
                        journal.warn(&format!("{}, keeping the dump it wrote", rec.summary()));
                    }
                    match CaptureArtifact::from_file(&output, ArtifactKind::MemoryDump) {
                        Ok(artifact) => {
                            journal.success(&format!(
                                "memory dump complete: {} ({:.2} GB)",
                                artifact.name,
                                artifact.size_bytes as f64 / (1u64 << 30) as f64
                            ));
                            return Ok(artifact);
                        }
                        Err(e) => DegradeReason::Io(e.to_string()),
                    }
                } else {
                    DegradeReason::NoOutput { tool }
                }
            }
        };
        journal.warn(&format!("{}, writing simulated dump", reason));
        Err(write_placeholder(dumps, reason, journal))
    }
}

fn write_placeholder(dumps: &Path, reason: DegradeReason, journal: &dyn Journal) -> Degraded {
    let path = dumps.join(SIMULATED_DUMP);
    let written = std::fs::write(&path, placeholder_bytes())
        .and_then(|_| CaptureArtifact::from_file(&path, ArtifactKind::SimulatedPlaceholder));
    match written {
        Ok(artifact) => {
            journal.info(&format!("simulated dump written ({} bytes, demonstration only)", artifact.size_bytes));
            Degraded::Fallback { artifact, reason }
        }
        Err(e) => {
            journal.error(&format!("could not write simulated dump: {}", e));
            Degraded::Unavailable { reason, fallback_error: e.to_string() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ff_core::{LogLevel, MemoryJournal};
    use tempfile::tempdir;

    #[test]
    fn absent_imager_writes_placeholder() {
        let dir = tempdir().unwrap();
        let journal = MemoryJournal::new();
        let exec = CaptureExecutor::new(None, None);
        let err = exec.capture_memory(dir.path(), &journal).unwrap_err();
        let artifact = err.artifact().unwrap();
        assert_eq!(artifact.name, SIMULATED_DUMP);
        assert_eq!(artifact.size_bytes, 34_000);
        assert!(artifact.is_simulated());
        assert!(matches!(err.reason(), DegradeReason::ToolMissing { .. }));
        assert!(journal.contains(LogLevel::Warning, "not found"));
    }

    #[test]
    fn unwritable_dumps_dir_is_unavailable() {
        let dir = tempdir().unwrap();
        let exec = CaptureExecutor::new(None, None);
        let err = exec.capture_memory(&dir.path().join("missing"), &MemoryJournal::new()).unwrap_err();
        assert!(matches!(err, Degraded::Unavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn real_imager_output_is_kept() {
        use ff_tools::{ResolvedTool, ToolId};
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let script = dir.path().join("fake-imager.sh");
        std::fs::write(&script, "#!/bin/sh\nprintf 'RAM' > \"$1\"\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let exec = CaptureExecutor::new(Some(ResolvedTool::new(ToolId::MemoryImager, &script)), None);
        let artifact = exec.capture_memory(dir.path(), &MemoryJournal::new()).unwrap();
        assert_eq!(artifact.name, MEMORY_DUMP);
        assert_eq!(artifact.size_bytes, 3);
        assert_eq!(exec.take_invocations().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn imager_timeout_falls_back_to_placeholder() {
        use ff_tools::{InvocationStatus, ResolvedTool, ToolId};
        use std::time::{Duration, Instant};

        let dir = tempdir().unwrap();
        let mut exec = CaptureExecutor::new(Some(ResolvedTool::new(ToolId::MemoryImager, "sleep")), None);
        exec.imager_args = vec!["5".into()];
        exec.memory_timeout = Duration::from_millis(200);
        let journal = MemoryJournal::new();
        let started = Instant::now();
        let err = exec.capture_memory(dir.path(), &journal).unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(matches!(err.reason(), DegradeReason::Timeout { .. }));
        assert!(err.artifact().unwrap().is_simulated());
        assert!(!dir.path().join(MEMORY_DUMP).exists());
        assert_eq!(exec.take_invocations()[0].status, InvocationStatus::TimedOut);
    }

    #[cfg(unix)]
    #[test]
    fn imager_without_output_falls_back() {
        use ff_tools::{ResolvedTool, ToolId};

        let dir = tempdir().unwrap();
        let exec = CaptureExecutor::new(Some(ResolvedTool::new(ToolId::MemoryImager, "true")), None);
        let err = exec.capture_memory(dir.path(), &MemoryJournal::new()).unwrap_err();
        assert!(matches!(err.reason(), DegradeReason::NoOutput { .. }));
        assert!(dir.path().join(SIMULATED_DUMP).is_file());
    }
}
