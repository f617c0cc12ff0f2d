use std::path::{Path, PathBuf};
use std::time::Duration;

use ff_core::Journal;
use ff_tools::{run_bounded, InvocationRecord, InvocationStatus, ResolvedTool};

use crate::{parse_module_output, AnalysisResults};

pub const MODULE_TIMEOUT: Duration = Duration::from_secs(300);

pub fn default_modules() -> Vec<String> {
    ["pslist", "netscan", "dlllist", "cmdline", "filescan"].iter().map(|m| m.to_string()).collect()
}

const SIMULATED_PSLIST: &str = "\
Volatility 3 Framework (simulated output)
PID     Process             PPID    Threads Handles
4       System              0       123     1234
456     explorer.exe        4       45      678
789     chrome.exe          456     23      456
1024    malware.exe         456     5       89
";

const SIMULATED_NETSCAN: &str = "\
Volatility 3 Framework (simulated output)
Proto   Local Address           Foreign Address         State           PID
TCP     192.168.1.100:49152     93.184.216.34:443       ESTABLISHED     789
TCP     192.168.1.100:49153     172.217.14.206:80       ESTABLISHED     789
TCP     0.0.0.0:4444            0.0.0.0:0               LISTENING       1024
";

const SIMULATED_CMDLINE: &str = "\
Volatility 3 Framework (simulated output)
PID     Process         Args
C:\\Windows\\System32\\svchost.exe -k NetworkService
C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe
";

pub struct VolatilityRunner {
    pub tool: Option<ResolvedTool>,
    pub modules: Vec<String>,
    pub timeout: Duration,
}

impl VolatilityRunner {
    pub fn new(tool: Option<ResolvedTool>) -> Self {
        Self { tool, modules: default_modules(), timeout: MODULE_TIMEOUT }
    }

    /// Run every module against `dump`, writing `<out_dir>/<module>.txt`. Without a dump or
    /// without Volatility the results are simulated and flagged as such.
    pub fn analyze(
        &self,
        dump: Option<&Path>,
        out_dir: &Path,
        journal: &dyn Journal,
    ) -> (AnalysisResults, Vec<InvocationRecord>) {
        let Some(dump) = dump else {
            journal.warn("no memory dump to analyze");
            return (simulate(out_dir, journal), Vec::new());
        };
        let Some(tool) = &self.tool else {
            journal.warn("Volatility not found, generating simulated results");
            return (simulate(out_dir, journal), Vec::new());
        };

        let mut results = AnalysisResults::default();
        let mut records = Vec::new();
        for module in &self.modules {
            journal.info(&format!("running Volatility module: {}", module));
            let args = vec!["-f".to_string(), dump.display().to_string(), module.clone()];
            let rec = run_bounded(&tool.invocation(args, self.timeout));
            tracing::debug!(module = module.as_str(), status = ?rec.status, duration_ms = rec.duration_ms, "volatility module finished");
            match rec.status {
                InvocationStatus::TimedOut => journal.warn(&format!("module {} timed out", module)),
                InvocationStatus::NotFound | InvocationStatus::SpawnFailed => {
                    journal.warn(&format!("module {}: {}", module, rec.summary()))
                }
                InvocationStatus::Succeeded | InvocationStatus::Failed => {
                    let path = out_dir.join(format!("{}.txt", module));
                    match std::fs::write(&path, module_file_text(&rec.stdout, &rec.stderr)) {
                        Ok(()) => {
                            journal.success(&format!("module {} done", module));
                            results.modules.insert(module.clone(), parse_module_output(module, &rec.stdout));
                        }
                        Err(e) => journal.warn(&format!("module {}: write {}: {}", module, path.display(), e)),
                    }
                }
            }
            records.push(rec);
        }
        (results, records)
    }
}

pub fn module_file_text(stdout: &str, stderr: &str) -> String {
    if stderr.is_empty() {
        stdout.to_string()
    } else {
        format!("{}\n\nERRORS:\n{}", stdout, stderr)
    }
}

fn simulate(out_dir: &Path, journal: &dyn Journal) -> AnalysisResults {
    journal.info("generating simulated Volatility results (demonstration only)");
    let mut results = AnalysisResults { simulated: true, ..Default::default() };
    for (module, text) in [("pslist", SIMULATED_PSLIST), ("netscan", SIMULATED_NETSCAN), ("cmdline", SIMULATED_CMDLINE)] {
        let path: PathBuf = out_dir.join(format!("{}.txt", module));
        if let Err(e) = std::fs::write(&path, text) {
            journal.warn(&format!("could not write {}: {}", path.display(), e));
        }
        results.modules.insert(module.to_string(), parse_module_output(module, text));
    }
    journal.success("simulated results generated");
    results
}

/// The dump to analyze: the captured artifact when known, else the first `.raw`/`.dump` file by name.
pub fn find_memory_dump(dumps: &Path, captured: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = captured.filter(|p| p.is_file()) {
        return Some(p.to_path_buf());
    }
    let mut found: Vec<PathBuf> = std::fs::read_dir(dumps)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("raw") | Some("dump")))
        .collect();
    found.sort();
    found.into_iter().next()
}
