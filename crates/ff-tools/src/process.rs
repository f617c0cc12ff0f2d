use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use ff_core::InvocationId;
use serde::{Deserialize, Serialize};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const READER_GRACE: Duration = Duration::from_secs(5);
#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

/// One external tool call with a hard time bound.
#[derive(Clone, Debug)]
pub struct Invocation {
    /// Catalog key or free-form label used in logs and records.
    pub tool: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub timeout: Duration,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(tool: impl Into<String>, program: impl Into<PathBuf>, args: Vec<String>, timeout: Duration) -> Self {
        Self { tool: tool.into(), program: program.into(), args, timeout, cwd: None }
    }

    /// Run a command line through the platform shell (`cmd /C` or `sh -c`).
    pub fn shell(tool: impl Into<String>, command_line: &str, timeout: Duration) -> Self {
        if cfg!(windows) {
            Self::new(tool, "cmd", vec!["/C".into(), command_line.into()], timeout)
        } else {
            Self::new(tool, "sh", vec!["-c".into(), command_line.into()], timeout)
        }
    }

    pub fn display(&self) -> String {
        let mut s = self.program.display().to_string();
        for a in &self.args {
            s.push(' ');
            s.push_str(a);
        }
        s
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    Succeeded,
    Failed,
    TimedOut,
    NotFound,
    SpawnFailed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvocationRecord {
    pub id: InvocationId,
    pub tool: String,
    pub program: String,
    pub args: Vec<String>,
    pub started_at: String,
    pub duration_ms: u64,
    pub exit_code: Option<i32>,
    pub status: InvocationStatus,
    #[serde(skip)]
    pub stdout: String,
    #[serde(skip)]
    pub stderr: String,
    pub stdout_lines: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvocationRecord {
    /// Record for a call that was decided without spawning anything (used by in-process fallbacks and fakes).
    pub fn synthetic(inv: &Invocation, status: InvocationStatus, exit_code: Option<i32>, error: Option<String>) -> Self {
        Self {
            id: InvocationId::new(),
            tool: inv.tool.clone(),
            program: inv.program.display().to_string(),
            args: inv.args.clone(),
            started_at: timestamp(),
            duration_ms: 0,
            exit_code,
            status,
            stdout: String::new(),
            stderr: String::new(),
            stdout_lines: 0,
            error,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == InvocationStatus::Succeeded
    }

    pub fn summary(&self) -> String {
        match self.status {
            InvocationStatus::Succeeded => format!("{} succeeded ({} lines)", self.tool, self.stdout_lines),
            InvocationStatus::Failed => format!("{} exited with {:?}", self.tool, self.exit_code),
            InvocationStatus::TimedOut => format!("{} timed out after {}ms", self.tool, self.duration_ms),
            InvocationStatus::NotFound => format!("{} not found ({})", self.tool, self.program),
            InvocationStatus::SpawnFailed => {
                format!("{} could not start: {}", self.tool, self.error.as_deref().unwrap_or("unknown"))
            }
        }
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn spawn_reader<R: Read + Send + 'static>(mut r: R) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = r.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// Keep the child out of the terminal's foreground group so Ctrl-C reaches only the pipeline.
fn detach_from_terminal_group(cmd: &mut Command) {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
    }
}

fn collect(rx: Option<mpsc::Receiver<Vec<u8>>>) -> String {
    // a descendant that inherited the pipe can keep it open; do not wait on it forever
    rx.and_then(|rx| rx.recv_timeout(READER_GRACE).ok())
        .map(|b| String::from_utf8_lossy(&b).to_string())
        .unwrap_or_default()
}

/// Run `inv` to completion or until its timeout, whichever comes first. A timed-out child is killed.
///
/// Never fails: spawn errors, timeouts and non-zero exits are all reported in the record.
pub fn run_bounded(inv: &Invocation) -> InvocationRecord {
    let started_at = timestamp();
    let start = Instant::now();

    let mut cmd = Command::new(&inv.program);
    cmd.args(&inv.args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    if let Some(cwd) = &inv.cwd {
        cmd.current_dir(cwd);
    }
    detach_from_terminal_group(&mut cmd);

    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            let status = if e.kind() == std::io::ErrorKind::NotFound {
                InvocationStatus::NotFound
            } else {
                InvocationStatus::SpawnFailed
            };
            tracing::debug!(tool = %inv.tool, "spawn {} failed: {}", inv.display(), e);
            let mut rec = InvocationRecord::synthetic(inv, status, None, Some(e.to_string()));
            rec.started_at = started_at;
            return rec;
        }
    };

    let stdout_rx = child.stdout.take().map(spawn_reader);
    let stderr_rx = child.stderr.take().map(spawn_reader);
    let deadline = start + inv.timeout;

    let (status, exit_code, error) = loop {
        match child.try_wait() {
            Ok(Some(st)) => {
                let status = if st.success() { InvocationStatus::Succeeded } else { InvocationStatus::Failed };
                break (status, st.code(), None);
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    break (
                        InvocationStatus::TimedOut,
                        None,
                        Some(format!("timed out after {}s", inv.timeout.as_secs())),
                    );
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                break (InvocationStatus::Failed, None, Some(format!("wait failed: {}", e)));
            }
        }
    };

    let stdout = collect(stdout_rx);
    let stderr = collect(stderr_rx);
    let stdout_lines = stdout.lines().count();
    tracing::debug!(tool = %inv.tool, ?status, ?exit_code, "ran {}", inv.display());

    InvocationRecord {
        id: InvocationId::new(),
        tool: inv.tool.clone(),
        program: inv.program.display().to_string(),
        args: inv.args.clone(),
        started_at,
        duration_ms: start.elapsed().as_millis() as u64,
        exit_code,
        status,
        stdout,
        stderr,
        stdout_lines,
        error,
    }
}
