use std::sync::Mutex;
use std::time::Duration;

use ff_tools::{run_bounded, Invocation, InvocationRecord, ResolvedTool};

use crate::{BlockCopier, IntegrityProtocol};

pub const DEFAULT_MEMORY_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const NATIVE_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

pub fn default_imager_args() -> Vec<String> {
    vec!["{output}".to_string(), "-o".to_string()]
}

/// Runs the capture tools for one case and keeps a record of every external call it made.
pub struct CaptureExecutor {
    pub imager: Option<ResolvedTool>,
    /// Arguments for the imager; `{output}` is replaced with the dump path.
    pub imager_args: Vec<String>,
    pub memory_timeout: Duration,
    pub copier: Option<Box<dyn BlockCopier>>,
    pub integrity: IntegrityProtocol,
    invocations: Mutex<Vec<InvocationRecord>>,
}

impl CaptureExecutor {
    pub fn new(imager: Option<ResolvedTool>, copier: Option<Box<dyn BlockCopier>>) -> Self {
        Self {
            imager,
            imager_args: default_imager_args(),
            memory_timeout: DEFAULT_MEMORY_TIMEOUT,
            copier,
            integrity: IntegrityProtocol::default(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn with_integrity(mut self, integrity: IntegrityProtocol) -> Self {
        self.integrity = integrity;
        self
    }

    pub(crate) fn run(&self, inv: &Invocation) -> InvocationRecord {
        let rec = run_bounded(inv);
        self.note(rec.clone());
        rec
    }

    pub(crate) fn note(&self, rec: InvocationRecord) {
        if let Ok(mut all) = self.invocations.lock() {
            all.push(rec);
        }
    }

    /// Drain the invocation records gathered so far.
    pub fn take_invocations(&self) -> Vec<InvocationRecord> {
        self.invocations.lock().map(|mut v| std::mem::take(&mut *v)).unwrap_or_default()
    }
}
