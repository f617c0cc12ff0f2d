use std::sync::mpsc::SyncSender;
use std::sync::Mutex;

use ff_core::{trace_entry, Journal, LogEntry, LogLevel};
use ff_evidence::{FsRecorder, Recorder};

use crate::PipelineEvent;

/// Worker-side journal: every line is traced, kept, streamed to the foreground and, once the
/// evidence directory exists, appended to `Reporte/forensic_log.txt`.
pub struct ChannelJournal {
    tx: SyncSender<PipelineEvent>,
    entries: Mutex<Vec<LogEntry>>,
    sink: Mutex<Option<FsRecorder>>,
}

impl ChannelJournal {
    pub fn new(tx: SyncSender<PipelineEvent>) -> Self {
        Self { tx, entries: Mutex::new(Vec::new()), sink: Mutex::new(None) }
    }

    /// Send a non-log event. A foreground that hung up is not an error for the worker.
    pub fn emit(&self, event: PipelineEvent) {
        let _ = self.tx.send(event);
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Start mirroring to the case log, writing out the lines logged so far.
    pub fn attach(&self, recorder: FsRecorder) {
        if let Err(e) = recorder.write_event_log(&self.entries()) {
            tracing::warn!("could not write event log: {:#}", e);
        }
        if let Ok(mut sink) = self.sink.lock() {
            *sink = Some(recorder);
        }
    }
}

impl Journal for ChannelJournal {
    fn log(&self, level: LogLevel, message: &str) {
        trace_entry(level, message);
        let entry = LogEntry::now(level, message);
        if let Ok(sink) = self.sink.lock() {
            if let Some(recorder) = sink.as_ref() {
                if let Err(e) = recorder.append_log(&entry) {
                    tracing::debug!("event log append failed: {:#}", e);
                }
            }
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.clone());
        }
        let _ = self.tx.send(PipelineEvent::Log(entry));
    }
}
