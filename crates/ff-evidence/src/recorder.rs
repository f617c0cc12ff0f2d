use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use ff_core::{CustodyRecord, DigestEntry, LogEntry};

use crate::{CaseManifest, EvidenceLayout};

const HEAVY_RULE: usize = 60;

/// Persists evidence documents. Only the pipeline worker holds one.
pub trait Recorder {
    fn layout(&self) -> &EvidenceLayout;
    fn write_digest_table(&self, path: &Path, title: &str, entries: &[DigestEntry]) -> Result<()>;
    fn write_custody(&self, record: &CustodyRecord) -> Result<()>;
    fn write_json(&self, path: &Path, value: &serde_json::Value) -> Result<()>;
    fn write_text(&self, path: &Path, text: &str) -> Result<()>;
    fn append_log(&self, entry: &LogEntry) -> Result<()>;
    fn write_event_log(&self, entries: &[LogEntry]) -> Result<()>;
    fn write_manifest(&self, manifest: &CaseManifest) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct FsRecorder {
    layout: EvidenceLayout,
}

impl FsRecorder {
    pub fn new(layout: EvidenceLayout) -> Self {
        Self { layout }
    }
}

pub fn render_digest_table(title: &str, entries: &[DigestEntry]) -> String {
    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    out.push_str(&"=".repeat(HEAVY_RULE));
    out.push_str("\n\n");
    for entry in entries {
        let (md5, sha256) = match &entry.digests {
            Ok(pair) => (pair.md5.clone(), pair.sha256.clone()),
            Err(e) => (format!("Error: {}", e), format!("Error: {}", e)),
        };
        out.push_str(&format!("File: {}\n", entry.name));
        out.push_str(&format!("MD5:    {}\n", md5));
        out.push_str(&format!("SHA256: {}\n", sha256));
        out.push_str(&"-".repeat(HEAVY_RULE));
        out.push_str("\n\n");
    }
    out
}

pub fn render_custody(record: &CustodyRecord) -> String {
    let protection = if record.original_protected {
        "protected, read-only"
    } else {
        "PROTECTION FAILED, still writable"
    };
    let status = if record.verified {
        "VERIFIED - digests match"
    } else {
        "MISMATCH - digests differ, working copy must not be used"
    };
    let mut out = String::new();
    out.push_str("CHAIN OF CUSTODY - FORENSIC DISK CAPTURE\n");
    out.push_str(&"=".repeat(HEAVY_RULE));
    out.push_str("\n\n");
    out.push_str(&format!("Captured at: {}\n", record.captured_at));
    out.push_str(&format!("Source device: {}\n", record.device));
    out.push_str(&format!("Tool: {}\n\n", record.tool));
    out.push_str(&format!("ORIGINAL IMAGE ({}):\n", protection));
    out.push_str(&format!("File: {}\n", record.original.file));
    out.push_str(&format!("MD5:    {}\n", record.original.digests.md5));
    out.push_str(&format!("SHA256: {}\n\n", record.original.digests.sha256));
    out.push_str("WORKING COPY (for analysis):\n");
    out.push_str(&format!("File: {}\n", record.working_copy.file));
    out.push_str(&format!("MD5:    {}\n", record.working_copy.digests.md5));
    out.push_str(&format!("SHA256: {}\n\n", record.working_copy.digests.sha256));
    out.push_str("INTEGRITY VERIFICATION:\n");
    out.push_str(&format!("Status: {}\n", status));
    out
}

impl Recorder for FsRecorder {
    fn layout(&self) -> &EvidenceLayout {
        &self.layout
    }

    fn write_digest_table(&self, path: &Path, title: &str, entries: &[DigestEntry]) -> Result<()> {
        self.write_text(path, &render_digest_table(title, entries))
    }

    fn write_custody(&self, record: &CustodyRecord) -> Result<()> {
        self.write_text(&self.layout.custody_file(), &render_custody(record))
    }

    fn write_json(&self, path: &Path, value: &serde_json::Value) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        std::fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    fn write_text(&self, path: &Path, text: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        std::fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    fn append_log(&self, entry: &LogEntry) -> Result<()> {
        let path = self.layout.event_log();
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        writeln!(f, "{}", entry.to_line())?;
        Ok(())
    }

    fn write_event_log(&self, entries: &[LogEntry]) -> Result<()> {
        let mut text = String::new();
        for e in entries {
            text.push_str(&e.to_line());
            text.push('\n');
        }
        self.write_text(&self.layout.event_log(), &text)
    }

    fn write_manifest(&self, manifest: &CaseManifest) -> Result<()> {
        let path = self.layout.case_manifest();
        let bytes = serde_json::to_vec_pretty(manifest)?;
        std::fs::write(&path, bytes).with_context(|| format!("write manifest {}", path.display()))?;
        Ok(())
    }
}
