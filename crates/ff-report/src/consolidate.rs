use std::path::{Path, PathBuf};

use ff_analysis::AnalysisResults;
use ff_capture::{DISK_INFO, ORIGINAL_IMAGE};
use ff_core::PhaseOutcome;
use ff_evidence::EvidenceLayout;

const SYSTEM_INFO_EXCERPT: usize = 2000;
const CUSTODY_EXCERPT: usize = 1500;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub size_bytes: u64,
}

/// Which disk evidence the case holds, judged from what is on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiskEvidence {
    Complete { custody: Option<String> },
    Selective { images: Vec<FileEntry>, digests: Option<String> },
    InfoOnly,
    None,
}

/// Everything the report needs, gathered from the evidence tree. Missing inputs stay `None`/empty.
#[derive(Clone, Debug)]
pub struct ReportData {
    pub case_dir: PathBuf,
    pub analysis: Option<AnalysisResults>,
    pub hashes: Option<String>,
    pub system_info: Option<String>,
    pub evidence_files: Vec<FileEntry>,
    pub disk: DiskEvidence,
    pub tsk_outputs: Vec<String>,
    pub outcomes: Vec<PhaseOutcome>,
}

fn read_excerpt(path: &Path, limit: Option<usize>) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    Some(match limit {
        Some(n) => text.chars().take(n).collect(),
        None => text,
    })
}

fn list_files(dir: &Path) -> Vec<FileEntry> {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<FileEntry> = rd
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let meta = e.metadata().ok()?;
            meta.is_file().then(|| FileEntry { name: e.file_name().to_string_lossy().to_string(), size_bytes: meta.len() })
        })
        .collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}

fn disk_evidence(layout: &EvidenceLayout) -> DiskEvidence {
    let disk_dir = layout.disk_images();
    if disk_dir.join(ORIGINAL_IMAGE).is_file() {
        return DiskEvidence::Complete { custody: read_excerpt(&layout.custody_file(), Some(CUSTODY_EXCERPT)) };
    }
    let images: Vec<FileEntry> = list_files(&disk_dir).into_iter().filter(|f| f.name.ends_with(".bin")).collect();
    if !images.is_empty() {
        return DiskEvidence::Selective { images, digests: read_excerpt(&layout.disk_hashes_file(), None) };
    }
    if disk_dir.join(DISK_INFO).is_file() {
        return DiskEvidence::InfoOnly;
    }
    DiskEvidence::None
}

impl ReportData {
    pub fn consolidate(layout: &EvidenceLayout, outcomes: &[PhaseOutcome]) -> Self {
        let analysis = std::fs::read(layout.analysis_results())
            .ok()
            .and_then(|b| serde_json::from_slice::<serde_json::Value>(&b).ok())
            .and_then(AnalysisResults::from_json);
        tracing::debug!(case = %layout.root().display(), has_analysis = analysis.is_some(), "consolidating report data");
        Self {
            case_dir: layout.root().to_path_buf(),
            analysis,
            hashes: read_excerpt(&layout.hashes_file(), None),
            system_info: read_excerpt(&layout.system_info_file(), Some(SYSTEM_INFO_EXCERPT)),
            evidence_files: list_files(&layout.dumps()),
            disk: disk_evidence(layout),
            tsk_outputs: list_files(&layout.tsk_output()).into_iter().map(|f| f.name).collect(),
            outcomes: outcomes.to_vec(),
        }
    }
}
