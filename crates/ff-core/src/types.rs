use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ids::*, model::*, ErrorKind};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvidenceCase {
    pub id: CaseId,
    pub root: PathBuf,
    pub mode: CaptureMode,
    pub state: CaseState,
}

impl EvidenceCase {
    pub fn new(id: CaseId, root: PathBuf, mode: CaptureMode) -> Self {
        Self { id, root, mode, state: CaseState::Created }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureArtifact {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub kind: ArtifactKind,
    pub protection: Protection,
}

impl CaptureArtifact {
    /// Build an artifact record from a file that exists on disk.
    pub fn from_file(path: impl Into<PathBuf>, kind: ArtifactKind) -> std::io::Result<Self> {
        let path = path.into();
        let meta = std::fs::metadata(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let protection = if meta.permissions().readonly() { Protection::ReadOnly } else { Protection::Writable };
        Ok(Self { name, path, size_bytes: meta.len(), kind, protection })
    }

    pub fn is_simulated(&self) -> bool {
        self.kind == ArtifactKind::SimulatedPlaceholder
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DigestPair {
    pub md5: String,
    pub sha256: String,
}

/// A digest table row. The digest slot holds the error text when the file could not be read.
#[derive(Clone, Debug)]
pub struct DigestEntry {
    pub name: String,
    pub digests: Result<DigestPair, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedDigest {
    pub file: String,
    pub digests: DigestPair,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustodyRecord {
    pub captured_at: String,
    pub device: String,
    pub tool: String,
    pub original: NamedDigest,
    pub working_copy: NamedDigest,
    pub original_protected: bool,
    pub verified: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub phase: PhaseName,
    pub index: usize,
    pub status: PhaseStatus,
    pub diagnostic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl PhaseOutcome {
    pub fn success(phase: PhaseName, diagnostic: impl Into<String>) -> Self {
        Self::new(phase, PhaseStatus::Success, diagnostic, None)
    }

    pub fn soft(phase: PhaseName, diagnostic: impl Into<String>) -> Self {
        Self::new(phase, PhaseStatus::SoftFailure, diagnostic, None)
    }

    pub fn hard(phase: PhaseName, diagnostic: impl Into<String>, kind: ErrorKind) -> Self {
        Self::new(phase, PhaseStatus::HardFailure, diagnostic, Some(kind))
    }

    pub fn new(phase: PhaseName, status: PhaseStatus, diagnostic: impl Into<String>, error_kind: Option<ErrorKind>) -> Self {
        Self { phase, index: phase.index(), status, diagnostic: diagnostic.into(), error_kind }
    }
}
