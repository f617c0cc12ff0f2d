use thiserror::Error;

use crate::CaptureArtifact;

/// Why a capture step fell back instead of producing a real artifact.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DegradeReason {
    #[error("{tool} not found")]
    ToolMissing { tool: String },
    #[error("{tool} timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },
    #[error("{tool} produced no output file")]
    NoOutput { tool: String },
    #[error("{tool} failed: {detail}")]
    ToolFailed { tool: String, detail: String },
    #[error("i/o error: {0}")]
    Io(String),
}

/// The explicit degrade-gracefully outcome of a capture step.
///
/// A capture returns `Result<CaptureArtifact, Degraded>`: `Ok` is a real capture, `Fallback`
/// carries the substitute artifact that was produced instead, `Unavailable` means even the
/// fallback could not be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Degraded {
    Fallback { artifact: CaptureArtifact, reason: DegradeReason },
    Unavailable { reason: DegradeReason, fallback_error: String },
}

impl Degraded {
    pub fn reason(&self) -> &DegradeReason {
        match self {
            Degraded::Fallback { reason, .. } => reason,
            Degraded::Unavailable { reason, .. } => reason,
        }
    }

    pub fn artifact(&self) -> Option<&CaptureArtifact> {
        match self {
            Degraded::Fallback { artifact, .. } => Some(artifact),
            Degraded::Unavailable { .. } => None,
        }
    }
}

/// Artifact that was produced by a capture step, real or substitute.
pub fn produced_artifact(result: &Result<CaptureArtifact, Degraded>) -> Option<&CaptureArtifact> {
    match result {
        Ok(a) => Some(a),
        Err(d) => d.artifact(),
    }
}
