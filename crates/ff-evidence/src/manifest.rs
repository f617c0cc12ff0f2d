use serde::{Deserialize, Serialize};

use ff_core::{CaptureArtifact, CustodyRecord, EvidenceCase, PhaseOutcome};

/// `case.json`: what happened to a case, written whether or not the run finished.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseManifest {
    pub case: EvidenceCase,
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    pub outcomes: Vec<PhaseOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<CaptureArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custody: Option<CustodyRecord>,
}

impl CaseManifest {
    pub fn new(case: EvidenceCase, started_at: impl Into<String>) -> Self {
        Self {
            case,
            started_at: started_at.into(),
            finished_at: None,
            device: None,
            outcomes: Vec::new(),
            artifacts: Vec::new(),
            custody: None,
        }
    }
}
