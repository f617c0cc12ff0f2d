use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseState {
    Created,
    Acquiring,
    Analyzing,
    Reporting,
    Complete,
    Failed,
    /// Cancelled by the operator between phases.
    Stopped,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    Selective,
    Complete,
    None,
}

impl CaptureMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "selective" => Some(CaptureMode::Selective),
            "complete" => Some(CaptureMode::Complete),
            "none" => Some(CaptureMode::None),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaptureMode::Selective => "selective (critical areas)",
            CaptureMode::Complete => "complete (full forensic image)",
            CaptureMode::None => "none",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    MemoryDump,
    DiskRegion,
    FullDiskImage,
    SimulatedPlaceholder,
    SystemInfo,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Protection {
    Writable,
    ReadOnly,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PhaseName {
    VerifyEnvironment,
    Acquire,
    Analyze,
    Report,
}

impl PhaseName {
    pub const ORDER: [PhaseName; 4] = [
        PhaseName::VerifyEnvironment,
        PhaseName::Acquire,
        PhaseName::Analyze,
        PhaseName::Report,
    ];

    pub fn index(&self) -> usize {
        match self {
            PhaseName::VerifyEnvironment => 0,
            PhaseName::Acquire => 1,
            PhaseName::Analyze => 2,
            PhaseName::Report => 3,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PhaseName::VerifyEnvironment => "Environment verification",
            PhaseName::Acquire => "Evidence acquisition",
            PhaseName::Analyze => "Automated analysis",
            PhaseName::Report => "Report generation",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Success,
    /// Finished with degraded sub-steps; still lets the next phase start.
    SoftFailure,
    HardFailure,
}

impl PhaseStatus {
    pub fn passes(&self) -> bool {
        !matches!(self, PhaseStatus::HardFailure)
    }
}

/// Severity of a journal line. Mirrors the levels shown to the operator.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
    Phase,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Phase => "PHASE",
        }
    }
}
