use std::path::PathBuf;

use ff_core::{
    ArtifactKind, CaptureArtifact, CaptureMode, CaseId, CaseState, Degraded, DegradeReason, EvidenceCase,
    PhaseName, PhaseOutcome, PhaseStatus, Protection,
};

#[test]
fn test_case_creation() {
    let case = EvidenceCase::new(CaseId::from_str("Analysis_1"), PathBuf::from("/tmp/x"), CaptureMode::Selective);
    assert_eq!(case.state, CaseState::Created);
    assert_eq!(case.mode, CaptureMode::Selective);
}

#[test]
fn test_capture_mode_parse() {
    assert_eq!(CaptureMode::parse("Complete"), Some(CaptureMode::Complete));
    assert_eq!(CaptureMode::parse("none"), Some(CaptureMode::None));
    assert_eq!(CaptureMode::parse("full"), None);
}

#[test]
fn test_phase_order() {
    let idx: Vec<usize> = PhaseName::ORDER.iter().map(|p| p.index()).collect();
    assert_eq!(idx, vec![0, 1, 2, 3]);
}

#[test]
fn test_phase_outcome_index_follows_phase() {
    let o = PhaseOutcome::success(PhaseName::Analyze, "ok");
    assert_eq!(o.index, 2);
    assert_eq!(o.status, PhaseStatus::Success);
    assert!(o.error_kind.is_none());
}

#[test]
fn test_artifact_from_file() {
    let dir = std::env::temp_dir().join(format!("ff-core-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let p = dir.join("a.bin");
    std::fs::write(&p, [0u8; 10]).unwrap();
    let a = CaptureArtifact::from_file(&p, ArtifactKind::DiskRegion).unwrap();
    assert_eq!(a.name, "a.bin");
    assert_eq!(a.size_bytes, 10);
    assert_eq!(a.protection, Protection::Writable);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_degraded_exposes_fallback() {
    let artifact = CaptureArtifact {
        name: "memory_dump_simulated.raw".into(),
        path: PathBuf::from("memory_dump_simulated.raw"),
        size_bytes: 34000,
        kind: ArtifactKind::SimulatedPlaceholder,
        protection: Protection::Writable,
    };
    let d = Degraded::Fallback { artifact: artifact.clone(), reason: DegradeReason::ToolMissing { tool: "winpmem".into() } };
    assert_eq!(d.artifact(), Some(&artifact));
    assert!(d.reason().to_string().contains("winpmem"));
    assert!(artifact.is_simulated());
}
