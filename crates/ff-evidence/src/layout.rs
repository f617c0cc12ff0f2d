use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ff_core::CaseId;

pub const REPORTS_DIR: &str = "Reporte";
pub const FINDINGS_DIR: &str = "Hallazgos";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Area {
    Dumps,
    VolatilityOutput,
    TskOutput,
    Hashes,
    DiskImages,
}

impl Area {
    pub const ALL: [Area; 5] = [Area::Dumps, Area::VolatilityOutput, Area::TskOutput, Area::Hashes, Area::DiskImages];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Area::Dumps => "dumps",
            Area::VolatilityOutput => "volatility_output",
            Area::TskOutput => "tsk_output",
            Area::Hashes => "hashes",
            Area::DiskImages => "disk_images",
        }
    }
}

/// Fixed directory tree of one case. Every path in the evidence tree is derived from here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvidenceLayout {
    root: PathBuf,
}

impl EvidenceLayout {
    /// Create `<evidence_root>/<case_id>` and its whole tree. An existing case folder is never reused;
    /// a `_2`, `_3`, ... suffix is appended instead.
    pub fn create(evidence_root: &Path, case_id: &CaseId) -> Result<Self> {
        std::fs::create_dir_all(evidence_root)
            .with_context(|| format!("create evidence root {}", evidence_root.display()))?;
        let mut root = evidence_root.join(case_id.as_str());
        let mut n = 2;
        while root.exists() {
            root = evidence_root.join(format!("{}_{}", case_id.as_str(), n));
            n += 1;
        }
        let layout = Self { root };
        layout.ensure()?;
        tracing::debug!("evidence tree created at {}", layout.root.display());
        Ok(layout)
    }

    /// Wrap an existing case folder.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn ensure(&self) -> Result<()> {
        let reports = self.reports();
        std::fs::create_dir_all(&reports).with_context(|| format!("create {}", reports.display()))?;
        for area in Area::ALL {
            let dir = self.area(area);
            std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn case_dir_name(&self) -> String {
        self.root.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
    }

    pub fn reports(&self) -> PathBuf {
        self.root.join(REPORTS_DIR)
    }

    pub fn findings(&self) -> PathBuf {
        self.root.join(FINDINGS_DIR)
    }

    pub fn area(&self, area: Area) -> PathBuf {
        self.findings().join(area.dir_name())
    }

    pub fn dumps(&self) -> PathBuf {
        self.area(Area::Dumps)
    }

    pub fn volatility_output(&self) -> PathBuf {
        self.area(Area::VolatilityOutput)
    }

    pub fn tsk_output(&self) -> PathBuf {
        self.area(Area::TskOutput)
    }

    pub fn hashes(&self) -> PathBuf {
        self.area(Area::Hashes)
    }

    pub fn disk_images(&self) -> PathBuf {
        self.area(Area::DiskImages)
    }

    pub fn hashes_file(&self) -> PathBuf {
        self.hashes().join("hashes.txt")
    }

    pub fn disk_hashes_file(&self) -> PathBuf {
        self.hashes().join("disk_hashes.txt")
    }

    pub fn custody_file(&self) -> PathBuf {
        self.hashes().join("chain_of_custody.txt")
    }

    pub fn analysis_results(&self) -> PathBuf {
        self.findings().join("analysis_results.json")
    }

    pub fn invocations_file(&self) -> PathBuf {
        self.findings().join("tool_invocations.json")
    }

    pub fn system_info_file(&self) -> PathBuf {
        self.dumps().join("system_info.txt")
    }

    pub fn case_manifest(&self) -> PathBuf {
        self.root.join("case.json")
    }

    pub fn event_log(&self) -> PathBuf {
        self.reports().join("forensic_log.txt")
    }

    pub fn autopsy_readme(&self) -> PathBuf {
        self.root.join("AUTOPSY_README.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_full_tree() {
        let dir = tempdir().unwrap();
        let layout = EvidenceLayout::create(dir.path(), &CaseId::from_str("Analysis_20240101_000000")).unwrap();
        assert!(layout.reports().is_dir());
        for sub in ["dumps", "volatility_output", "tsk_output", "hashes", "disk_images"] {
            assert!(layout.root().join("Hallazgos").join(sub).is_dir(), "{sub}");
        }
        assert_eq!(layout.custody_file(), layout.root().join("Hallazgos/hashes/chain_of_custody.txt"));
    }

    #[test]
    fn never_reuses_an_existing_case_folder() {
        let dir = tempdir().unwrap();
        let id = CaseId::from_str("Analysis_20240101_000000");
        let first = EvidenceLayout::create(dir.path(), &id).unwrap();
        let second = EvidenceLayout::create(dir.path(), &id).unwrap();
        assert_ne!(first.root(), second.root());
        assert_eq!(second.case_dir_name(), "Analysis_20240101_000000_2");
    }
}
