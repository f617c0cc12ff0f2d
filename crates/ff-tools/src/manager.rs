use std::path::PathBuf;

use ff_core::Journal;
use serde::Serialize;

use crate::{InstallError, ToolId, ToolLocator};

#[derive(Clone, Debug, Serialize)]
pub struct ToolStatus {
    pub id: ToolId,
    pub display_name: &'static str,
    pub path: Option<PathBuf>,
    pub install: &'static str,
}

impl ToolStatus {
    pub fn available(&self) -> bool {
        self.path.is_some()
    }
}

pub struct ToolManager<'a> {
    locator: &'a ToolLocator,
    journal: &'a dyn Journal,
}

impl<'a> ToolManager<'a> {
    pub fn new(locator: &'a ToolLocator, journal: &'a dyn Journal) -> Self {
        Self { locator, journal }
    }

    pub fn status(&self) -> Vec<ToolStatus> {
        ToolId::ALL
            .into_iter()
            .map(|id| {
                let spec = id.spec();
                ToolStatus {
                    id,
                    display_name: spec.display_name,
                    path: self.locator.locate(id).map(|t| t.path),
                    install: spec.strategy.label(),
                }
            })
            .collect()
    }

    pub fn install(&self, id: ToolId) -> Result<PathBuf, InstallError> {
        let spec = id.spec();
        self.journal.info(&format!("installing {} ({})", spec.display_name, spec.strategy.label()));
        let path = spec.strategy.acquire(spec, self.locator.tools_root())?;
        self.journal.success(&format!("{} installed at {}", spec.display_name, path.display()));
        Ok(path)
    }

    /// Report every catalog tool; with `auto_install`, try to install the missing ones first.
    pub fn ensure_all(&self, auto_install: bool) -> Vec<ToolStatus> {
        for status in self.status() {
            if status.available() {
                continue;
            }
            if !auto_install {
                self.journal.warn(&format!("{} not found", status.display_name));
                continue;
            }
            if let Err(e) = self.install(status.id) {
                self.journal.warn(&format!("{} could not be installed: {}", status.display_name, e));
            }
        }
        self.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ff_core::{LogLevel, MemoryJournal};
    use tempfile::tempdir;

    #[test]
    fn ensure_all_reports_missing_without_installing() {
        let dir = tempdir().unwrap();
        let mut locator = ToolLocator::new(dir.path());
        locator.search_path = false;
        let journal = MemoryJournal::new();
        let statuses = ToolManager::new(&locator, &journal).ensure_all(false);
        assert_eq!(statuses.len(), 5);
        assert!(statuses.iter().all(|s| !s.available()));
        assert!(journal.contains(LogLevel::Warning, "WinPmem not found"));
    }
}
