use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Invocation, ToolId};

/// A tool that was found on this machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTool {
    pub id: ToolId,
    pub path: PathBuf,
    /// Interpreter to run the entry point with (`python` for `vol.py`).
    pub launcher: Option<String>,
    /// Whether sibling lookups may fall back to `PATH`.
    pub search_path: bool,
}

impl ResolvedTool {
    pub fn new(id: ToolId, path: impl Into<PathBuf>) -> Self {
        Self { id, path: path.into(), launcher: None, search_path: true }
    }

    pub fn invocation(&self, args: Vec<String>, timeout: Duration) -> Invocation {
        match &self.launcher {
            Some(launcher) => {
                let mut full = vec![self.path.display().to_string()];
                full.extend(args);
                Invocation::new(self.id.key(), launcher, full, timeout)
            }
            None => Invocation::new(self.id.key(), &self.path, args, timeout),
        }
    }

    /// Another binary shipped next to this one (e.g. `mmls` beside `fls`), then `PATH` if the locator allowed it.
    pub fn sibling(&self, binary: &str) -> Option<PathBuf> {
        let name = format!("{}{}", binary, std::env::consts::EXE_SUFFIX);
        if let Some(dir) = self.path.parent() {
            let candidate = dir.join(&name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        if !self.search_path {
            return None;
        }
        which::which(binary).ok()
    }
}

/// Resolution order: configured override, then the tools root, then `PATH`.
#[derive(Clone, Debug)]
pub struct ToolLocator {
    pub tools_root: PathBuf,
    pub overrides: BTreeMap<String, PathBuf>,
    pub python: String,
    pub search_path: bool,
}

impl ToolLocator {
    pub fn new(tools_root: impl Into<PathBuf>) -> Self {
        Self {
            tools_root: tools_root.into(),
            overrides: BTreeMap::new(),
            python: "python".to_string(),
            search_path: true,
        }
    }

    pub fn with_override(mut self, id: ToolId, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(id.key().to_string(), path.into());
        self
    }

    pub fn locate(&self, id: ToolId) -> Option<ResolvedTool> {
        let path = self.find_path(id)?;
        let launcher = if path.extension().map(|e| e == "py").unwrap_or(false) {
            Some(self.python.clone())
        } else {
            None
        };
        Some(ResolvedTool { id, path, launcher, search_path: self.search_path })
    }

    fn find_path(&self, id: ToolId) -> Option<PathBuf> {
        if let Some(p) = self.overrides.get(id.key()) {
            if p.exists() {
                return Some(p.clone());
            }
            tracing::warn!(tool = id.key(), "configured path {} does not exist", p.display());
        }
        let bundled = self.tools_root.join(id.spec().relative_path);
        if bundled.exists() {
            return Some(bundled);
        }
        if !self.search_path {
            return None;
        }
        id.spec().path_names.iter().find_map(|name| which::which(name).ok())
    }

    pub fn tools_root(&self) -> &Path {
        &self.tools_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn isolated(root: &Path) -> ToolLocator {
        let mut l = ToolLocator::new(root);
        l.search_path = false;
        l
    }

    #[test]
    fn bundled_tool_is_found_under_root() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("dd/dd.exe");
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(&p, b"").unwrap();
        let found = isolated(dir.path()).locate(ToolId::BlockCopy).unwrap();
        assert_eq!(found.path, p);
        assert!(found.launcher.is_none());
    }

    #[test]
    fn override_wins_and_python_entry_gets_launcher() {
        let dir = tempdir().unwrap();
        let vol = dir.path().join("custom_vol.py");
        std::fs::write(&vol, b"").unwrap();
        let locator = isolated(dir.path()).with_override(ToolId::Volatility, &vol);
        let found = locator.locate(ToolId::Volatility).unwrap();
        assert_eq!(found.path, vol);
        assert_eq!(found.launcher.as_deref(), Some("python"));

        let inv = found.invocation(vec!["-f".into(), "mem.raw".into(), "pslist".into()], Duration::from_secs(1));
        assert_eq!(inv.program, PathBuf::from("python"));
        assert_eq!(inv.args[0], vol.display().to_string());
        assert_eq!(inv.args.len(), 4);
    }

    #[cfg(unix)]
    #[test]
    fn sibling_lookup_honours_path_isolation() {
        let dir = tempdir().unwrap();
        let fls = dir.path().join("tsk/bin/fls.exe");
        std::fs::create_dir_all(fls.parent().unwrap()).unwrap();
        std::fs::write(&fls, b"").unwrap();
        let found = isolated(dir.path()).with_override(ToolId::SleuthKit, &fls).locate(ToolId::SleuthKit).unwrap();
        assert!(!found.search_path);
        // `sh` is on PATH everywhere, but an isolated locator must not reach it
        assert!(found.sibling("sh").is_none());

        std::fs::write(fls.with_file_name("mmls"), b"").unwrap();
        assert_eq!(found.sibling("mmls"), Some(fls.with_file_name("mmls")));

        let open = ResolvedTool::new(ToolId::SleuthKit, &fls);
        assert!(open.sibling("sh").is_some());
    }

    #[test]
    fn missing_tool_without_path_search() {
        let dir = tempdir().unwrap();
        assert!(isolated(dir.path()).locate(ToolId::MemoryImager).is_none());
    }
}
