use std::path::PathBuf;

use anyhow::{Context, Result};
use ff_core::TracingJournal;
use ff_tools::{ToolManager, ToolStatus};

use crate::{evaluate, Config, ElevationPolicy, Environment};

#[derive(Clone, Debug)]
pub struct DoctorReport {
    pub environment: Environment,
    pub warnings: Vec<String>,
    pub evidence_root: PathBuf,
    pub tools: Vec<ToolStatus>,
}

/// Pre-flight check: host, evidence root, tool inventory. Nothing is installed.
pub fn doctor(cfg: &Config, policy: ElevationPolicy, env: &Environment) -> Result<DoctorReport> {
    let warnings = evaluate(env, &cfg.environment.supported_os, policy)?;

    let evidence_root = cfg.evidence_root();
    std::fs::create_dir_all(&evidence_root)
        .with_context(|| format!("evidence root {} is not writable", evidence_root.display()))?;

    let locator = cfg.locator();
    let tools = ToolManager::new(&locator, &TracingJournal).status();
    Ok(DoctorReport { environment: env.clone(), warnings, evidence_root, tools })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(root: &std::path::Path) -> Config {
        let mut cfg = Config::default_for_host();
        cfg.case.evidence_root = root.join("evidence").display().to_string();
        cfg.tools.root = root.join("tools").display().to_string();
        cfg.tools.search_path = Some(false);
        cfg
    }

    #[test]
    fn reports_missing_tools_without_failing() {
        let dir = tempdir().unwrap();
        let env = Environment { os: "linux".into(), elevated: false };
        let report = doctor(&config(dir.path()), ElevationPolicy::Permissive, &env).unwrap();
        assert_eq!(report.tools.len(), 5);
        assert!(report.tools.iter().all(|t| !t.available()));
        assert_eq!(report.warnings.len(), 1);
        assert!(report.evidence_root.is_dir());
    }

    #[test]
    fn strict_policy_fails_unelevated() {
        let dir = tempdir().unwrap();
        let env = Environment { os: "linux".into(), elevated: false };
        let err = doctor(&config(dir.path()), ElevationPolicy::Strict, &env).unwrap_err();
        assert!(err.to_string().contains("privileges"));
    }
}
