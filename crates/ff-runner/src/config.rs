use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use ff_analysis::{default_modules, TskRunner, VolatilityRunner};
use ff_capture::{default_imager_args, BlockCopier, CaptureExecutor, DdCopier, DEFAULT_MEMORY_TIMEOUT};
use ff_core::CaptureMode;
use ff_tools::{ToolId, ToolLocator};

use crate::ElevationPolicy;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub case: CaseConfig,
    pub environment: EnvironmentConfig,
    pub tools: ToolsConfig,
    pub capture: CaptureConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseConfig {
    pub evidence_root: String,
    /// "selective" | "complete" | "none"
    pub mode: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// "strict" | "permissive"
    pub elevation: String,
    pub supported_os: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    pub root: String,
    #[serde(default)]
    pub auto_install: bool,
    #[serde(default = "default_python")]
    pub python: String,
    #[serde(default)]
    pub search_path: Option<bool>,
    /// Tool key (`winpmem`, `dd`, ...) to an explicit path.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub device: String,
    #[serde(default = "default_imager_args")]
    pub imager_args: Vec<String>,
    #[serde(default)]
    pub memory_timeout_secs: Option<u64>,
    #[serde(default = "default_true")]
    pub system_info: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_modules")]
    pub volatility_modules: Vec<String>,
    #[serde(default)]
    pub module_timeout_secs: Option<u64>,
}

fn default_python() -> String {
    "python".to_string()
}

fn default_true() -> bool {
    true
}

fn default_device() -> String {
    if cfg!(windows) {
        r"\\.\PhysicalDrive0".to_string()
    } else {
        "/dev/sda".to_string()
    }
}

fn expand(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

impl Config {
    pub fn default_for_host() -> Self {
        Self {
            case: CaseConfig {
                evidence_root: "~/Desktop/ForensicFlow_Evidence".to_string(),
                mode: "selective".to_string(),
            },
            environment: EnvironmentConfig {
                elevation: "strict".to_string(),
                supported_os: vec!["windows".to_string(), "linux".to_string()],
            },
            tools: ToolsConfig {
                root: "~/ForensicFlow_Tools".to_string(),
                auto_install: false,
                python: default_python(),
                search_path: Some(true),
                overrides: BTreeMap::new(),
            },
            capture: CaptureConfig {
                device: default_device(),
                imager_args: default_imager_args(),
                memory_timeout_secs: Some(DEFAULT_MEMORY_TIMEOUT.as_secs()),
                system_info: true,
            },
            analysis: AnalysisConfig { volatility_modules: default_modules(), module_timeout_secs: None },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    /// Load `path`, or write and return the host defaults when it does not exist yet.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load_from(path);
        }
        let cfg = Self::default_for_host();
        cfg.save_to(path)?;
        Ok(cfg)
    }

    pub fn default_path() -> PathBuf {
        expand("~/.forensicflow/forensicflow.toml")
    }

    pub fn evidence_root(&self) -> PathBuf {
        expand(&self.case.evidence_root)
    }

    pub fn mode(&self) -> Result<CaptureMode> {
        CaptureMode::parse(&self.case.mode).ok_or_else(|| anyhow!("unknown capture mode {:?}", self.case.mode))
    }

    pub fn elevation_policy(&self) -> Result<ElevationPolicy> {
        ElevationPolicy::parse(&self.environment.elevation)
            .ok_or_else(|| anyhow!("unknown elevation policy {:?}", self.environment.elevation))
    }

    pub fn locator(&self) -> ToolLocator {
        let mut locator = ToolLocator::new(expand(&self.tools.root));
        locator.python = self.tools.python.clone();
        locator.search_path = self.tools.search_path.unwrap_or(true);
        for (key, path) in &self.tools.overrides {
            match ToolId::parse(key) {
                Some(id) => locator = locator.with_override(id, expand(path)),
                None => tracing::warn!("ignoring override for unknown tool {:?}", key),
            }
        }
        locator
    }

    /// Capture executor wired to whatever tools the locator finds right now.
    pub fn capture_executor(&self) -> CaptureExecutor {
        let locator = self.locator();
        let copier = locator
            .locate(ToolId::BlockCopy)
            .map(|t| Box::new(DdCopier::new(t)) as Box<dyn BlockCopier>);
        let mut exec = CaptureExecutor::new(locator.locate(ToolId::MemoryImager), copier);
        exec.imager_args = self.capture.imager_args.clone();
        if let Some(secs) = self.capture.memory_timeout_secs {
            exec.memory_timeout = Duration::from_secs(secs);
        }
        exec
    }

    pub fn volatility_runner(&self) -> VolatilityRunner {
        let mut runner = VolatilityRunner::new(self.locator().locate(ToolId::Volatility));
        runner.modules = self.analysis.volatility_modules.clone();
        if let Some(secs) = self.analysis.module_timeout_secs {
            runner.timeout = Duration::from_secs(secs);
        }
        runner
    }

    pub fn tsk_runner(&self) -> TskRunner {
        let mut runner = TskRunner::new(self.locator().locate(ToolId::SleuthKit));
        if let Some(secs) = self.analysis.module_timeout_secs {
            runner.timeout = Duration::from_secs(secs);
        }
        runner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/forensicflow.toml");
        let mut cfg = Config::default_for_host();
        cfg.tools.overrides.insert("dd".into(), "/opt/dd".into());
        cfg.save_to(&path).unwrap();
        let back = Config::load_from(&path).unwrap();
        assert_eq!(back.tools.overrides["dd"], "/opt/dd");
        assert_eq!(back.mode().unwrap(), CaptureMode::Selective);
        assert_eq!(back.elevation_policy().unwrap(), ElevationPolicy::Strict);
        assert!(!back.tools.auto_install);
    }

    #[test]
    fn optional_sections_take_defaults() {
        let text = r#"
[case]
evidence_root = "/tmp/ev"
mode = "complete"

[environment]
elevation = "permissive"
supported_os = ["linux"]

[tools]
root = "/tmp/tools"

[capture]
device = "/dev/sdb"

[analysis]
"#;
        let cfg: Config = toml::from_str(text).unwrap();
        assert_eq!(cfg.capture.imager_args, default_imager_args());
        assert!(cfg.capture.system_info);
        assert_eq!(cfg.analysis.volatility_modules, default_modules());
        assert_eq!(cfg.tools.python, "python");
        assert_eq!(cfg.evidence_root(), PathBuf::from("/tmp/ev"));
    }

    #[test]
    fn load_or_init_writes_defaults_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forensicflow.toml");
        let cfg = Config::load_or_init(&path).unwrap();
        assert!(path.is_file());
        assert_eq!(cfg.environment.supported_os, vec!["windows", "linux"]);
    }

    #[test]
    fn bad_mode_is_an_error() {
        let mut cfg = Config::default_for_host();
        cfg.case.mode = "partial".into();
        assert!(cfg.mode().is_err());
    }
}
