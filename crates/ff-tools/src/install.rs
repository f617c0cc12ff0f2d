use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::{run_bounded, Invocation, InvocationStatus, ToolSpec};

const CLONE_TIMEOUT: Duration = Duration::from_secs(600);
const PIP_TIMEOUT: Duration = Duration::from_secs(300);

/// How a tool gets onto this machine. Closed set; each variant knows how to acquire itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallStrategy {
    Manual { instructions: &'static str },
    /// Zip archive unpacked under `<tools_root>/<extract_to>`.
    ArchiveDownload { url: &'static str, extract_to: &'static str },
    /// Single executable stored at the tool's relative path.
    DirectDownload { url: &'static str },
    /// Shallow clone into `<tools_root>/<checkout>`, then pip requirements when present.
    SourceFetch { repository: &'static str, checkout: &'static str },
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("{tool} must be installed manually: {instructions}")]
    ManualRequired { tool: String, instructions: String },
    #[error("download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unpack archive for {tool}: {source}")]
    Archive {
        tool: String,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool}: {detail}")]
    Fetch { tool: String, detail: String },
    #[error("{tool} installed but {} is still missing", path.display())]
    Incomplete { tool: String, path: PathBuf },
}

impl InstallError {
    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        InstallError::Io { context: context.into(), source }
    }
}

impl InstallStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            InstallStrategy::Manual { .. } => "manual",
            InstallStrategy::ArchiveDownload { .. } => "download_zip",
            InstallStrategy::DirectDownload { .. } => "download_direct",
            InstallStrategy::SourceFetch { .. } => "git_clone",
        }
    }

    /// Install the tool described by `spec` under `tools_root` and return its entry point.
    pub fn acquire(&self, spec: &ToolSpec, tools_root: &Path) -> Result<PathBuf, InstallError> {
        let target = tools_root.join(spec.relative_path);
        match *self {
            InstallStrategy::Manual { instructions } => {
                return Err(InstallError::ManualRequired {
                    tool: spec.display_name.to_string(),
                    instructions: instructions.to_string(),
                })
            }
            InstallStrategy::ArchiveDownload { url, extract_to } => {
                let bytes = download(url)?;
                let dir = tools_root.join(extract_to);
                std::fs::create_dir_all(&dir).map_err(|e| InstallError::io(format!("create {}", dir.display()), e))?;
                let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
                    .map_err(|source| InstallError::Archive { tool: spec.display_name.to_string(), source })?;
                archive
                    .extract(&dir)
                    .map_err(|source| InstallError::Archive { tool: spec.display_name.to_string(), source })?;
            }
            InstallStrategy::DirectDownload { url } => {
                let bytes = download(url)?;
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| InstallError::io(format!("create {}", parent.display()), e))?;
                }
                std::fs::write(&target, bytes).map_err(|e| InstallError::io(format!("write {}", target.display()), e))?;
            }
            InstallStrategy::SourceFetch { repository, checkout } => {
                let dest = tools_root.join(checkout);
                if !dest.exists() {
                    std::fs::create_dir_all(tools_root)
                        .map_err(|e| InstallError::io(format!("create {}", tools_root.display()), e))?;
                    let clone = Invocation::new(
                        "git",
                        "git",
                        vec![
                            "clone".into(),
                            "--depth".into(),
                            "1".into(),
                            repository.into(),
                            dest.display().to_string(),
                        ],
                        CLONE_TIMEOUT,
                    );
                    let rec = run_bounded(&clone);
                    if !rec.succeeded() {
                        return Err(InstallError::Fetch {
                            tool: spec.display_name.to_string(),
                            detail: format!("{} {}", rec.summary(), rec.stderr.trim()),
                        });
                    }
                }
                install_requirements(&dest);
            }
        }
        if target.exists() {
            Ok(target)
        } else {
            Err(InstallError::Incomplete { tool: spec.display_name.to_string(), path: target })
        }
    }
}

fn download(url: &str) -> Result<Vec<u8>, InstallError> {
    tracing::info!("downloading {}", url);
    let resp = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|source| InstallError::Download { url: url.to_string(), source })?;
    let bytes = resp.bytes().map_err(|source| InstallError::Download { url: url.to_string(), source })?;
    Ok(bytes.to_vec())
}

// Missing python dependencies only limit which plugins work later; never fatal here.
fn install_requirements(checkout: &Path) {
    let req = checkout.join("requirements.txt");
    if !req.exists() {
        return;
    }
    let pip = Invocation::new(
        "pip",
        "pip",
        vec!["install".into(), "-r".into(), req.display().to_string()],
        PIP_TIMEOUT,
    );
    let rec = run_bounded(&pip);
    if rec.status != InvocationStatus::Succeeded {
        tracing::warn!("requirements for {} not installed: {}", checkout.display(), rec.summary());
    }
}
