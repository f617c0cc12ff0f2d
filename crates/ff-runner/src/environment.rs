use ff_core::FlowError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElevationPolicy {
    /// Refuse to run without administrator/root rights.
    Strict,
    /// Warn and carry on; tools that need rights will degrade.
    Permissive,
}

impl ElevationPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Some(ElevationPolicy::Strict),
            "permissive" => Some(ElevationPolicy::Permissive),
            _ => None,
        }
    }
}

/// Facts about the host the pipeline is about to run on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Environment {
    pub os: String,
    pub elevated: bool,
}

impl Environment {
    pub fn detect() -> Self {
        Self { os: std::env::consts::OS.to_string(), elevated: is_elevated() }
    }
}

#[cfg(unix)]
fn is_elevated() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(windows)]
fn is_elevated() -> bool {
    // `net session` only succeeds for administrators.
    let inv = ff_tools::Invocation::new("net", "net", vec!["session".into()], std::time::Duration::from_secs(10));
    ff_tools::run_bounded(&inv).succeeded()
}

#[cfg(not(any(unix, windows)))]
fn is_elevated() -> bool {
    false
}

/// Check the host against the supported OS list and the elevation policy.
///
/// Returns the warnings to surface when the run may proceed.
pub fn evaluate(env: &Environment, supported_os: &[String], policy: ElevationPolicy) -> Result<Vec<String>, FlowError> {
    if !supported_os.iter().any(|os| os.eq_ignore_ascii_case(&env.os)) {
        return Err(FlowError::Environment(format!(
            "unsupported operating system {:?} (supported: {})",
            env.os,
            supported_os.join(", ")
        )));
    }
    let mut warnings = Vec::new();
    if !env.elevated {
        match policy {
            ElevationPolicy::Strict => {
                return Err(FlowError::Environment(
                    "administrator/root privileges are required; re-run elevated or use --elevation permissive".into(),
                ))
            }
            ElevationPolicy::Permissive => {
                warnings.push("not running elevated; memory and disk capture will likely degrade".to_string())
            }
        }
    }
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ff_core::ErrorKind;

    fn supported() -> Vec<String> {
        vec!["windows".into(), "linux".into()]
    }

    #[test]
    fn strict_refuses_unelevated() {
        let env = Environment { os: "linux".into(), elevated: false };
        let err = evaluate(&env, &supported(), ElevationPolicy::Strict).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Environment);
    }

    #[test]
    fn permissive_only_warns() {
        let env = Environment { os: "Windows".into(), elevated: false };
        let warnings = evaluate(&env, &supported(), ElevationPolicy::Permissive).unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn unsupported_os_is_fatal_under_any_policy() {
        let env = Environment { os: "macos".into(), elevated: true };
        assert!(evaluate(&env, &supported(), ElevationPolicy::Permissive).is_err());
    }

    #[test]
    fn elevated_supported_host_is_clean() {
        let env = Environment { os: "linux".into(), elevated: true };
        assert!(evaluate(&env, &supported(), ElevationPolicy::Strict).unwrap().is_empty());
    }
}
