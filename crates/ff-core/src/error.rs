use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DigestPair;

/// Classification recorded in phase outcomes and shown to the operator.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Environment,
    ToolMissing,
    Timeout,
    IntegrityMismatch,
    Io,
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("environment check failed: {0}")]
    Environment(String),

    #[error("required tool not available: {tool}")]
    ToolMissing { tool: String },

    #[error("{tool} did not finish within {secs}s")]
    Timeout { tool: String, secs: u64 },

    #[error(
        "integrity mismatch for {artifact}: original md5={} sha256={}, copy md5={} sha256={}",
        original.md5, original.sha256, copy.md5, copy.sha256
    )]
    IntegrityMismatch { artifact: String, original: DigestPair, copy: DigestPair },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl FlowError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        FlowError::Io { context: context.into(), source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::Environment(_) => ErrorKind::Environment,
            FlowError::ToolMissing { .. } => ErrorKind::ToolMissing,
            FlowError::Timeout { .. } => ErrorKind::Timeout,
            FlowError::IntegrityMismatch { .. } => ErrorKind::IntegrityMismatch,
            FlowError::Io { .. } => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_message_names_both_pairs() {
        let err = FlowError::IntegrityMismatch {
            artifact: "disk_working_copy.dd".into(),
            original: DigestPair { md5: "a".into(), sha256: "b".into() },
            copy: DigestPair { md5: "c".into(), sha256: "d".into() },
        };
        let msg = err.to_string();
        assert!(msg.contains("disk_working_copy.dd"));
        assert!(msg.contains("md5=a") && msg.contains("md5=c"));
        assert_eq!(err.kind(), ErrorKind::IntegrityMismatch);
    }
}
