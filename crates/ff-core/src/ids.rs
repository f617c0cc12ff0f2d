use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn from_str(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(CaseId);
id_newtype!(InvocationId);

impl CaseId {
    /// Case ids are derived from the local start time, e.g. `Analysis_20240131_154500`.
    pub fn from_time(at: DateTime<Local>) -> Self {
        Self(format!("Analysis_{}", at.format("%Y%m%d_%H%M%S")))
    }

    pub fn now() -> Self {
        Self::from_time(Local::now())
    }
}

impl InvocationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}
