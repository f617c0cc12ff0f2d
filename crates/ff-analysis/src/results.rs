use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ModuleSummary;

/// `analysis_results.json`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalysisResults {
    /// True when the module outputs were generated instead of produced by Volatility.
    pub simulated: bool,
    pub modules: BTreeMap<String, ModuleSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tsk_outputs: Vec<PathBuf>,
}

impl AnalysisResults {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}
