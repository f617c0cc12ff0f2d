use serde::{Deserialize, Serialize};

use crate::InstallStrategy;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    MemoryImager,
    BlockCopy,
    Volatility,
    SleuthKit,
    FtkImager,
}

impl ToolId {
    pub const ALL: [ToolId; 5] = [
        ToolId::Volatility,
        ToolId::MemoryImager,
        ToolId::SleuthKit,
        ToolId::FtkImager,
        ToolId::BlockCopy,
    ];

    /// Short key used in config overrides and on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            ToolId::MemoryImager => "winpmem",
            ToolId::BlockCopy => "dd",
            ToolId::Volatility => "volatility",
            ToolId::SleuthKit => "tsk",
            ToolId::FtkImager => "ftk_imager",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        ToolId::ALL.into_iter().find(|t| t.key().eq_ignore_ascii_case(key))
    }

    pub fn spec(&self) -> &'static ToolSpec {
        // CATALOG is indexed in ALL order
        let i = ToolId::ALL.iter().position(|t| t == self).unwrap_or(0);
        &CATALOG[i]
    }
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolSpec {
    pub id: ToolId,
    pub display_name: &'static str,
    /// Location of the entry point under the tools root.
    pub relative_path: &'static str,
    /// Names tried on `PATH` when the tools root has nothing.
    pub path_names: &'static [&'static str],
    pub strategy: InstallStrategy,
}

pub static CATALOG: [ToolSpec; 5] = [
    ToolSpec {
        id: ToolId::Volatility,
        display_name: "Volatility 3",
        relative_path: "volatility3/vol.py",
        path_names: &["vol", "vol.py", "volatility3"],
        strategy: InstallStrategy::SourceFetch {
            repository: "https://github.com/volatilityfoundation/volatility3.git",
            checkout: "volatility3",
        },
    },
    ToolSpec {
        id: ToolId::MemoryImager,
        display_name: "WinPmem",
        relative_path: "winpmem/winpmem.exe",
        path_names: &["winpmem", "winpmem_mini_x64"],
        strategy: InstallStrategy::DirectDownload {
            url: "https://github.com/Velocidex/WinPmem/releases/download/v4.0.rc1/winpmem_mini_x64_rc2.exe",
        },
    },
    ToolSpec {
        id: ToolId::SleuthKit,
        display_name: "The Sleuth Kit",
        relative_path: "tsk/bin/sleuthkit-4.12.1-win32/bin/fls.exe",
        path_names: &["fls"],
        strategy: InstallStrategy::ArchiveDownload {
            url: "https://github.com/sleuthkit/sleuthkit/releases/download/sleuthkit-4.12.1/sleuthkit-4.12.1-win32.zip",
            extract_to: "tsk/bin",
        },
    },
    ToolSpec {
        id: ToolId::FtkImager,
        display_name: "FTK Imager",
        relative_path: "ftk_imager/FTK Imager.exe",
        path_names: &["ftkimager"],
        strategy: InstallStrategy::Manual {
            instructions: "download FTK Imager from https://www.exterro.com/ftk-imager and install it under the tools folder",
        },
    },
    ToolSpec {
        id: ToolId::BlockCopy,
        display_name: "DD for Windows",
        relative_path: "dd/dd.exe",
        path_names: &["dd"],
        strategy: InstallStrategy::ArchiveDownload {
            url: "http://www.chrysocome.net/downloads/dd-0.6beta3.zip",
            extract_to: "dd",
        },
    },
];

pub fn catalog() -> &'static [ToolSpec] {
    &CATALOG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_table_matches_ids() {
        for id in ToolId::ALL {
            assert_eq!(id.spec().id, id);
        }
        assert_eq!(catalog().len(), ToolId::ALL.len());
    }

    #[test]
    fn keys_round_trip() {
        assert_eq!(ToolId::parse("DD"), Some(ToolId::BlockCopy));
        assert_eq!(ToolId::parse("tsk"), Some(ToolId::SleuthKit));
        assert_eq!(ToolId::parse("autopsy"), None);
    }

    #[test]
    fn ftk_is_manual_only() {
        assert!(matches!(ToolId::FtkImager.spec().strategy, InstallStrategy::Manual { .. }));
    }
}
