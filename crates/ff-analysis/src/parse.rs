use serde::{Deserialize, Serialize};

const MAX_PROCESSES: usize = 50;
const MAX_CONNECTIONS: usize = 30;
const MAX_CMDLINES: usize = 20;
const CMDLINE_WIDTH: usize = 200;
const PREVIEW_LINES: usize = 30;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessEntry {
    pub name: String,
    pub pid: String,
}

/// Key facts pulled out of one module's text output.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ModuleSummary {
    Processes { processes: Vec<ProcessEntry>, total_count: usize },
    Connections { connections: Vec<String>, total_count: usize },
    CommandLines { cmdlines: Vec<String> },
    Preview { output_preview: Vec<String>, line_count: usize },
}

impl ModuleSummary {
    pub fn headline(&self) -> String {
        match self {
            ModuleSummary::Processes { total_count, .. } => format!("{} processes", total_count),
            ModuleSummary::Connections { total_count, .. } => format!("{} connections", total_count),
            ModuleSummary::CommandLines { cmdlines } => format!("{} command lines", cmdlines.len()),
            ModuleSummary::Preview { line_count, .. } => format!("{} lines", line_count),
        }
    }
}

/// Parse module output. The first two lines of table output are headers.
pub fn parse_module_output(module: &str, output: &str) -> ModuleSummary {
    let lines: Vec<&str> = output.trim().split('\n').collect();
    match module {
        "pslist" => {
            let processes: Vec<ProcessEntry> = lines
                .iter()
                .skip(2)
                .filter(|l| !l.trim().is_empty() && !l.starts_with('*'))
                .filter_map(|l| {
                    let parts: Vec<&str> = l.split_whitespace().collect();
                    if parts.len() < 2 {
                        return None;
                    }
                    let pid = if parts[0].chars().all(|c| c.is_ascii_digit()) { parts[0] } else { "?" };
                    Some(ProcessEntry { name: parts[1].to_string(), pid: pid.to_string() })
                })
                .collect();
            let total_count = processes.len();
            ModuleSummary::Processes { processes: processes.into_iter().take(MAX_PROCESSES).collect(), total_count }
        }
        "netscan" => {
            let connections: Vec<String> = lines
                .iter()
                .filter(|l| l.contains("TCP") || l.contains("UDP"))
                .map(|l| l.trim().to_string())
                .collect();
            let total_count = connections.len();
            ModuleSummary::Connections { connections: connections.into_iter().take(MAX_CONNECTIONS).collect(), total_count }
        }
        "cmdline" => ModuleSummary::CommandLines {
            cmdlines: lines
                .iter()
                .skip(2)
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .map(|l| l.chars().take(CMDLINE_WIDTH).collect())
                .take(MAX_CMDLINES)
                .collect(),
        },
        _ => ModuleSummary::Preview {
            output_preview: lines.iter().take(PREVIEW_LINES).map(|l| l.to_string()).collect(),
            line_count: lines.len(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pslist_skips_headers_and_star_rows() {
        let out = "Volatility 3 Framework 2.5.0\nPID\tImageFileName\n4\tSystem\n*\tghost\n88\tsmss.exe\nx1\tweird.exe\n";
        match parse_module_output("pslist", out) {
            ModuleSummary::Processes { processes, total_count } => {
                assert_eq!(total_count, 3);
                assert_eq!(processes[0], ProcessEntry { name: "System".into(), pid: "4".into() });
                assert_eq!(processes[2].pid, "?");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn pslist_caps_entries_but_counts_all() {
        let mut out = String::from("banner\nheader\n");
        for i in 0..75 {
            out.push_str(&format!("{} proc{}.exe\n", i, i));
        }
        match parse_module_output("pslist", &out) {
            ModuleSummary::Processes { processes, total_count } => {
                assert_eq!(processes.len(), 50);
                assert_eq!(total_count, 75);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn netscan_keeps_tcp_and_udp_lines() {
        let out = "Proto Local Foreign\nTCP 1.1.1.1:1 2.2.2.2:2 ESTABLISHED\nUDPv4 0.0.0.0:53 *:*\nnoise\n";
        let s = parse_module_output("netscan", out);
        assert_eq!(s.headline(), "2 connections");
    }

    #[test]
    fn cmdline_truncates_long_lines() {
        let long = "a".repeat(500);
        let out = format!("banner\nheader\n{}\n", long);
        match parse_module_output("cmdline", &out) {
            ModuleSummary::CommandLines { cmdlines } => assert_eq!(cmdlines[0].len(), 200),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn other_modules_get_a_preview() {
        let out: String = (0..40).map(|i| format!("line {}\n", i)).collect();
        match parse_module_output("filescan", &out) {
            ModuleSummary::Preview { output_preview, line_count } => {
                assert_eq!(output_preview.len(), 30);
                assert_eq!(line_count, 40);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
