use std::path::{Path, PathBuf};
use std::time::Duration;

use ff_capture::{ORIGINAL_IMAGE, WORKING_COPY};
use ff_core::Journal;
use ff_tools::{run_bounded, Invocation, InvocationRecord, InvocationStatus, ResolvedTool};

use crate::module_file_text;

pub const TSK_TIMEOUT: Duration = Duration::from_secs(300);
const MIN_IMAGE_BYTES: u64 = 1024 * 1024;
const IMAGE_EXTENSIONS: [&str; 4] = ["dd", "img", "E01", "bin"];

/// Images eligible for file-system analysis. The protected original is never an operand.
pub fn find_disk_images(disk_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(disk_dir) else {
        return Vec::new();
    };
    let mut images: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            let ext_ok = p.extension().and_then(|e| e.to_str()).map(|e| IMAGE_EXTENSIONS.contains(&e)).unwrap_or(false);
            let name_ok = p.file_name().map(|n| n != ORIGINAL_IMAGE).unwrap_or(false);
            let big = std::fs::metadata(p).map(|m| m.is_file() && m.len() > MIN_IMAGE_BYTES).unwrap_or(false);
            ext_ok && name_ok && big
        })
        .collect();
    images.sort();
    images
}

pub struct TskRunner {
    /// Resolved `fls`; `mmls` is looked up beside it.
    pub fls: Option<ResolvedTool>,
    pub timeout: Duration,
}

impl TskRunner {
    pub fn new(fls: Option<ResolvedTool>) -> Self {
        Self { fls, timeout: TSK_TIMEOUT }
    }

    /// `mmls` on every eligible image and `fls -r` on the working copy. Never fatal.
    pub fn analyze(&self, disk_dir: &Path, out_dir: &Path, journal: &dyn Journal) -> (Vec<PathBuf>, Vec<InvocationRecord>) {
        journal.phase("CHECKING DISK IMAGES FOR TSK ANALYSIS");
        let images = find_disk_images(disk_dir);
        if images.is_empty() {
            journal.info("no full disk images for TSK (needs .dd, .img or .E01 from complete mode)");
            let selective = std::fs::read_dir(disk_dir)
                .map(|rd| {
                    rd.filter_map(|e| e.ok())
                        .filter(|e| e.path().extension().map(|x| x == "bin").unwrap_or(false))
                        .count()
                })
                .unwrap_or(0);
            if selective > 0 {
                journal.info(&format!("{} selective captures are available for manual analysis", selective));
            }
            return (Vec::new(), Vec::new());
        }
        journal.success(&format!("{} image(s) found for TSK analysis", images.len()));

        let Some(fls) = &self.fls else {
            journal.warn("The Sleuth Kit not found; install it for disk analysis");
            journal.info(&format!("images available in {}", disk_dir.display()));
            return (Vec::new(), Vec::new());
        };
        let mmls = fls.sibling("mmls");

        let mut outputs = Vec::new();
        let mut records = Vec::new();
        for image in &images {
            let name = image.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            journal.info(&format!("analyzing image: {}", name));

            match &mmls {
                Some(mmls) => {
                    let inv = Invocation::new("mmls", mmls, vec![image.display().to_string()], self.timeout);
                    let out = out_dir.join(format!("mmls_{}.txt", name));
                    records.push(self.run_to_file(&inv, &out, journal, &mut outputs));
                }
                None => journal.warn("mmls not found next to fls"),
            }

            if name.contains(WORKING_COPY.trim_end_matches(".dd")) {
                let inv = fls.invocation(vec!["-r".into(), image.display().to_string()], self.timeout);
                let out = out_dir.join(format!("fls_{}.txt", name));
                records.push(self.run_to_file(&inv, &out, journal, &mut outputs));
            } else {
                journal.info("skipping fls on this image (only the working copy is listed)");
            }
        }
        journal.success("TSK analysis finished");
        (outputs, records)
    }

    fn run_to_file(&self, inv: &Invocation, out: &Path, journal: &dyn Journal, outputs: &mut Vec<PathBuf>) -> InvocationRecord {
        let rec = run_bounded(inv);
        match rec.status {
            InvocationStatus::Succeeded | InvocationStatus::Failed => {
                match std::fs::write(out, module_file_text(&rec.stdout, &rec.stderr)) {
                    Ok(()) => {
                        journal.info(&format!("  {}: {} lines", inv.tool, rec.stdout_lines));
                        outputs.push(out.to_path_buf());
                    }
                    Err(e) => journal.warn(&format!("  write {}: {}", out.display(), e)),
                }
            }
            _ => journal.warn(&format!("  {}", rec.summary())),
        }
        rec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ff_core::{LogLevel, MemoryJournal};
    use tempfile::tempdir;

    fn sized(dir: &Path, name: &str, len: usize) {
        std::fs::write(dir.join(name), vec![0u8; len]).unwrap();
    }

    #[test]
    fn original_and_small_files_are_not_operands() {
        let dir = tempdir().unwrap();
        let big = 2 * 1024 * 1024;
        sized(dir.path(), "disk_original.dd", big);
        sized(dir.path(), "disk_working_copy.dd", big);
        sized(dir.path(), "mbr.bin", 512);
        sized(dir.path(), "notes.txt", big);
        let images = find_disk_images(dir.path());
        assert_eq!(images, vec![dir.path().join("disk_working_copy.dd")]);
    }

    #[test]
    fn selective_only_is_reported() {
        let dir = tempdir().unwrap();
        sized(dir.path(), "mbr.bin", 512);
        let journal = MemoryJournal::new();
        let (outputs, records) = TskRunner::new(None).analyze(dir.path(), dir.path(), &journal);
        assert!(outputs.is_empty() && records.is_empty());
        assert!(journal.contains(LogLevel::Info, "1 selective captures"));
    }

    #[cfg(unix)]
    #[test]
    fn fls_runs_only_on_working_copy() {
        use ff_tools::ToolId;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        for tool in ["fls", "mmls"] {
            let p = bin.join(tool);
            std::fs::write(&p, "#!/bin/sh\necho \"$@\"\n").unwrap();
            std::fs::set_permissions(&p, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let images = dir.path().join("images");
        std::fs::create_dir(&images).unwrap();
        sized(&images, "disk_working_copy.dd", 2 * 1024 * 1024);
        sized(&images, "extra.img", 2 * 1024 * 1024);
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();

        let runner = TskRunner::new(Some(ResolvedTool::new(ToolId::SleuthKit, bin.join("fls"))));
        let (outputs, records) = runner.analyze(&images, &out, &MemoryJournal::new());
        assert_eq!(records.len(), 3);
        assert_eq!(outputs.len(), 3);
        assert!(out.join("fls_disk_working_copy.dd.txt").is_file());
        assert!(!out.join("fls_extra.img.txt").exists());
    }
}
