use std::path::Path;
use std::time::Duration;

use ff_core::{ArtifactKind, CaptureArtifact, DegradeReason, Degraded, DigestEntry, Journal, StepHealth};
use ff_digest::digest_or_error;
use ff_evidence::Recorder;
use ff_tools::{Invocation, InvocationStatus};

use crate::{BlockCopier, CaptureExecutor, CopyRequest, NativeCopier, NATIVE_COMMAND_TIMEOUT};

pub const DISK_INFO: &str = "disk_info.txt";

/// A fixed leading slice of the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub file: &'static str,
    pub label: &'static str,
    pub block_size: &'static str,
    pub count: u64,
    pub bytes: u64,
    pub timeout: Duration,
}

pub const SELECTIVE_REGIONS: [Region; 3] = [
    Region {
        file: "mbr.bin",
        label: "master boot record",
        block_size: "512",
        count: 1,
        bytes: 512,
        timeout: Duration::from_secs(60),
    },
    Region {
        file: "partition_table.bin",
        label: "partition table",
        block_size: "1024",
        count: 64,
        bytes: 64 * 1024,
        timeout: Duration::from_secs(60),
    },
    Region {
        file: "boot_sector.bin",
        label: "boot sector and MFT area",
        block_size: "1M",
        count: 100,
        bytes: 100 * 1024 * 1024,
        timeout: Duration::from_secs(600),
    },
];

#[derive(Clone, Debug)]
pub struct RegionCapture {
    pub region: Region,
    pub result: Result<CaptureArtifact, Degraded>,
}

/// Outcome of selective mode: either per-region images or, without a block-copy tool, the
/// native disk listing.
#[derive(Clone, Debug)]
pub enum SelectiveCapture {
    Regions { regions: Vec<RegionCapture>, digests: Vec<DigestEntry> },
    InfoOnly(Result<CaptureArtifact, Degraded>),
}

impl SelectiveCapture {
    pub fn health(&self) -> StepHealth {
        match self {
            SelectiveCapture::Regions { regions, .. } => {
                if regions.iter().all(|r| r.result.is_ok()) {
                    StepHealth::Ok
                } else if regions.iter().any(|r| ff_core::produced_artifact(&r.result).is_some()) {
                    StepHealth::Degraded
                } else {
                    StepHealth::Failed
                }
            }
            SelectiveCapture::InfoOnly(r) if ff_core::produced_artifact(r).is_some() => StepHealth::Degraded,
            SelectiveCapture::InfoOnly(_) => StepHealth::Failed,
        }
    }

    pub fn artifacts(&self) -> Vec<CaptureArtifact> {
        match self {
            SelectiveCapture::Regions { regions, .. } => {
                regions.iter().filter_map(|r| ff_core::produced_artifact(&r.result).cloned()).collect()
            }
            SelectiveCapture::InfoOnly(r) => ff_core::produced_artifact(r).into_iter().cloned().collect(),
        }
    }
}

fn disk_listing_commands() -> &'static [(&'static str, &'static str)] {
    if cfg!(windows) {
        &[
            ("wmic diskdrive get caption,size,status", "Physical disks"),
            ("wmic partition get name,size,type", "Partitions"),
            ("wmic logicaldisk get caption,description,filesystem,size,freespace", "Logical disks"),
        ]
    } else {
        &[
            ("lsblk -o NAME,SIZE,TYPE,FSTYPE,MOUNTPOINT", "Block devices"),
            ("cat /proc/partitions", "Partitions"),
            ("df -h", "Mounted filesystems"),
        ]
    }
}

impl CaptureExecutor {
    /// Best-effort capture of the three critical regions, then `disk_hashes.txt` over whatever exists.
    pub fn capture_disk_selective(&self, device: &str, recorder: &dyn Recorder, journal: &dyn Journal) -> SelectiveCapture {
        journal.phase("SELECTIVE DISK CAPTURE - CRITICAL AREAS");
        journal.info(&format!("target device: {}", device));
        let disk_dir = recorder.layout().disk_images();

        let Some(copier) = self.copier.as_deref() else {
            journal.warn("block-copy tool not found; recording disk information without an image");
            return SelectiveCapture::InfoOnly(self.capture_disk_info(&disk_dir, journal));
        };

        let total = SELECTIVE_REGIONS.len() + 1;
        let mut regions = Vec::with_capacity(SELECTIVE_REGIONS.len());
        for (i, region) in SELECTIVE_REGIONS.iter().enumerate() {
            journal.info(&format!("{}/{} capturing {}", i + 1, total, region.label));
            let result = self.capture_region(copier, device, &disk_dir, region, journal);
            regions.push(RegionCapture { region: *region, result });
        }

        journal.info(&format!("{}/{} digesting captured regions", total, total));
        let digests: Vec<DigestEntry> = SELECTIVE_REGIONS
            .iter()
            .map(|r| disk_dir.join(r.file))
            .filter(|p| p.is_file())
            .map(|p| DigestEntry {
                name: p.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default(),
                digests: digest_or_error(&p),
            })
            .collect();
        let table = recorder.layout().disk_hashes_file();
        if let Err(e) = recorder.write_digest_table(&table, "DISK INTEGRITY HASHES - SELECTIVE CAPTURE", &digests) {
            journal.warn(&format!("could not write disk digests: {:#}", e));
        }
        journal.success(&format!("selective capture finished, images in {}", disk_dir.display()));
        SelectiveCapture::Regions { regions, digests }
    }

    fn capture_region(
        &self,
        copier: &dyn BlockCopier,
        device: &str,
        disk_dir: &Path,
        region: &Region,
        journal: &dyn Journal,
    ) -> Result<CaptureArtifact, Degraded> {
        let output = disk_dir.join(region.file);
        let req = CopyRequest {
            device: device.to_string(),
            output: output.clone(),
            block_size: region.block_size.to_string(),
            count: Some(region.count),
            conv: None,
            timeout: region.timeout,
        };
        let rec = copier.copy(&req);
        self.note(rec.clone());
        if rec.succeeded() && output.is_file() {
            if let Ok(a) = CaptureArtifact::from_file(&output, ArtifactKind::DiskRegion) {
                journal.success(&format!("{} captured ({} bytes)", region.label, a.size_bytes));
                return Ok(a);
            }
        }

        let reason = match rec.status {
            InvocationStatus::TimedOut => {
                DegradeReason::Timeout { tool: copier.name().to_string(), secs: region.timeout.as_secs() }
            }
            InvocationStatus::NotFound => DegradeReason::ToolMissing { tool: copier.name().to_string() },
            InvocationStatus::Succeeded => DegradeReason::NoOutput { tool: copier.name().to_string() },
            _ => DegradeReason::ToolFailed { tool: copier.name().to_string(), detail: rec.summary() },
        };
        journal.warn(&format!("{} not captured ({}), trying a direct read", region.label, reason));

        let fallback = NativeCopier.copy(&req);
        self.note(fallback.clone());
        let artifact = if fallback.succeeded() {
            CaptureArtifact::from_file(&output, ArtifactKind::DiskRegion).map_err(|e| e.to_string())
        } else {
            Err(fallback.error.clone().unwrap_or_else(|| fallback.summary()))
        };
        match artifact {
            Ok(artifact) => {
                journal.warn(&format!("{} read directly ({} bytes)", region.label, artifact.size_bytes));
                Err(Degraded::Fallback { artifact, reason })
            }
            Err(fallback_error) => {
                journal.warn(&format!("{} unavailable: {}", region.label, fallback_error));
                // a failed read may leave an empty file behind
                if output.is_file() {
                    let _ = std::fs::remove_file(&output);
                }
                Err(Degraded::Unavailable { reason, fallback_error })
            }
        }
    }

    /// `disk_info.txt` from the platform's disk and partition listings.
    pub fn capture_disk_info(&self, disk_dir: &Path, journal: &dyn Journal) -> Result<CaptureArtifact, Degraded> {
        journal.info("capturing disk information with native commands");
        let mut text = String::from("DISK AND PARTITION INFORMATION\n");
        text.push_str(&"=".repeat(60));
        text.push_str("\n\n");
        for (cmd, description) in disk_listing_commands() {
            let rec = self.run(&Invocation::shell("disk-info", cmd, NATIVE_COMMAND_TIMEOUT));
            text.push_str(&format!("\n{}:\n", description));
            text.push_str(&"-".repeat(60));
            text.push('\n');
            text.push_str(&rec.stdout);
            text.push('\n');
            if !rec.succeeded() {
                journal.warn(&format!("{}: {}", description, rec.summary()));
            }
        }
        let path = disk_dir.join(DISK_INFO);
        let reason = DegradeReason::ToolMissing { tool: "dd".into() };
        match std::fs::write(&path, text).and_then(|_| CaptureArtifact::from_file(&path, ArtifactKind::SystemInfo)) {
            Ok(artifact) => {
                journal.success("disk information captured");
                Err(Degraded::Fallback { artifact, reason })
            }
            Err(e) => {
                journal.error(&format!("could not write {}: {}", DISK_INFO, e));
                Err(Degraded::Unavailable { reason, fallback_error: e.to_string() })
            }
        }
    }
}
