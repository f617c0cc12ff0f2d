use std::io;
use std::path::Path;
use std::time::Duration;

use chrono::Local;
use ff_core::{ArtifactKind, CaptureArtifact, CustodyRecord, DigestPair, FlowError, Journal, NamedDigest};
use ff_digest::digest_file;
use ff_evidence::Recorder;
use ff_tools::InvocationStatus;

use crate::{BlockCopier, CaptureExecutor, CopyRequest};

pub const ORIGINAL_IMAGE: &str = "disk_original.dd";
pub const WORKING_COPY: &str = "disk_working_copy.dd";
pub const FULL_IMAGE_TIMEOUT: Duration = Duration::from_secs(10 * 60 * 60);

pub type Duplicator = Box<dyn Fn(&Path, &Path) -> io::Result<()> + Send + Sync>;
pub type Protector = Box<dyn Fn(&Path) -> io::Result<()> + Send + Sync>;

/// Result of a verified full-disk capture.
#[derive(Clone, Debug)]
pub struct CompleteCapture {
    pub original: CaptureArtifact,
    pub working_copy: CaptureArtifact,
    pub custody: CustodyRecord,
}

/// Capture, digest, protect, duplicate, verify. All five steps or a hard error.
pub struct IntegrityProtocol {
    duplicate: Duplicator,
    protect: Protector,
    pub capture_timeout: Duration,
}

impl Default for IntegrityProtocol {
    fn default() -> Self {
        Self::with_duplicator(|from, to| std::fs::copy(from, to).map(|_| ()))
    }
}

impl IntegrityProtocol {
    pub fn with_duplicator(f: impl Fn(&Path, &Path) -> io::Result<()> + Send + Sync + 'static) -> Self {
        Self { duplicate: Box::new(f), protect: Box::new(protect_read_only), capture_timeout: FULL_IMAGE_TIMEOUT }
    }

    pub fn with_protector(mut self, f: impl Fn(&Path) -> io::Result<()> + Send + Sync + 'static) -> Self {
        self.protect = Box::new(f);
        self
    }

    pub fn run(
        &self,
        exec: &CaptureExecutor,
        copier: &dyn BlockCopier,
        device: &str,
        recorder: &dyn Recorder,
        journal: &dyn Journal,
    ) -> Result<CompleteCapture, FlowError> {
        let disk_dir = recorder.layout().disk_images();
        let original = disk_dir.join(ORIGINAL_IMAGE);
        let working = disk_dir.join(WORKING_COPY);

        journal.phase("STEP 1/5: capturing original disk image");
        journal.warn("a full image can take several hours");
        let req = CopyRequest {
            device: device.to_string(),
            output: original.clone(),
            block_size: "4M".into(),
            count: None,
            conv: Some("noerror,sync".into()),
            timeout: self.capture_timeout,
        };
        let rec = copier.copy(&req);
        exec.note(rec.clone());
        match rec.status {
            InvocationStatus::TimedOut => {
                return Err(FlowError::Timeout { tool: copier.name().to_string(), secs: self.capture_timeout.as_secs() })
            }
            InvocationStatus::NotFound if !original.exists() => {
                return Err(FlowError::ToolMissing { tool: copier.name().to_string() })
            }
            _ => {}
        }
        if !original.is_file() {
            return Err(FlowError::io(
                format!("{} produced no image", copier.name()),
                io::Error::new(io::ErrorKind::NotFound, ORIGINAL_IMAGE),
            ));
        }
        if !rec.succeeded() {
            // noerror,sync keeps going over bad sectors; the image is still usable
            journal.warn(&format!("{}; continuing with the image it wrote", rec.summary()));
        }
        let size = std::fs::metadata(&original).map(|m| m.len()).unwrap_or(0);
        journal.success(&format!("original image captured ({:.2} GB)", size as f64 / (1u64 << 30) as f64));

        journal.phase("STEP 2/5: digesting original image");
        let original_digests = digest_file(&original).map_err(|e| FlowError::io("digest original image", e))?;
        journal.success(&format!("MD5:    {}", original_digests.md5));
        journal.success(&format!("SHA256: {}", original_digests.sha256));

        journal.phase("STEP 3/5: protecting original image (read-only)");
        let protected = match (self.protect)(&original) {
            Ok(()) => {
                journal.success("original image is write-protected");
                true
            }
            Err(e) => {
                journal.warn(&format!("could not protect original image: {}", e));
                false
            }
        };

        journal.phase("STEP 4/5: creating working copy");
        (self.duplicate)(&original, &working).map_err(|e| FlowError::io("create working copy", e))?;
        if !working.is_file() {
            return Err(FlowError::io(
                "create working copy",
                io::Error::new(io::ErrorKind::NotFound, WORKING_COPY),
            ));
        }
        journal.success("working copy created");

        journal.phase("STEP 5/5: verifying working copy");
        let copy_digests = digest_file(&working).map_err(|e| FlowError::io("digest working copy", e))?;
        let verified = copy_digests == original_digests;
        let custody = CustodyRecord {
            captured_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            device: device.to_string(),
            tool: copier.name().to_string(),
            original: NamedDigest { file: ORIGINAL_IMAGE.into(), digests: original_digests.clone() },
            working_copy: NamedDigest { file: WORKING_COPY.into(), digests: copy_digests.clone() },
            original_protected: protected,
            verified,
        };
        if let Err(e) = recorder.write_custody(&custody) {
            journal.warn(&format!("could not write chain of custody: {:#}", e));
        }

        if !verified {
            journal.error("digests do NOT match, the working copy is corrupt");
            return Err(FlowError::IntegrityMismatch {
                artifact: WORKING_COPY.into(),
                original: original_digests,
                copy: copy_digests,
            });
        }
        journal.success("verification passed: working copy is identical to the original");

        let original = CaptureArtifact::from_file(&original, ArtifactKind::FullDiskImage)
            .map_err(|e| FlowError::io("stat original image", e))?;
        let working_copy = CaptureArtifact::from_file(&working, ArtifactKind::FullDiskImage)
            .map_err(|e| FlowError::io("stat working copy", e))?;
        journal.success(&format!("original protected: {}, working copy ready: {}", original.name, working_copy.name));
        journal.success("chain of custody documented");
        Ok(CompleteCapture { original, working_copy, custody })
    }
}

pub fn protect_read_only(path: &Path) -> io::Result<()> {
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_readonly(true);
    std::fs::set_permissions(path, perms)
}

/// Digest `copy` and compare it with the digests taken from the original.
pub fn verify_copy(original: &DigestPair, copy: &Path) -> Result<DigestPair, FlowError> {
    let copy_digests = digest_file(copy).map_err(|e| FlowError::io(format!("digest {}", copy.display()), e))?;
    if &copy_digests == original {
        Ok(copy_digests)
    } else {
        Err(FlowError::IntegrityMismatch {
            artifact: copy.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default(),
            original: original.clone(),
            copy: copy_digests,
        })
    }
}

impl CaptureExecutor {
    /// Full forensic image with verified working copy. A missing block-copy tool is fatal here.
    pub fn capture_disk_complete(
        &self,
        device: &str,
        recorder: &dyn Recorder,
        journal: &dyn Journal,
    ) -> Result<CompleteCapture, FlowError> {
        journal.phase("COMPLETE FORENSIC DISK CAPTURE");
        journal.info(&format!("target device: {}", device));
        let Some(copier) = self.copier.as_deref() else {
            journal.error("block-copy tool not found; complete capture requires it");
            return Err(FlowError::ToolMissing { tool: "dd".into() });
        };
        self.integrity.run(self, copier, device, recorder, journal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NativeCopier;
    use ff_core::{CaseId, ErrorKind, LogLevel, MemoryJournal, Protection};
    use ff_tools::{Invocation, InvocationRecord};
    use ff_evidence::{EvidenceLayout, FsRecorder};
    use tempfile::tempdir;

    fn setup(root: &Path) -> (FsRecorder, String) {
        let dev = root.join("device.img");
        let data: Vec<u8> = (0..300_000u32).map(|i| (i % 253) as u8).collect();
        std::fs::write(&dev, data).unwrap();
        let layout = EvidenceLayout::create(&root.join("evidence"), &CaseId::from_str("Analysis_t")).unwrap();
        (FsRecorder::new(layout), dev.display().to_string())
    }

    #[test]
    fn verified_copy_produces_custody() {
        let dir = tempdir().unwrap();
        let (rec, dev) = setup(dir.path());
        let exec = CaptureExecutor::new(None, Some(Box::new(NativeCopier)));
        let done = exec.capture_disk_complete(&dev, &rec, &MemoryJournal::new()).unwrap();
        assert!(done.custody.verified);
        assert_eq!(done.custody.original.digests, done.custody.working_copy.digests);
        assert_eq!(done.original.protection, Protection::ReadOnly);
        let custody = std::fs::read_to_string(rec.layout().custody_file()).unwrap();
        assert!(custody.contains("VERIFIED"));
    }

    #[test]
    fn corrupted_copy_is_a_mismatch_with_custody_kept() {
        let dir = tempdir().unwrap();
        let (rec, dev) = setup(dir.path());
        let protocol = IntegrityProtocol::with_duplicator(|from, to| {
            let mut bytes = std::fs::read(from)?;
            bytes[0] ^= 0xff;
            std::fs::write(to, bytes)
        });
        let exec = CaptureExecutor::new(None, Some(Box::new(NativeCopier))).with_integrity(protocol);
        let err = exec.capture_disk_complete(&dev, &rec, &MemoryJournal::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IntegrityMismatch);
        let custody = std::fs::read_to_string(rec.layout().custody_file()).unwrap();
        assert!(custody.contains("MISMATCH"));
    }

    #[test]
    fn unprotectable_original_still_verifies() {
        let dir = tempdir().unwrap();
        let (rec, dev) = setup(dir.path());
        let protocol = IntegrityProtocol::default()
            .with_protector(|_| Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only not supported")));
        let exec = CaptureExecutor::new(None, Some(Box::new(NativeCopier))).with_integrity(protocol);
        let journal = MemoryJournal::new();
        let done = exec.capture_disk_complete(&dev, &rec, &journal).unwrap();
        assert!(done.custody.verified);
        assert!(!done.custody.original_protected);
        assert!(journal.contains(LogLevel::Warning, "could not protect original image"));
    }

    struct StalledCopier;

    impl BlockCopier for StalledCopier {
        fn name(&self) -> &str {
            "dd"
        }

        fn copy(&self, req: &CopyRequest) -> InvocationRecord {
            let inv = Invocation::new("dd", "dd", vec![], req.timeout);
            InvocationRecord::synthetic(&inv, InvocationStatus::TimedOut, None, None)
        }
    }

    #[test]
    fn capture_timeout_is_a_hard_timeout() {
        let dir = tempdir().unwrap();
        let (rec, dev) = setup(dir.path());
        let mut protocol = IntegrityProtocol::default();
        protocol.capture_timeout = Duration::from_secs(30);
        let exec = CaptureExecutor::new(None, Some(Box::new(StalledCopier))).with_integrity(protocol);
        let err = exec.capture_disk_complete(&dev, &rec, &MemoryJournal::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(matches!(err, FlowError::Timeout { ref tool, secs: 30 } if tool == "dd"));
        assert!(!rec.layout().custody_file().exists());
        assert_eq!(exec.take_invocations()[0].status, InvocationStatus::TimedOut);
    }

    #[test]
    fn truncated_copy_fails_verification() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("a.dd");
        let copy = dir.path().join("b.dd");
        std::fs::write(&original, vec![1u8; 2048]).unwrap();
        std::fs::write(&copy, vec![1u8; 2047]).unwrap();
        let digests = digest_file(&original).unwrap();
        assert!(matches!(verify_copy(&digests, &copy), Err(FlowError::IntegrityMismatch { .. })));
        std::fs::write(&copy, vec![1u8; 2048]).unwrap();
        assert_eq!(verify_copy(&digests, &copy).unwrap(), digests);
    }

    #[test]
    fn missing_copier_is_tool_missing() {
        let dir = tempdir().unwrap();
        let (rec, dev) = setup(dir.path());
        let exec = CaptureExecutor::new(None, None);
        let err = exec.capture_disk_complete(&dev, &rec, &MemoryJournal::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ToolMissing);
    }

    #[test]
    fn unreadable_device_leaves_no_image() {
        let dir = tempdir().unwrap();
        let (rec, _) = setup(dir.path());
        let exec = CaptureExecutor::new(None, Some(Box::new(NativeCopier)));
        let missing = dir.path().join("no-such-device").display().to_string();
        let err = exec.capture_disk_complete(&missing, &rec, &MemoryJournal::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
