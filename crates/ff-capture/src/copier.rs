use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ff_tools::{run_bounded, Invocation, InvocationRecord, InvocationStatus, ResolvedTool};

/// One block-level read from a device into an image file.
#[derive(Clone, Debug)]
pub struct CopyRequest {
    pub device: String,
    pub output: PathBuf,
    /// dd-style size: `512`, `1024`, `1M`, `4M`.
    pub block_size: String,
    /// `None` copies to the end of the device.
    pub count: Option<u64>,
    pub conv: Option<String>,
    pub timeout: Duration,
}

impl CopyRequest {
    pub fn byte_limit(&self) -> Option<u64> {
        let bs = parse_block_size(&self.block_size)?;
        self.count.map(|c| c.saturating_mul(bs))
    }
}

/// The block-copy utility seam. Production uses [`DdCopier`].
pub trait BlockCopier: Send + Sync {
    fn name(&self) -> &str;
    fn copy(&self, req: &CopyRequest) -> InvocationRecord;
}

pub struct DdCopier {
    tool: ResolvedTool,
}

impl DdCopier {
    pub fn new(tool: ResolvedTool) -> Self {
        Self { tool }
    }

    pub fn args(req: &CopyRequest) -> Vec<String> {
        let mut args = vec![
            format!("if={}", req.device),
            format!("of={}", req.output.display()),
            format!("bs={}", req.block_size),
        ];
        if let Some(count) = req.count {
            args.push(format!("count={}", count));
        }
        if let Some(conv) = &req.conv {
            args.push(format!("conv={}", conv));
        }
        args
    }
}

impl BlockCopier for DdCopier {
    fn name(&self) -> &str {
        "dd"
    }

    fn copy(&self, req: &CopyRequest) -> InvocationRecord {
        run_bounded(&self.tool.invocation(Self::args(req), req.timeout))
    }
}

/// In-process bounded read of the device, opened read-only. Used as the per-region fallback.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeCopier;

impl BlockCopier for NativeCopier {
    fn name(&self) -> &str {
        "native-read"
    }

    fn copy(&self, req: &CopyRequest) -> InvocationRecord {
        let inv = Invocation::new(
            "native-read",
            &req.device,
            vec![format!("bytes={:?}", req.byte_limit())],
            req.timeout,
        );
        match read_region(Path::new(&req.device), &req.output, req.byte_limit()) {
            Ok(n) => {
                tracing::debug!("read {} bytes from {}", n, req.device);
                InvocationRecord::synthetic(&inv, InvocationStatus::Succeeded, Some(0), None)
            }
            Err(e) => InvocationRecord::synthetic(&inv, InvocationStatus::Failed, None, Some(e.to_string())),
        }
    }
}

/// Copy at most `limit` bytes (all of it when `None`) from `device` to a new file at `output`.
pub fn read_region(device: &Path, output: &Path, limit: Option<u64>) -> io::Result<u64> {
    let mut src = File::open(device)?;
    let mut out = File::create(output)?;
    match limit {
        Some(n) => io::copy(&mut src.take(n), &mut out),
        None => io::copy(&mut src, &mut out),
    }
}

pub fn parse_block_size(s: &str) -> Option<u64> {
    let s = s.trim();
    let (digits, mult) = match s.chars().last()? {
        'K' | 'k' => (&s[..s.len() - 1], 1u64 << 10),
        'M' => (&s[..s.len() - 1], 1 << 20),
        'G' => (&s[..s.len() - 1], 1 << 30),
        _ => (s, 1),
    };
    digits.parse::<u64>().ok().map(|n| n * mult)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn block_sizes() {
        assert_eq!(parse_block_size("512"), Some(512));
        assert_eq!(parse_block_size("1M"), Some(1 << 20));
        assert_eq!(parse_block_size("4M"), Some(4 << 20));
        assert_eq!(parse_block_size("x"), None);
    }

    #[test]
    fn dd_arguments() {
        let req = CopyRequest {
            device: "/dev/sda".into(),
            output: PathBuf::from("/tmp/out/disk_original.dd"),
            block_size: "4M".into(),
            count: None,
            conv: Some("noerror,sync".into()),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(
            DdCopier::args(&req),
            vec!["if=/dev/sda", "of=/tmp/out/disk_original.dd", "bs=4M", "conv=noerror,sync"]
        );
    }

    #[test]
    fn native_read_is_bounded() {
        let dir = tempdir().unwrap();
        let dev = dir.path().join("device.img");
        std::fs::write(&dev, vec![7u8; 4096]).unwrap();
        let req = CopyRequest {
            device: dev.display().to_string(),
            output: dir.path().join("mbr.bin"),
            block_size: "512".into(),
            count: Some(1),
            conv: None,
            timeout: Duration::from_secs(1),
        };
        let rec = NativeCopier.copy(&req);
        assert!(rec.succeeded());
        assert_eq!(std::fs::metadata(&req.output).unwrap().len(), 512);
    }
}
