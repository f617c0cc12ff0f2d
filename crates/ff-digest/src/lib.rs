//! Streaming MD5 + SHA-256 digests over evidence files.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use ff_core::DigestPair;
use md5::Md5;
use sha2::{Digest, Sha256};

pub const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Md5,
    Sha256,
}

/// Feed `reader` to `sink` in `CHUNK_SIZE` slices until EOF.
fn for_each_chunk(mut reader: impl Read, mut sink: impl FnMut(&[u8])) -> io::Result<()> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => sink(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Both digests in one read pass.
pub fn digest_reader(reader: impl Read) -> io::Result<DigestPair> {
    let mut md5 = Md5::new();
    let mut sha256 = Sha256::new();
    for_each_chunk(reader, |chunk| {
        md5.update(chunk);
        sha256.update(chunk);
    })?;
    Ok(DigestPair { md5: hex::encode(md5.finalize()), sha256: hex::encode(sha256.finalize()) })
}

pub fn digest_file(path: &Path) -> io::Result<DigestPair> {
    let f = File::open(path)?;
    digest_reader(f)
}

pub fn digest_file_with(path: &Path, algorithm: Algorithm) -> io::Result<String> {
    let f = File::open(path)?;
    match algorithm {
        Algorithm::Md5 => hash_stream::<Md5>(f),
        Algorithm::Sha256 => hash_stream::<Sha256>(f),
    }
}

/// Digest that degrades to an error string; the recorder writes it in place of the hex values.
pub fn digest_or_error(path: &Path) -> Result<DigestPair, String> {
    digest_file(path).map_err(|e| format!("{}: {}", path.display(), e))
}

fn hash_stream<D: Digest>(reader: impl Read) -> io::Result<String> {
    let mut hasher = D::new();
    for_each_chunk(reader, |chunk| hasher.update(chunk))?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const ABC_MD5: &str = "900150983cd24fb0d6963f7d28e17f72";
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn known_vectors() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("abc.txt");
        std::fs::write(&p, b"abc").unwrap();
        let pair = digest_file(&p).unwrap();
        assert_eq!(pair.md5, ABC_MD5);
        assert_eq!(pair.sha256, ABC_SHA256);
        assert_eq!(digest_file_with(&p, Algorithm::Md5).unwrap(), ABC_MD5);
        assert_eq!(digest_file_with(&p, Algorithm::Sha256).unwrap(), ABC_SHA256);
    }

    #[test]
    fn empty_file() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("empty");
        std::fs::write(&p, b"").unwrap();
        let pair = digest_file(&p).unwrap();
        assert_eq!(pair.md5, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(pair.sha256, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
    }

    #[test]
    fn multi_chunk_file_is_stable() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("big.bin");
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        std::fs::write(&p, &data).unwrap();
        let first = digest_file(&p).unwrap();
        let second = digest_file(&p).unwrap();
        assert_eq!(first, second);
        // single-pass pair agrees with the per-algorithm form
        assert_eq!(first.md5, digest_file_with(&p, Algorithm::Md5).unwrap());
        assert_eq!(first.sha256, digest_file_with(&p, Algorithm::Sha256).unwrap());
        assert_eq!(first, digest_reader(&data[..]).unwrap());
    }

    #[test]
    fn single_byte_change_changes_both() {
        let a = digest_reader(&b"evidence-0"[..]).unwrap();
        let b = digest_reader(&b"evidence-1"[..]).unwrap();
        assert_ne!(a.md5, b.md5);
        assert_ne!(a.sha256, b.sha256);
    }

    struct Flaky {
        data: &'static [u8],
        interrupted: bool,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let pair = digest_reader(Flaky { data: b"abc", interrupted: false }).unwrap();
        assert_eq!(pair.md5, ABC_MD5);
        assert_eq!(hash_stream::<Sha256>(Flaky { data: b"abc", interrupted: false }).unwrap(), ABC_SHA256);
    }

    #[test]
    fn missing_file_is_an_error_string() {
        let dir = tempdir().unwrap();
        let err = digest_or_error(&dir.path().join("nope")).unwrap_err();
        assert!(err.contains("nope"));
        assert!(digest_file(&dir.path().join("nope")).is_err());
    }
}
