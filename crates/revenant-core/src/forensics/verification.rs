//! Hash verification (expansion): post-recovery integrity hashing of
//! recovered output files. Bookkeeping for the audit trail, never a
//! recovery precondition — it never gates whether a file counts as
//! recovered.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const STREAM_CHUNK_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    pub fn all() -> [Self; 3] {
        [Self::Md5, Self::Sha1, Self::Sha256]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileHash {
    pub algorithm: HashAlgorithm,
    pub hash: String,
    pub file_size: u64,
}

/// Hash every algorithm in [`HashAlgorithm::all`] over `path` in one
/// streaming pass, never holding the whole file in memory.
pub fn hash_file_all(path: impl AsRef<Path>) -> io::Result<Vec<FileHash>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let file_size = file.metadata()?.len();

    let mut md5_ctx = md5::Context::new();
    let mut sha1_hasher = sha1::Sha1::new();
    let mut sha256_hasher = Sha256::new();

    let mut buffer = vec![0u8; STREAM_CHUNK_BYTES];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        md5_ctx.consume(&buffer[..n]);
        sha1::Digest::update(&mut sha1_hasher, &buffer[..n]);
        sha256_hasher.update(&buffer[..n]);
    }

    Ok(vec![
        FileHash {
            algorithm: HashAlgorithm::Md5,
            hash: format!("{:x}", md5_ctx.compute()),
            file_size,
        },
        FileHash {
            algorithm: HashAlgorithm::Sha1,
            hash: format!("{:x}", sha1::Digest::finalize(sha1_hasher)),
            file_size,
        },
        FileHash {
            algorithm: HashAlgorithm::Sha256,
            hash: format!("{:x}", sha256_hasher.finalize()),
            file_size,
        },
    ])
}

/// Hash a single algorithm over `path`, streaming in fixed-size chunks.
pub fn hash_file(path: impl AsRef<Path>, algorithm: HashAlgorithm) -> io::Result<FileHash> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let file_size = file.metadata()?.len();
    let mut buffer = vec![0u8; STREAM_CHUNK_BYTES];

    let hash = match algorithm {
        HashAlgorithm::Md5 => {
            let mut ctx = md5::Context::new();
            loop {
                let n = file.read(&mut buffer)?;
                if n == 0 {
                    break;
                }
                ctx.consume(&buffer[..n]);
            }
            format!("{:x}", ctx.compute())
        }
        HashAlgorithm::Sha1 => {
            let mut hasher = sha1::Sha1::new();
            loop {
                let n = file.read(&mut buffer)?;
                if n == 0 {
                    break;
                }
                sha1::Digest::update(&mut hasher, &buffer[..n]);
            }
            format!("{:x}", sha1::Digest::finalize(hasher))
        }
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let n = file.read(&mut buffer)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buffer[..n]);
            }
            format!("{:x}", hasher.finalize())
        }
    };

    Ok(FileHash { algorithm, hash, file_size })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn hashes_known_content() {
        let mut file = NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"hello world").unwrap();
        let hash = hash_file(file.path(), HashAlgorithm::Sha256).unwrap();
        assert_eq!(
            hash.hash,
            "b94d27b9934d3e08a52e52d7da7dacefbe65e1bec88ce8a1c4bfa9c0ee0c9c9f"
        );
        assert_eq!(hash.file_size, 11);
    }

    #[test]
    fn hash_all_returns_three_algorithms() {
        let mut file = NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"data").unwrap();
        let hashes = hash_file_all(file.path()).unwrap();
        assert_eq!(hashes.len(), 3);
        assert!(hashes.iter().all(|h| !h.hash.is_empty()));
    }
}
