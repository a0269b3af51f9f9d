//! Recycle-bin scanner: walks `$Recycle.Bin\<SID>\$I*` metadata files
//! and pairs each with its sibling `$R*` payload.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::confidence::{confidence_for_recycle_bin, ConfidenceOverrides};
use crate::decode::{filetime_to_unix_ms, read_u64_le, utf16le_to_string_nul_terminated};
use crate::model::{CandidateSource, DeletedCandidate, RecoveryHandle};

/// Parsed `$I` header fields plus the original path.
#[derive(Debug, Clone)]
pub struct RecycleBinEntry {
    pub version: u8,
    pub size: u64,
    pub deleted_time_ms: i64,
    pub original_path: String,
}

const MIN_I_HEADER_LEN: usize = 24;

/// Parse one `$I` file's raw bytes. Returns `None` for an unsupported
/// version, which callers skip silently.
pub fn parse_i_file(bytes: &[u8]) -> Option<RecycleBinEntry> {
    if bytes.len() < MIN_I_HEADER_LEN {
        return None;
    }
    let version = bytes[0];
    if version != 1 && version != 2 {
        return None;
    }
    let size = read_u64_le(bytes, 8)?;
    let deleted_filetime = read_u64_le(bytes, 16)? as i64;
    let original_path = utf16le_to_string_nul_terminated(&bytes[24..]);

    Some(RecycleBinEntry {
        version,
        size,
        deleted_time_ms: filetime_to_unix_ms(deleted_filetime),
        original_path,
    })
}

/// Walk every `$Recycle.Bin\<SID>` directory on `drive` and emit one
/// candidate per `$I` file. Malformed entries are logged and
/// skipped; the scan as a whole never fails because of one bad entry.
pub fn scan_recycle_bin(
    drive_root: &Path,
    drive_letter: char,
    confidence_overrides: Option<&ConfidenceOverrides>,
) -> Vec<DeletedCandidate> {
    let mut out = Vec::new();
    let recycle_root = drive_root.join("$Recycle.Bin");
    let sid_dirs = match std::fs::read_dir(&recycle_root) {
        Ok(entries) => entries,
        Err(_) => return out,
    };

    for sid_entry in sid_dirs.flatten() {
        let sid_path = sid_entry.path();
        if !sid_path.is_dir() {
            continue;
        }
        let files = match std::fs::read_dir(&sid_path) {
            Ok(f) => f,
            Err(_) => continue,
        };

        for file_entry in files.flatten() {
            let path = file_entry.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            if !name.starts_with("$I") {
                continue;
            }

            let bytes = match std::fs::read(&path) {
                Ok(b) => b,
                Err(e) => {
                    warn!(?path, error = %e, "failed reading $I metadata file");
                    continue;
                }
            };
            let entry = match parse_i_file(&bytes) {
                Some(e) => e,
                None => {
                    warn!(?path, "malformed or unsupported $I metadata file, skipping");
                    continue;
                }
            };

            let expected_prefix = format!("{}:\\", drive_letter.to_ascii_uppercase());
            if !entry.original_path.to_ascii_uppercase().starts_with(&expected_prefix) {
                continue;
            }

            let data_name = format!("$R{}", &name[2..]);
            let data_path = sid_path.join(&data_name);
            let has_data = data_path.is_file();

            let confidence = confidence_for_recycle_bin(has_data, confidence_overrides);
            let full_path = entry.original_path.clone();
            let file_name = full_path
                .rsplit('\\')
                .next()
                .unwrap_or(&full_path)
                .to_string();
            let parent_path = full_path
                .strip_suffix(&file_name)
                .unwrap_or(&full_path)
                .trim_end_matches('\\')
                .to_string();

            out.push(DeletedCandidate {
                source: CandidateSource::RecycleBin,
                name: file_name,
                parent_path,
                full_path,
                size: Some(entry.size),
                deleted_time: ms_to_datetime(entry.deleted_time_ms),
                confidence,
                recovery_handle: RecoveryHandle::RecycleBin {
                    data_path: if has_data { Some(data_path) } else { None },
                },
            });
        }
    }

    out
}

fn ms_to_datetime(ms: i64) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::from_timestamp_millis(ms)
}

/// Recover the data file for one recycle-bin candidate, truncating to the
/// recorded logical size if the payload file is larger.
pub fn recover_recycle_bin_file(
    data_path: Option<&PathBuf>,
    recorded_size: Option<u64>,
    output_path: &Path,
) -> crate::error::Result<()> {
    use crate::error::EngineError;
    use std::io::{Read, Write};

    let data_path = data_path.ok_or(EngineError::SourceMissing)?;
    if !data_path.is_file() {
        return Err(EngineError::SourceMissing);
    }

    let mut src = std::fs::File::open(data_path).map_err(EngineError::Io)?;
    let mut dst = std::fs::File::create(output_path).map_err(EngineError::WriteFailed)?;

    match recorded_size {
        Some(limit) => {
            let mut remaining = limit;
            let mut buf = [0u8; 64 * 1024];
            while remaining > 0 {
                let chunk = remaining.min(buf.len() as u64) as usize;
                let read = src.read(&mut buf[..chunk]).map_err(EngineError::Io)?;
                if read == 0 {
                    break;
                }
                dst.write_all(&buf[..read]).map_err(EngineError::WriteFailed)?;
                remaining -= read as u64;
            }
        }
        None => {
            std::io::copy(&mut src, &mut dst).map_err(EngineError::WriteFailed)?;
        }
    }

    Ok(())
}

/// Recover directly from a raw `$I` metadata file path, pairing it with its
/// sibling `$R*` payload by the shared suffix. For callers that already
/// have an `$I`/`$R` pair in hand and don't want to run a full scan.
pub fn recover_from_i_file(i_file_path: &Path, output_path: &Path) -> crate::error::Result<()> {
    use crate::error::EngineError;

    let name = i_file_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| EngineError::InvalidArgument(format!("{}: not a valid $I path", i_file_path.display())))?;
    if !name.starts_with("$I") {
        return Err(EngineError::InvalidArgument(format!("{name}: not a $I metadata file name")));
    }

    let bytes = std::fs::read(i_file_path).map_err(EngineError::Io)?;
    let entry = parse_i_file(&bytes)
        .ok_or_else(|| EngineError::InvalidArgument(format!("{}: malformed $I file", i_file_path.display())))?;

    let data_name = format!("$R{}", &name[2..]);
    let data_path = i_file_path.with_file_name(data_name);
    let data_path = if data_path.is_file() { Some(data_path) } else { None };

    recover_recycle_bin_file(data_path.as_ref(), Some(entry.size), output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_i_bytes() -> Vec<u8> {
        let mut buf = vec![0u8; 24];
        buf[0] = 2;
        buf[8..16].copy_from_slice(&1024u64.to_le_bytes());
        buf[16..24].copy_from_slice(&133_276_427_000_000_000u64.to_le_bytes());
        let path = "C:\\a.txt";
        for c in path.encode_utf16() {
            buf.extend_from_slice(&c.to_le_bytes());
        }
        buf.extend_from_slice(&[0, 0]);
        buf
    }

    #[test]
    fn parses_version_2_i_file() {
        let bytes = sample_i_bytes();
        let entry = parse_i_file(&bytes).unwrap();
        assert_eq!(entry.version, 2);
        assert_eq!(entry.size, 1024);
        assert_eq!(entry.original_path, "C:\\a.txt");
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut bytes = sample_i_bytes();
        bytes[0] = 9;
        assert!(parse_i_file(&bytes).is_none());
    }

    #[test]
    fn rejects_truncated_buffer() {
        assert!(parse_i_file(&[1, 2, 3]).is_none());
    }

    #[test]
    fn recovers_from_i_file_path_by_locating_sibling_r_file() {
        let dir = tempfile::tempdir().unwrap();
        let i_path = dir.path().join("$IABCDEF.txt");
        std::fs::write(&i_path, sample_i_bytes()).unwrap();
        let r_path = dir.path().join("$RABCDEF.txt");
        std::fs::write(&r_path, vec![b'x'; 1024]).unwrap();

        let out = dir.path().join("recovered.txt");
        recover_from_i_file(&i_path, &out).unwrap();
        assert_eq!(std::fs::read(&out).unwrap().len(), 1024);
    }

    #[test]
    fn recover_from_i_file_rejects_non_i_name() {
        let dir = tempfile::tempdir().unwrap();
        let bad_path = dir.path().join("notice.txt");
        std::fs::write(&bad_path, sample_i_bytes()).unwrap();
        let out = dir.path().join("out.txt");
        assert!(recover_from_i_file(&bad_path, &out).is_err());
    }
}
