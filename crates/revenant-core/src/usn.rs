//! USN change-journal scanner: pages through `FSCTL_ENUM_USN_DATA`,
//! builds the `fileRef -> (parentRef, name, isDirectory)` identifier table,
//! and resolves full paths for every delete event.
//!
//! Grounded on the `MFT_ENUM_DATA_V0 { start_file_reference_number, low_usn,
//! high_usn }` input layout and the `FSCTL_ENUM_USN_DATA` code used by
//! community NTFS enumeration tools, and on the `USN_RECORD_V2` packed
//! output layout they parse record-by-record via `RecordLength`.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::decode::{filetime_to_unix_ms, read_i64_le, read_u16_le, read_u32_le, read_u64_le, utf16le_to_string};
use crate::model::{DriveLetter, FileEntry, FileRef, UsnRecord};
use crate::volume::{Volume, FSCTL_ENUM_USN_DATA};
use crate::error::Result;

const PATH_RESOLUTION_DEPTH_LIMIT: usize = 1024;

/// Result of one full journal pass: the identifier table and the list of
/// delete events observed, in journal order.
pub struct UsnScanResult {
    pub identifiers: HashMap<FileRef, FileEntry>,
    pub deletions: Vec<UsnRecord>,
}

/// Enumerate the entire USN journal of `volume`, paging `buffer_size` bytes
/// at a time (`EngineConfig.usn_buffer_size`; defaults to
/// `crate::volume::USN_ENUM_BUFFER_SIZE`).
pub fn scan_journal(volume: &Volume, buffer_size: usize) -> Result<UsnScanResult> {
    let mut identifiers: HashMap<FileRef, FileEntry> = HashMap::new();
    let mut deletions: Vec<UsnRecord> = Vec::new();

    let mut start_file_ref: u64 = 0;
    let mut out_buf = vec![0u8; buffer_size];

    loop {
        let input = encode_mft_enum_input(start_file_ref);
        let (returned, eof) = volume.ioctl(FSCTL_ENUM_USN_DATA, &input, &mut out_buf)?;
        if eof || returned < 8 {
            break;
        }

        let next_start = read_u64_le(&out_buf, 0).unwrap_or(start_file_ref);
        for record in parse_usn_records(&out_buf[8..returned]) {
            identifiers.insert(
                record.file_ref,
                FileEntry {
                    parent_ref: record.parent_ref,
                    name: record.name.clone(),
                    is_directory: record.is_directory,
                },
            );
            if record.is_delete() {
                deletions.push(record);
            }
        }

        if next_start == start_file_ref {
            break;
        }
        start_file_ref = next_start;
        debug!(next_start, "usn enumeration advanced");
    }

    Ok(UsnScanResult { identifiers, deletions })
}

fn encode_mft_enum_input(start_file_ref: u64) -> [u8; 24] {
    // MFT_ENUM_DATA_V0 { start_file_reference_number: u64, low_usn: i64, high_usn: i64 }
    let mut buf = [0u8; 24];
    buf[0..8].copy_from_slice(&start_file_ref.to_le_bytes());
    buf[8..16].copy_from_slice(&0i64.to_le_bytes());
    buf[16..24].copy_from_slice(&i64::MAX.to_le_bytes());
    buf
}

/// Parse a packed sequence of `USN_RECORD_V2`s, stopping cleanly on a zero
/// or out-of-bounds `RecordLength`.
fn parse_usn_records(buf: &[u8]) -> Vec<UsnRecord> {
    let mut out = Vec::new();
    let mut offset = 0usize;

    while offset + 4 <= buf.len() {
        let record_length = match read_u32_le(buf, offset) {
            Some(l) if l > 0 => l as usize,
            _ => break,
        };
        if offset + record_length > buf.len() || record_length < 60 {
            break;
        }
        let record = &buf[offset..offset + record_length];

        let file_ref = read_u64_le(record, 8).unwrap_or(0);
        let parent_ref = read_u64_le(record, 16).unwrap_or(0);
        let timestamp = read_i64_le(record, 32).unwrap_or(0);
        let reason = read_u32_le(record, 40).unwrap_or(0);
        let file_attributes = read_u32_le(record, 52).unwrap_or(0);
        let name_length = read_u16_le(record, 56).unwrap_or(0) as usize;
        let name_offset = read_u16_le(record, 58).unwrap_or(0) as usize;

        let name = record
            .get(name_offset..name_offset + name_length)
            .map(utf16le_to_string)
            .unwrap_or_default();

        const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x10;

        out.push(UsnRecord {
            file_ref: FileRef(file_ref),
            parent_ref: FileRef(parent_ref),
            name,
            is_directory: file_attributes & FILE_ATTRIBUTE_DIRECTORY != 0,
            reason,
            timestamp_ms: filetime_to_unix_ms(timestamp),
        });

        offset += record_length;
    }

    out
}

/// Reconstruct a full path for a delete event by climbing the identifier
/// table from its parent, guarding against cycles and excessive depth.
pub fn resolve_path(
    drive: DriveLetter,
    start_parent: FileRef,
    identifiers: &HashMap<FileRef, FileEntry>,
) -> String {
    let mut segments: Vec<String> = Vec::new();
    let mut current = start_parent;
    let mut depth = 0;

    while current.0 != 0 && depth < PATH_RESOLUTION_DEPTH_LIMIT {
        let entry = match identifiers.get(&current) {
            Some(e) => e,
            None => break,
        };
        if !entry.name.is_empty() {
            segments.push(entry.name.clone());
        }
        if entry.parent_ref == current {
            warn!(file_ref = current.0, "identifier table cycle detected, stopping path resolution");
            break;
        }
        current = entry.parent_ref;
        depth += 1;
    }

    segments.reverse();
    let mut path = drive.root_prefix();
    path.push_str(&segments.join("\\"));
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_simple_path() {
        let mut identifiers = HashMap::new();
        identifiers.insert(
            FileRef(3),
            FileEntry { parent_ref: FileRef(0), name: "Docs".into(), is_directory: true },
        );
        let drive = DriveLetter::new('D').unwrap();
        let path = resolve_path(drive, FileRef(3), &identifiers);
        assert_eq!(path, r"D:\Docs");
    }

    #[test]
    fn cycle_guard_stops_at_self_parent() {
        let mut identifiers = HashMap::new();
        identifiers.insert(
            FileRef(7),
            FileEntry { parent_ref: FileRef(7), name: "loop".into(), is_directory: true },
        );
        let drive = DriveLetter::new('D').unwrap();
        let path = resolve_path(drive, FileRef(7), &identifiers);
        assert_eq!(path, r"D:\loop");
    }

    #[test]
    fn missing_parent_entry_stops_resolution() {
        let identifiers: HashMap<FileRef, FileEntry> = HashMap::new();
        let drive = DriveLetter::new('D').unwrap();
        let path = resolve_path(drive, FileRef(99), &identifiers);
        assert_eq!(path, r"D:\");
    }
}
