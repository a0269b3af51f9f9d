//! MFT file-record parser: validates the `FILE` signature, walks the
//! attribute stream, and extracts resident bytes or non-resident run lists
//! for every attribute it can make sense of.
//!
//! Grounded on the attribute-header byte layout (type/length/resident flag
//! at a fixed offset, name offset/length pair, separate resident vs
//! non-resident tails) used by community NTFS parsers, adapted to the
//! `AttributeInfo`/`FileRecordDetails` shapes this crate exposes.

use crate::decode::{read_u16_le, read_u32_le, read_u64_le, utf16le_to_string};
use crate::error::{EngineError, Result};
use crate::model::{AttributeInfo, FileRecordDetails, FileRef};
use crate::runlist::decode_run_list;

const MFT_SIGNATURE: u32 = 0x4546_494C; // "FILE" read as little-endian u32
const ATTR_END_MARKER: u32 = 0xFFFF_FFFF;

const FLAG_IN_USE: u16 = 0x0001;
const FLAG_DIRECTORY: u16 = 0x0002;

/// Human-readable name for a numeric attribute type, for display/inspection
/// purposes only (recovery dispatches on the numeric `attr_type`).
fn attribute_type_name(attr_type: u32) -> &'static str {
    match attr_type {
        0x10 => "$STANDARD_INFORMATION",
        0x20 => "$ATTRIBUTE_LIST",
        0x30 => "$FILE_NAME",
        0x40 => "$OBJECT_ID",
        0x50 => "$SECURITY_DESCRIPTOR",
        0x60 => "$VOLUME_NAME",
        0x70 => "$VOLUME_INFORMATION",
        0x80 => "$DATA",
        0x90 => "$INDEX_ROOT",
        0xA0 => "$INDEX_ALLOCATION",
        0xB0 => "$BITMAP",
        0xC0 => "$REPARSE_POINT",
        0xD0 => "$EA_INFORMATION",
        0xE0 => "$EA",
        0x100 => "$LOGGED_UTILITY_STREAM",
        _ => "$UNKNOWN",
    }
}

/// Parse one MFT file record out of `buf` (typically 1024 bytes, already
/// fixed up by the kernel before it reaches this parser).
pub fn parse_file_record(buf: &[u8], cluster_size: u32) -> Result<FileRecordDetails> {
    if buf.len() < 48 || read_u32_le(buf, 0) != Some(MFT_SIGNATURE) {
        return Err(EngineError::NotAFileRecord);
    }

    let flags = read_u16_le(buf, 22).unwrap_or(0);
    let first_attr_offset = read_u16_le(buf, 20).unwrap_or(0) as usize;
    let base_ref = read_u64_le(buf, 32).unwrap_or(0);
    let hard_link_count = read_u16_le(buf, 18).unwrap_or(0);

    let attributes = walk_attributes(buf, first_attr_offset);

    Ok(FileRecordDetails {
        in_use: flags & FLAG_IN_USE != 0,
        is_directory: flags & FLAG_DIRECTORY != 0,
        base_reference: FileRef(base_ref),
        hard_link_count,
        flags,
        attributes,
        cluster_size,
    })
}

fn walk_attributes(buf: &[u8], start: usize) -> Vec<AttributeInfo> {
    let mut attrs = Vec::new();
    let mut offset = start;

    while offset + 4 <= buf.len() {
        let attr_type = match read_u32_le(buf, offset) {
            Some(t) => t,
            None => break,
        };
        if attr_type == ATTR_END_MARKER {
            break;
        }
        let length = match read_u32_le(buf, offset + 4) {
            Some(l) if l > 0 => l as usize,
            _ => break,
        };
        if offset + length > buf.len() {
            break;
        }

        if let Some(attr) = parse_attribute(&buf[offset..offset + length], attr_type) {
            attrs.push(attr);
        }
        offset += length;
    }

    attrs
}

fn parse_attribute(attr: &[u8], attr_type: u32) -> Option<AttributeInfo> {
    if attr.len() < 16 {
        return None;
    }
    let non_resident = attr[8] != 0;
    let name_length = attr[9] as usize;
    let name_offset = read_u16_le(attr, 10)? as usize;

    let name = if name_length > 0 {
        let end = name_offset + name_length * 2;
        attr.get(name_offset..end)
            .map(utf16le_to_string)
            .unwrap_or_default()
    } else {
        String::new()
    };

    let type_name = attribute_type_name(attr_type).to_string();

    if non_resident {
        parse_non_resident(attr, attr_type, type_name, name)
    } else {
        parse_resident(attr, attr_type, type_name, name)
    }
}

fn parse_resident(attr: &[u8], attr_type: u32, type_name: String, name: String) -> Option<AttributeInfo> {
    let value_length = read_u32_le(attr, 16)? as usize;
    let value_offset = read_u16_le(attr, 20)? as usize;
    let resident_bytes = attr
        .get(value_offset..value_offset + value_length)
        .map(|s| s.to_vec())
        .unwrap_or_default();
    let data_size = resident_bytes.len() as u64;

    Some(AttributeInfo {
        attr_type,
        type_name,
        name,
        non_resident: false,
        data_size,
        allocated_size: data_size,
        resident_bytes,
        runs: Vec::new(),
    })
}

fn parse_non_resident(attr: &[u8], attr_type: u32, type_name: String, name: String) -> Option<AttributeInfo> {
    let allocated_size = read_u64_le(attr, 40)?;
    let data_size = read_u64_le(attr, 48)?;
    let run_list_offset = read_u16_le(attr, 32)? as usize;

    let runs = attr
        .get(run_list_offset..)
        .map(decode_run_list)
        .unwrap_or_default();

    Some(AttributeInfo {
        attr_type,
        type_name,
        name,
        non_resident: true,
        data_size,
        allocated_size,
        resident_bytes: Vec::new(),
        runs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mft_header(flags: u16, first_attr_offset: u16, base_ref: u64) -> Vec<u8> {
        let mut buf = vec![0u8; 56];
        buf[0..4].copy_from_slice(b"FILE");
        buf[18..20].copy_from_slice(&1u16.to_le_bytes()); // hard link count
        buf[20..22].copy_from_slice(&first_attr_offset.to_le_bytes());
        buf[22..24].copy_from_slice(&flags.to_le_bytes());
        buf[32..40].copy_from_slice(&base_ref.to_le_bytes());
        buf
    }

    #[test]
    fn rejects_bad_signature() {
        let buf = vec![0u8; 64];
        assert!(matches!(
            parse_file_record(&buf, 4096),
            Err(EngineError::NotAFileRecord)
        ));
    }

    #[test]
    fn parses_in_use_flags_and_terminates_on_end_marker() {
        let mut buf = mft_header(FLAG_IN_USE | FLAG_DIRECTORY, 56, 0);
        buf.extend_from_slice(&ATTR_END_MARKER.to_le_bytes());
        let rec = parse_file_record(&buf, 4096).unwrap();
        assert!(rec.in_use);
        assert!(rec.is_directory);
        assert!(rec.attributes.is_empty());
    }

    #[test]
    fn parses_resident_data_attribute() {
        let mut buf = mft_header(FLAG_IN_USE, 56, 0);
        // attribute header: type=0x80 ($DATA), length=40, non_resident=0,
        // name_length=0, name_offset=24, value_length=5, value_offset=24
        let mut attr = vec![0u8; 40];
        attr[0..4].copy_from_slice(&0x80u32.to_le_bytes());
        attr[4..8].copy_from_slice(&40u32.to_le_bytes());
        attr[8] = 0; // resident
        attr[9] = 0; // name length
        attr[10..12].copy_from_slice(&24u16.to_le_bytes());
        attr[16..20].copy_from_slice(&5u32.to_le_bytes());
        attr[20..22].copy_from_slice(&24u16.to_le_bytes());
        attr[24..29].copy_from_slice(b"Hello");
        buf.extend_from_slice(&attr);
        buf.extend_from_slice(&ATTR_END_MARKER.to_le_bytes());

        let rec = parse_file_record(&buf, 4096).unwrap();
        let data = rec.recovery_attribute().unwrap();
        assert!(!data.non_resident);
        assert_eq!(data.resident_bytes, b"Hello");
        assert_eq!(data.data_size, 5);
        assert_eq!(data.type_name, "$DATA");
    }

    #[test]
    fn unknown_attribute_type_gets_placeholder_name() {
        assert_eq!(attribute_type_name(0xDEAD), "$UNKNOWN");
        assert_eq!(attribute_type_name(0x30), "$FILE_NAME");
    }

    #[test]
    fn parses_non_resident_data_attribute_with_runs() {
        let mut buf = mft_header(FLAG_IN_USE, 56, 0);
        let run_bytes = [0x21u8, 0x18, 0x56, 0x34, 0x00]; // one run + terminator
        let header_len = 64;
        let mut attr = vec![0u8; header_len + run_bytes.len()];
        attr[0..4].copy_from_slice(&0x80u32.to_le_bytes());
        attr[4..8].copy_from_slice(&(attr.len() as u32).to_le_bytes());
        attr[8] = 1; // non-resident
        attr[9] = 0;
        attr[32..34].copy_from_slice(&(header_len as u16).to_le_bytes());
        attr[40..48].copy_from_slice(&(24u64 * 4096).to_le_bytes()); // allocated
        attr[48..56].copy_from_slice(&100_000u64.to_le_bytes()); // data size
        attr[header_len..].copy_from_slice(&run_bytes);
        buf.extend_from_slice(&attr);
        buf.extend_from_slice(&ATTR_END_MARKER.to_le_bytes());

        let rec = parse_file_record(&buf, 4096).unwrap();
        let data = rec.recovery_attribute().unwrap();
        assert!(data.non_resident);
        assert_eq!(data.data_size, 100_000);
        assert_eq!(data.runs.len(), 1);
        assert_eq!(data.runs[0].length, 24);
    }
}
