//! Pure little-endian/time/text decoders shared by the MFT, USN, and
//! recycle-bin parsers.

use base64::Engine as _;

/// 100-ns ticks between the FILETIME epoch (1601-01-01) and the Unix epoch.
const FILETIME_EPOCH_DIFF_100NS: i64 = 116_444_736_000_000_000;

pub fn read_u16_le(buf: &[u8], offset: usize) -> Option<u16> {
    buf.get(offset..offset + 2)
        .map(|s| u16::from_le_bytes([s[0], s[1]]))
}

pub fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    buf.get(offset..offset + 4)
        .map(|s| u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
}

pub fn read_u64_le(buf: &[u8], offset: usize) -> Option<u64> {
    buf.get(offset..offset + 8).map(|s| {
        u64::from_le_bytes([s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7]])
    })
}

pub fn read_i64_le(buf: &[u8], offset: usize) -> Option<i64> {
    read_u64_le(buf, offset).map(|v| v as i64)
}

/// Decode a UTF-16LE byte run into a `String`. An odd trailing byte is
/// dropped rather than treated as an error.
pub fn utf16le_to_string(bytes: &[u8]) -> String {
    let even_len = bytes.len() - (bytes.len() % 2);
    let units: Vec<u16> = bytes[..even_len]
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// NUL-terminate a UTF-16LE-decoded string at its first NUL code unit, for
/// fixed-width padded fields such as `$I` original-path buffers.
pub fn utf16le_to_string_nul_terminated(bytes: &[u8]) -> String {
    let even_len = bytes.len() - (bytes.len() % 2);
    let units: Vec<u16> = bytes[..even_len]
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Convert a Windows FILETIME (100-ns ticks since 1601-01-01 UTC) to Unix
/// milliseconds.
pub fn filetime_to_unix_ms(filetime: i64) -> i64 {
    (filetime - FILETIME_EPOCH_DIFF_100NS) / 10_000
}

/// Inverse of [`filetime_to_unix_ms`], exact for round-trip testing.
pub fn unix_ms_to_filetime(unix_ms: i64) -> i64 {
    unix_ms * 10_000 + FILETIME_EPOCH_DIFF_100NS
}

pub fn base64_encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub fn base64_decode(s: &str) -> Option<Vec<u8>> {
    base64::engine::general_purpose::STANDARD.decode(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_truncates_odd_trailing_byte() {
        // "A" (0x0041) plus one stray trailing byte.
        let bytes = [0x41, 0x00, 0xFF];
        assert_eq!(utf16le_to_string(&bytes), "A");
    }

    #[test]
    fn utf16_nul_terminated_stops_at_nul() {
        let mut bytes = Vec::new();
        for c in "abc".encode_utf16() {
            bytes.extend_from_slice(&c.to_le_bytes());
        }
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert_eq!(utf16le_to_string_nul_terminated(&bytes), "abc");
    }

    #[test]
    fn filetime_round_trips() {
        for t in [-1_000_000_i64, 0, 1_700_000_000_000, 2_i64.pow(40)] {
            assert_eq!(filetime_to_unix_ms(unix_ms_to_filetime(t)), t);
        }
    }

    #[test]
    fn base64_round_trips() {
        let data = b"Hello, recovered file";
        let encoded = base64_encode(data);
        assert_eq!(base64_decode(&encoded).unwrap(), data);
    }
}
