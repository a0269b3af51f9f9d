use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Single upper-case drive letter, canonicalized on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DriveLetter(char);

impl DriveLetter {
    pub fn new(letter: char) -> Result<Self> {
        let upper = letter.to_ascii_uppercase();
        if upper.is_ascii_alphabetic() {
            Ok(Self(upper))
        } else {
            Err(EngineError::InvalidArgument(format!(
                "'{letter}' is not a valid drive letter"
            )))
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim_end_matches(':');
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::new(c),
            _ => Err(EngineError::InvalidArgument(format!(
                "'{s}' is not a valid drive letter"
            ))),
        }
    }

    pub fn as_char(&self) -> char {
        self.0
    }

    /// Device path suitable for `CreateFileW`, e.g. `\\.\D:`.
    pub fn device_path(&self) -> String {
        format!(r"\\.\{}:", self.0)
    }

    pub fn root_prefix(&self) -> String {
        format!(r"{}:\", self.0)
    }
}

impl std::fmt::Display for DriveLetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:", self.0)
    }
}

/// 64-bit NTFS file reference number: low 48 bits are the MFT record index,
/// high 16 bits are the sequence number. Treated as an opaque identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileRef(pub u64);

impl FileRef {
    pub fn record_index(&self) -> u64 {
        self.0 & 0x0000_FFFF_FFFF_FFFF
    }

    pub fn sequence_number(&self) -> u16 {
        (self.0 >> 48) as u16
    }
}

impl From<u64> for FileRef {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl std::fmt::Display for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `FILE_DELETE` bit within a USN record's reason bitmask.
pub const USN_REASON_FILE_DELETE: u32 = 0x0000_0200;

/// A decoded USN_RECORD_V2, trimmed to the fields this engine needs.
#[derive(Debug, Clone)]
pub struct UsnRecord {
    pub file_ref: FileRef,
    pub parent_ref: FileRef,
    pub name: String,
    pub is_directory: bool,
    pub reason: u32,
    pub timestamp_ms: i64,
}

impl UsnRecord {
    pub fn is_delete(&self) -> bool {
        self.reason & USN_REASON_FILE_DELETE != 0
    }
}

/// One row of the in-memory identifier table built while scanning the journal.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub parent_ref: FileRef,
    pub name: String,
    pub is_directory: bool,
}

/// Where a deleted-file candidate was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateSource {
    Usn,
    RecycleBin,
}

/// A handle sufficient to drive recovery for one candidate, without re-scanning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RecoveryHandle {
    Usn { drive: DriveLetter, file_ref: FileRef },
    RecycleBin { data_path: Option<std::path::PathBuf> },
}

/// Engine output: one deleted file, merged/deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedCandidate {
    pub source: CandidateSource,
    pub name: String,
    pub parent_path: String,
    pub full_path: String,
    pub size: Option<u64>,
    pub deleted_time: Option<DateTime<Utc>>,
    pub confidence: u8,
    pub recovery_handle: RecoveryHandle,
}

/// One segment of a decoded run list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSegment {
    pub vcn_start: i64,
    pub lcn: i64,
    pub length: u64,
    pub sparse: bool,
}

/// One parsed MFT attribute record.
#[derive(Debug, Clone)]
pub struct AttributeInfo {
    pub attr_type: u32,
    pub type_name: String,
    pub name: String,
    pub non_resident: bool,
    pub data_size: u64,
    pub allocated_size: u64,
    pub resident_bytes: Vec<u8>,
    pub runs: Vec<RunSegment>,
}

pub const ATTR_TYPE_DATA: u32 = 0x80;

impl AttributeInfo {
    pub fn is_unnamed_data(&self) -> bool {
        self.attr_type == ATTR_TYPE_DATA && self.name.is_empty()
    }

    pub fn is_data(&self) -> bool {
        self.attr_type == ATTR_TYPE_DATA
    }
}

/// Decoded MFT file record.
#[derive(Debug, Clone)]
pub struct FileRecordDetails {
    pub in_use: bool,
    pub is_directory: bool,
    pub base_reference: FileRef,
    pub hard_link_count: u16,
    pub flags: u16,
    pub attributes: Vec<AttributeInfo>,
    pub cluster_size: u32,
}

impl FileRecordDetails {
    /// First `$DATA` attribute with an empty name; falls back to any `$DATA`
    /// attribute if no unnamed stream is present.
    pub fn recovery_attribute(&self) -> Option<&AttributeInfo> {
        self.attributes
            .iter()
            .find(|a| a.is_unnamed_data())
            .or_else(|| self.attributes.iter().find(|a| a.is_data()))
    }
}

/// Volume geometry needed to translate clusters to byte offsets.
#[derive(Debug, Clone, Copy)]
pub struct VolumeGeometry {
    pub bytes_per_sector: u32,
    pub sectors_per_cluster: u32,
}

impl VolumeGeometry {
    pub fn cluster_size(&self) -> u32 {
        self.bytes_per_sector * self.sectors_per_cluster
    }
}
