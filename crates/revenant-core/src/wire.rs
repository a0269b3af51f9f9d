//! Wire DTOs for the hypothetical IPC boundary described in: 64-bit
//! integers cross as decimal strings and resident payloads as base64, to
//! sidestep the 53-bit float precision limit of a scripting-language caller.
//!
//! Grounded on the boundary/wire-type separation pattern used elsewhere in
//! this codebase, where serde DTOs are kept distinct from the internal
//! model types and converted at the edge. No transport is wired to this
//! module (IPC transport itself is out of scope); it exists to be
//! exercised by tests and consumed by a future IPC layer.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::{
    AttributeInfo, CandidateSource, DeletedCandidate, DriveLetter, FileRecordDetails, FileRef,
    RunSegment,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireU64(pub String);

impl From<u64> for WireU64 {
    fn from(v: u64) -> Self {
        Self(v.to_string())
    }
}

impl TryFrom<&WireU64> for u64 {
    type Error = EngineError;
    fn try_from(v: &WireU64) -> Result<Self> {
        v.0.parse()
            .map_err(|_| EngineError::InvalidArgument(format!("'{}' is not a valid u64", v.0)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFileRef(pub String);

impl From<FileRef> for WireFileRef {
    fn from(v: FileRef) -> Self {
        Self(v.0.to_string())
    }
}

impl TryFrom<&WireFileRef> for FileRef {
    type Error = EngineError;
    fn try_from(v: &WireFileRef) -> Result<Self> {
        let raw: u64 = v
            .0
            .parse()
            .map_err(|_| EngineError::InvalidArgument(format!("'{}' is not a valid file reference", v.0)))?;
        Ok(FileRef(raw))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRunSegment {
    pub vcn_start: WireU64,
    pub lcn: String,
    pub length: WireU64,
    pub sparse: bool,
}

impl From<RunSegment> for WireRunSegment {
    fn from(r: RunSegment) -> Self {
        Self {
            vcn_start: (r.vcn_start as u64).into(),
            lcn: r.lcn.to_string(),
            length: r.length.into(),
            sparse: r.sparse,
        }
    }
}

impl TryFrom<&WireRunSegment> for RunSegment {
    type Error = EngineError;
    fn try_from(w: &WireRunSegment) -> Result<Self> {
        Ok(RunSegment {
            vcn_start: u64::try_from(&w.vcn_start)? as i64,
            lcn: w
                .lcn
                .parse()
                .map_err(|_| EngineError::InvalidArgument(format!("'{}' is not a valid lcn", w.lcn)))?,
            length: u64::try_from(&w.length)?,
            sparse: w.sparse,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireAttributeInfo {
    pub attr_type: u32,
    pub type_name: String,
    pub name: String,
    pub non_resident: bool,
    pub data_size: WireU64,
    pub allocated_size: WireU64,
    pub resident_base64: String,
    pub runs: Vec<WireRunSegment>,
}

impl From<&AttributeInfo> for WireAttributeInfo {
    fn from(a: &AttributeInfo) -> Self {
        Self {
            attr_type: a.attr_type,
            type_name: a.type_name.clone(),
            name: a.name.clone(),
            non_resident: a.non_resident,
            data_size: a.data_size.into(),
            allocated_size: a.allocated_size.into(),
            resident_base64: crate::decode::base64_encode(&a.resident_bytes),
            runs: a.runs.iter().copied().map(WireRunSegment::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFileRecordDetails {
    pub in_use: bool,
    pub is_directory: bool,
    pub base_reference: WireFileRef,
    pub hard_link_count: u16,
    pub attributes: Vec<WireAttributeInfo>,
    pub cluster_size: u32,
}

impl From<&FileRecordDetails> for WireFileRecordDetails {
    fn from(r: &FileRecordDetails) -> Self {
        Self {
            in_use: r.in_use,
            is_directory: r.is_directory,
            base_reference: r.base_reference.into(),
            hard_link_count: r.hard_link_count,
            attributes: r.attributes.iter().map(WireAttributeInfo::from).collect(),
            cluster_size: r.cluster_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireCandidate {
    pub source: String,
    pub name: String,
    pub parent_path: String,
    pub full_path: String,
    pub size: Option<WireU64>,
    pub deleted_time_ms: Option<i64>,
    pub confidence: u8,
}

impl From<&DeletedCandidate> for WireCandidate {
    fn from(c: &DeletedCandidate) -> Self {
        Self {
            source: match c.source {
                CandidateSource::Usn => "usn".to_string(),
                CandidateSource::RecycleBin => "recycle_bin".to_string(),
            },
            name: c.name.clone(),
            parent_path: c.parent_path.clone(),
            full_path: c.full_path.clone(),
            size: c.size.map(WireU64::from),
            deleted_time_ms: c.deleted_time.map(|t| t.timestamp_millis()),
            confidence: c.confidence,
        }
    }
}

pub fn drive_to_wire(drive: DriveLetter) -> String {
    drive.as_char().to_string()
}
