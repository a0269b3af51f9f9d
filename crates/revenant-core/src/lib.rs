//! Deleted-file discovery and recovery engine for NTFS volumes.
//!
//! Two independent evidence sources feed a single merged, time-sorted
//! result: the USN change journal (`usn`) and the recycle bin
//! (`recyclebin`). Recovery (`recovery`) re-fetches the file's MFT record
//! and either returns its resident bytes or streams its non-resident data
//! runs off the raw volume (`volume`).
//!
//! The three operations callers actually drive — `scan`, `get_file_record`,
//! `recover_data_runs` — live in [`engine`] as single-shot async tasks.

pub mod confidence;
pub mod decode;
pub mod engine;
pub mod error;
pub mod forensics;
pub mod merge;
pub mod mft;
pub mod model;
pub mod recovery;
pub mod recyclebin;
pub mod runlist;
pub mod session;
pub mod timeline;
pub mod usn;
pub mod volume;
pub mod wire;

pub use engine::{
    get_file_record, recover_candidate, recover_data_runs, recover_many_blocking, scan,
    EngineConfig,
};
pub use error::{EngineError, Result};
pub use model::{
    AttributeInfo, CandidateSource, DeletedCandidate, DriveLetter, FileEntry, FileRecordDetails,
    FileRef, RecoveryHandle, RunSegment, UsnRecord, VolumeGeometry,
};
