//! Forensic bookkeeping: audit trail and hash verification. Both are wired
//! into `engine::scan`/`engine::recover_candidate` behind `EngineConfig`
//! (disabled by default).

pub mod audit;
pub mod verification;

pub use audit::{AuditEntry, AuditEvent, AuditEventType, AuditLogger};
pub use verification::{hash_file, hash_file_all, FileHash, HashAlgorithm};
