//! Session persistence (expansion): SQLite-backed storage of
//! completed scans, so a caller can list/inspect/re-open them without
//! re-enumerating the journal.

pub mod database;
pub mod manager;

pub use database::{ScanSession, SessionDatabase, SessionSummary};
pub use manager::SessionManager;
