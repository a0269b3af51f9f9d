//! Forensic audit trail (expansion): an append-only JSONL log of
//! scan/recovery operations. Disabled by default; callers opt in via
//! `EngineConfig.audit_log_path`. A failed audit write is logged and never
//! fails the underlying scan/recovery operation — this is observability,
//! not a precondition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    ScanStart,
    ScanComplete,
    CandidateFound,
    RecoveryStart,
    RecoveryComplete,
    RecoveryFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub session_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct AuditEvent {
    event_type: AuditEventType,
    message: String,
    metadata: HashMap<String, String>,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType, message: impl Into<String>) -> Self {
        Self { event_type, message: message.into(), metadata: HashMap::new() }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Append-only JSONL audit logger, one process-wide log file per session.
pub struct AuditLogger {
    session_id: String,
    log_path: PathBuf,
    next_id: Mutex<u64>,
    file: Mutex<std::fs::File>,
}

impl AuditLogger {
    pub fn open(session_id: impl Into<String>, log_path: impl AsRef<Path>) -> io::Result<Self> {
        let log_path = log_path.as_ref().to_path_buf();
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&log_path)?;

        Ok(Self {
            session_id: session_id.into(),
            log_path,
            next_id: Mutex::new(1),
            file: Mutex::new(file),
        })
    }

    pub fn log(&self, event: AuditEvent) -> io::Result<u64> {
        let id = {
            let mut next_id = self.next_id.lock().unwrap();
            let id = *next_id;
            *next_id += 1;
            id
        };

        let entry = AuditEntry {
            id,
            timestamp: Utc::now(),
            event_type: event.event_type,
            session_id: self.session_id.clone(),
            message: event.message,
            metadata: event.metadata,
        };

        let json = serde_json::to_string(&entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = self.file.lock().unwrap();
        writeln!(file, "{json}")?;
        file.flush()?;
        Ok(id)
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn appends_one_jsonl_line_per_event() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = AuditLogger::open("session-1", &path).unwrap();

        logger.log(AuditEvent::new(AuditEventType::ScanStart, "scan started on D:")).unwrap();
        logger
            .log(AuditEvent::new(AuditEventType::CandidateFound, "found deleted file").with_metadata("path", r"D:\a.txt"))
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("SCAN_START"));
        assert!(contents.contains("CANDIDATE_FOUND"));
    }

    #[test]
    fn entry_ids_increment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = AuditLogger::open("s", &path).unwrap();
        let first = logger.log(AuditEvent::new(AuditEventType::ScanStart, "a")).unwrap();
        let second = logger.log(AuditEvent::new(AuditEventType::ScanComplete, "b")).unwrap();
        assert_eq!(second, first + 1);
    }
}
