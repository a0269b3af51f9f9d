//! High-level session management (expansion).

use anyhow::Result;
use std::path::Path;

use super::database::{ScanSession, SessionDatabase, SessionSummary};

pub struct SessionManager {
    db: SessionDatabase,
}

impl SessionManager {
    pub fn new() -> Result<Self> {
        let db_path = SessionDatabase::default_path()?;
        Ok(Self { db: SessionDatabase::open(db_path)? })
    }

    pub fn with_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self { db: SessionDatabase::open(path)? })
    }

    pub fn database(&self) -> &SessionDatabase {
        &self.db
    }

    pub fn save(&self, session: &ScanSession) -> Result<()> {
        self.db.save_session(session)
    }

    pub fn load(&self, id: &str) -> Result<ScanSession> {
        self.db.load_session(id)
    }

    pub fn list(&self) -> Result<Vec<SessionSummary>> {
        self.db.list_sessions()
    }

    pub fn list_for_drive(&self, drive: char) -> Result<Vec<SessionSummary>> {
        self.db.list_sessions_by_drive(drive)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.db.delete_session(id)
    }

    pub fn cleanup(&self, days: u32) -> Result<usize> {
        self.db.cleanup_older_than(days)
    }

    pub fn count(&self) -> Result<usize> {
        self.db.count()
    }

    pub fn find_recent_for_drive(&self, drive: char) -> Result<Option<ScanSession>> {
        let sessions = self.db.list_sessions_by_drive(drive)?;
        match sessions.first() {
            Some(summary) => Ok(Some(self.db.load_session(&summary.id.to_string())?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CandidateSource, DeletedCandidate, RecoveryHandle};
    use chrono::Utc;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn sample_session(drive: char) -> ScanSession {
        ScanSession {
            id: Uuid::new_v4(),
            drive,
            created_at: Utc::now(),
            candidates: vec![DeletedCandidate {
                source: CandidateSource::Usn,
                name: "a.txt".into(),
                parent_path: format!("{drive}:\\"),
                full_path: format!("{drive}:\\a.txt"),
                size: None,
                deleted_time: Some(Utc::now()),
                confidence: 25,
                recovery_handle: RecoveryHandle::RecycleBin { data_path: None },
            }],
        }
    }

    #[test]
    fn saves_and_loads_a_session() {
        let dir = TempDir::new().unwrap();
        let manager = SessionManager::with_path(dir.path().join("test.db")).unwrap();
        let session = sample_session('D');
        let id = session.id.to_string();

        manager.save(&session).unwrap();
        let loaded = manager.load(&id).unwrap();
        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.candidates.len(), 1);
    }

    #[test]
    fn finds_most_recent_session_for_drive() {
        let dir = TempDir::new().unwrap();
        let manager = SessionManager::with_path(dir.path().join("test.db")).unwrap();

        let older = sample_session('D');
        let mut newer = sample_session('D');
        newer.created_at = older.created_at + chrono::Duration::hours(1);

        manager.save(&older).unwrap();
        manager.save(&newer).unwrap();

        let recent = manager.find_recent_for_drive('D').unwrap().unwrap();
        assert_eq!(recent.id, newer.id);
    }

    #[test]
    fn lists_are_scoped_by_drive() {
        let dir = TempDir::new().unwrap();
        let manager = SessionManager::with_path(dir.path().join("test.db")).unwrap();
        manager.save(&sample_session('D')).unwrap();
        manager.save(&sample_session('E')).unwrap();

        assert_eq!(manager.list_for_drive('D').unwrap().len(), 1);
        assert_eq!(manager.list().unwrap().len(), 2);
    }
}
