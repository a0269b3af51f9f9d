//! SQLite-backed scan session persistence (expansion).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::model::DeletedCandidate;

pub struct SessionDatabase {
    conn: Connection,
    db_path: PathBuf,
}

/// A completed scan, persisted so a caller can list/re-open it without
/// re-enumerating the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSession {
    pub id: Uuid,
    pub drive: char,
    pub created_at: DateTime<Utc>,
    pub candidates: Vec<DeletedCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub drive: char,
    pub created_at: DateTime<Utc>,
    pub candidate_count: usize,
}

impl SessionDatabase {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create session database directory")?;
        }
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open database at {}", db_path.display()))?;

        let db = Self { conn, db_path };
        db.initialize_schema()?;
        Ok(db)
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        Ok(home.join(".revenant-ntfs").join("sessions.db"))
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS sessions (
                    id TEXT PRIMARY KEY,
                    drive TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    candidate_count INTEGER NOT NULL,
                    candidates_json TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_created_at ON sessions(created_at DESC);
                CREATE INDEX IF NOT EXISTS idx_sessions_drive ON sessions(drive);
                "#,
            )
            .context("failed to initialize session schema")?;
        Ok(())
    }

    pub fn save_session(&self, session: &ScanSession) -> Result<()> {
        let candidates_json =
            serde_json::to_string(&session.candidates).context("failed to serialize candidates")?;

        self.conn
            .execute(
                r#"
                INSERT OR REPLACE INTO sessions (id, drive, created_at, candidate_count, candidates_json)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    session.id.to_string(),
                    session.drive.to_string(),
                    session.created_at.to_rfc3339(),
                    session.candidates.len() as i64,
                    candidates_json,
                ],
            )
            .context("failed to save session")?;

        tracing::info!(session_id = %session.id, "saved scan session");
        Ok(())
    }

    /// Load a session by full UUID or unique prefix.
    pub fn load_session(&self, id: &str) -> Result<ScanSession> {
        let mut stmt = self.conn.prepare(
            "SELECT id, drive, created_at, candidates_json FROM sessions WHERE id = ?1 OR id LIKE ?2 LIMIT 1",
        )?;

        stmt.query_row(params![id, format!("{id}%")], |row| {
            let id_str: String = row.get(0)?;
            let drive_str: String = row.get(1)?;
            let created_at_str: String = row.get(2)?;
            let candidates_json: String = row.get(3)?;
            Ok((id_str, drive_str, created_at_str, candidates_json))
        })
        .optional()
        .context("failed to query session")?
        .map(|(id_str, drive_str, created_at_str, candidates_json)| {
            Ok(ScanSession {
                id: Uuid::parse_str(&id_str).context("stored session id is not a valid uuid")?,
                drive: drive_str.chars().next().unwrap_or('?'),
                created_at: DateTime::parse_from_rfc3339(&created_at_str)
                    .context("stored timestamp is not valid rfc3339")?
                    .with_timezone(&Utc),
                candidates: serde_json::from_str(&candidates_json)
                    .context("stored candidates are not valid json")?,
            })
        })
        .unwrap_or_else(|| Err(anyhow::anyhow!("no session matching '{id}'")))
    }

    pub fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, drive, created_at, candidate_count FROM sessions ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            let id_str: String = row.get(0)?;
            let drive_str: String = row.get(1)?;
            let created_at_str: String = row.get(2)?;
            let candidate_count: i64 = row.get(3)?;
            Ok((id_str, drive_str, created_at_str, candidate_count))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id_str, drive_str, created_at_str, candidate_count) = row?;
            out.push(SessionSummary {
                id: Uuid::parse_str(&id_str)?,
                drive: drive_str.chars().next().unwrap_or('?'),
                created_at: DateTime::parse_from_rfc3339(&created_at_str)?.with_timezone(&Utc),
                candidate_count: candidate_count as usize,
            });
        }
        Ok(out)
    }

    pub fn list_sessions_by_drive(&self, drive: char) -> Result<Vec<SessionSummary>> {
        Ok(self
            .list_sessions()?
            .into_iter()
            .filter(|s| s.drive.eq_ignore_ascii_case(&drive))
            .collect())
    }

    pub fn delete_session(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])
            .context("failed to delete session")?;
        Ok(())
    }

    pub fn cleanup_older_than(&self, days: u32) -> Result<usize> {
        let cutoff = Utc::now() - chrono::Duration::days(days as i64);
        let affected = self
            .conn
            .execute(
                "DELETE FROM sessions WHERE created_at < ?1",
                params![cutoff.to_rfc3339()],
            )
            .context("failed to clean up old sessions")?;
        Ok(affected)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .context("failed to count sessions")?;
        Ok(count as usize)
    }
}
