//! SQLite adapter implementing both [`BlobStore`] and [`MetadataStore`]
//! over one connection, collapsing the blob/metadata split spec.md §6
//! describes into a single driver — see DESIGN.md for why this workspace
//! doesn't keep the teacher's separate `sqlx`-backed orchestration store.

use crate::domain::{
    BaselineRow, BlobKind, BlobStore, DeltaRow, IngestionRow, IngestionState, MetadataStore,
    RepositoryRow, ScoreRow, SnapshotRow,
};
use crate::error::{Result, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS blobs (
    tenant TEXT NOT NULL,
    kind TEXT NOT NULL,
    id TEXT NOT NULL,
    bytes BLOB NOT NULL,
    PRIMARY KEY (tenant, kind, id)
);

CREATE TABLE IF NOT EXISTS repositories (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    full_name TEXT NOT NULL,
    default_branch TEXT NOT NULL,
    UNIQUE (tenant_id, full_name)
);

CREATE TABLE IF NOT EXISTS ingestions (
    id TEXT PRIMARY KEY,
    idempotency_key TEXT NOT NULL UNIQUE,
    tenant_id TEXT NOT NULL,
    repo_id TEXT NOT NULL,
    commit_sha TEXT NOT NULL,
    pr_number INTEGER,
    state TEXT NOT NULL,
    head_snapshot_id TEXT,
    delta_id TEXT,
    score_id TEXT,
    error_message TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS snapshots (
    id TEXT PRIMARY KEY,
    repo_id TEXT NOT NULL,
    commit_sha TEXT NOT NULL,
    branch TEXT NOT NULL,
    UNIQUE (repo_id, commit_sha)
);

CREATE TABLE IF NOT EXISTS deltas (
    id TEXT PRIMARY KEY,
    base_snapshot_id TEXT NOT NULL,
    head_snapshot_id TEXT NOT NULL,
    UNIQUE (base_snapshot_id, head_snapshot_id)
);

CREATE TABLE IF NOT EXISTS scores (
    id TEXT PRIMARY KEY,
    repo_id TEXT NOT NULL,
    delta_id TEXT NOT NULL,
    base_snapshot_id TEXT NOT NULL,
    head_snapshot_id TEXT NOT NULL,
    pr_number INTEGER,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS baselines (
    repo_id TEXT PRIMARY KEY,
    snapshot_id TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// SQLite-backed implementation of both storage capabilities, following the
/// teacher's one-struct-per-adapter convention (`SqliteSnapshotStore`) but
/// completing what that struct left as a `todo!()`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_ingestion(row: &rusqlite::Row) -> rusqlite::Result<IngestionRow> {
        let state_str: String = row.get("state")?;
        let state = IngestionState::from_str(&state_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;
        let head_snapshot_id: Option<String> = row.get("head_snapshot_id")?;
        let delta_id: Option<String> = row.get("delta_id")?;
        let score_id: Option<String> = row.get("score_id")?;
        Ok(IngestionRow {
            id: parse_uuid(row.get::<_, String>("id")?)?,
            idempotency_key: row.get("idempotency_key")?,
            tenant_id: row.get("tenant_id")?,
            repo_id: row.get("repo_id")?,
            commit_sha: row.get("commit_sha")?,
            pr_number: row.get("pr_number")?,
            state,
            head_snapshot_id: head_snapshot_id.map(parse_uuid).transpose()?,
            delta_id: delta_id.map(parse_uuid).transpose()?,
            score_id: score_id.map(parse_uuid).transpose()?,
            error_message: row.get("error_message")?,
            created_at: row.get::<_, DateTime<Utc>>("created_at")?,
            updated_at: row.get::<_, DateTime<Utc>>("updated_at")?,
        })
    }
}

fn parse_uuid(s: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[async_trait]
impl BlobStore for SqliteStore {
    async fn put(&self, tenant: &str, kind: BlobKind, id: &str, bytes: Vec<u8>) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO blobs (tenant, kind, id, bytes) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(tenant, kind, id) DO UPDATE SET bytes = excluded.bytes",
            params![tenant, kind.as_str(), id, bytes],
        )?;
        Ok(())
    }

    async fn get(&self, tenant: &str, kind: BlobKind, id: &str) -> Result<Vec<u8>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT bytes FROM blobs WHERE tenant = ?1 AND kind = ?2 AND id = ?3",
            params![tenant, kind.as_str(), id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| StorageError::not_found(format!("blob {tenant}/{kind}/{id}.json absent")))
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn upsert_repository(
        &self,
        tenant_id: &str,
        full_name: &str,
        default_branch: &str,
    ) -> Result<RepositoryRow> {
        let conn = self.conn.lock();
        if let Some(row) = conn
            .query_row(
                "SELECT id, tenant_id, full_name, default_branch FROM repositories
                 WHERE tenant_id = ?1 AND full_name = ?2",
                params![tenant_id, full_name],
                |row| {
                    Ok(RepositoryRow {
                        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                        tenant_id: row.get(1)?,
                        full_name: row.get(2)?,
                        default_branch: row.get(3)?,
                    })
                },
            )
            .optional()?
        {
            return Ok(row);
        }
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO repositories (id, tenant_id, full_name, default_branch) VALUES (?1, ?2, ?3, ?4)",
            params![id.to_string(), tenant_id, full_name, default_branch],
        )?;
        Ok(RepositoryRow {
            id,
            tenant_id: tenant_id.to_string(),
            full_name: full_name.to_string(),
            default_branch: default_branch.to_string(),
        })
    }

    async fn get_repository(&self, repo_id: &str) -> Result<Option<RepositoryRow>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                "SELECT id, tenant_id, full_name, default_branch FROM repositories
                 WHERE id = ?1 OR full_name = ?1",
                params![repo_id],
                |row| {
                    Ok(RepositoryRow {
                        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                        tenant_id: row.get(1)?,
                        full_name: row.get(2)?,
                        default_branch: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }

    async fn upsert_ingestion(
        &self,
        idempotency_key: &str,
        tenant_id: &str,
        repo_id: &str,
        commit_sha: &str,
        pr_number: Option<i64>,
    ) -> Result<IngestionRow> {
        let conn = self.conn.lock();
        if let Some(row) = conn
            .query_row(
                "SELECT * FROM ingestions WHERE idempotency_key = ?1",
                params![idempotency_key],
                Self::row_to_ingestion,
            )
            .optional()?
        {
            return Ok(row);
        }
        let id = Uuid::new_v4();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO ingestions (id, idempotency_key, tenant_id, repo_id, commit_sha,
                pr_number, state, head_snapshot_id, delta_id, score_id, error_message,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, NULL, NULL, NULL, ?8, ?8)",
            params![
                id.to_string(),
                idempotency_key,
                tenant_id,
                repo_id,
                commit_sha,
                pr_number,
                IngestionState::Queued.as_str(),
                now,
            ],
        )?;
        Ok(IngestionRow {
            id,
            idempotency_key: idempotency_key.to_string(),
            tenant_id: tenant_id.to_string(),
            repo_id: repo_id.to_string(),
            commit_sha: commit_sha.to_string(),
            pr_number,
            state: IngestionState::Queued,
            head_snapshot_id: None,
            delta_id: None,
            score_id: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_ingestion(&self, id: Uuid) -> Result<Option<IngestionRow>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                "SELECT * FROM ingestions WHERE id = ?1",
                params![id.to_string()],
                Self::row_to_ingestion,
            )
            .optional()?)
    }

    async fn get_ingestion_by_key(&self, idempotency_key: &str) -> Result<Option<IngestionRow>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                "SELECT * FROM ingestions WHERE idempotency_key = ?1",
                params![idempotency_key],
                Self::row_to_ingestion,
            )
            .optional()?)
    }

    async fn transition_ingestion(
        &self,
        id: Uuid,
        state: IngestionState,
        error_message: Option<String>,
    ) -> Result<IngestionRow> {
        let conn = self.conn.lock();
        let now = Utc::now();
        let changed = conn.execute(
            "UPDATE ingestions SET state = ?1, error_message = ?2, updated_at = ?3 WHERE id = ?4",
            params![state.as_str(), error_message, now, id.to_string()],
        )?;
        if changed == 0 {
            return Err(StorageError::not_found(format!("ingestion {id} absent")));
        }
        conn.query_row(
            "SELECT * FROM ingestions WHERE id = ?1",
            params![id.to_string()],
            Self::row_to_ingestion,
        )
        .map_err(StorageError::from)
    }

    async fn attach_ingestion_artifacts(
        &self,
        id: Uuid,
        head_snapshot_id: Option<Uuid>,
        delta_id: Option<Uuid>,
        score_id: Option<Uuid>,
    ) -> Result<IngestionRow> {
        let conn = self.conn.lock();
        let now = Utc::now();
        conn.execute(
            "UPDATE ingestions SET
                head_snapshot_id = COALESCE(?1, head_snapshot_id),
                delta_id = COALESCE(?2, delta_id),
                score_id = COALESCE(?3, score_id),
                updated_at = ?4
             WHERE id = ?5",
            params![
                head_snapshot_id.map(|u| u.to_string()),
                delta_id.map(|u| u.to_string()),
                score_id.map(|u| u.to_string()),
                now,
                id.to_string(),
            ],
        )?;
        conn.query_row(
            "SELECT * FROM ingestions WHERE id = ?1",
            params![id.to_string()],
            Self::row_to_ingestion,
        )
        .map_err(StorageError::from)
    }

    async fn upsert_snapshot(
        &self,
        repo_id: &str,
        commit_sha: &str,
        snapshot_id: Uuid,
        branch: &str,
    ) -> Result<SnapshotRow> {
        let conn = self.conn.lock();
        if let Some(row) = conn
            .query_row(
                "SELECT id, repo_id, commit_sha, branch FROM snapshots
                 WHERE repo_id = ?1 AND commit_sha = ?2",
                params![repo_id, commit_sha],
                |row| {
                    Ok(SnapshotRow {
                        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                        repo_id: row.get(1)?,
                        commit_sha: row.get(2)?,
                        branch: row.get(3)?,
                    })
                },
            )
            .optional()?
        {
            return Ok(row);
        }
        conn.execute(
            "INSERT INTO snapshots (id, repo_id, commit_sha, branch) VALUES (?1, ?2, ?3, ?4)",
            params![snapshot_id.to_string(), repo_id, commit_sha, branch],
        )?;
        Ok(SnapshotRow {
            id: snapshot_id,
            repo_id: repo_id.to_string(),
            commit_sha: commit_sha.to_string(),
            branch: branch.to_string(),
        })
    }

    async fn get_snapshot(&self, id: Uuid) -> Result<Option<SnapshotRow>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                "SELECT id, repo_id, commit_sha, branch FROM snapshots WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok(SnapshotRow {
                        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                        repo_id: row.get(1)?,
                        commit_sha: row.get(2)?,
                        branch: row.get(3)?,
                    })
                },
            )
            .optional()?)
    }

    async fn upsert_delta(
        &self,
        base_snapshot_id: Uuid,
        head_snapshot_id: Uuid,
        delta_id: Uuid,
    ) -> Result<DeltaRow> {
        let conn = self.conn.lock();
        if let Some(row) = conn
            .query_row(
                "SELECT id, base_snapshot_id, head_snapshot_id FROM deltas
                 WHERE base_snapshot_id = ?1 AND head_snapshot_id = ?2",
                params![base_snapshot_id.to_string(), head_snapshot_id.to_string()],
                |row| {
                    Ok(DeltaRow {
                        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                        base_snapshot_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
                        head_snapshot_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap(),
                    })
                },
            )
            .optional()?
        {
            return Ok(row);
        }
        conn.execute(
            "INSERT INTO deltas (id, base_snapshot_id, head_snapshot_id) VALUES (?1, ?2, ?3)",
            params![delta_id.to_string(), base_snapshot_id.to_string(), head_snapshot_id.to_string()],
        )?;
        Ok(DeltaRow {
            id: delta_id,
            base_snapshot_id,
            head_snapshot_id,
        })
    }

    async fn get_delta(&self, id: Uuid) -> Result<Option<DeltaRow>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                "SELECT id, base_snapshot_id, head_snapshot_id FROM deltas WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok(DeltaRow {
                        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                        base_snapshot_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
                        head_snapshot_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap(),
                    })
                },
            )
            .optional()?)
    }

    async fn insert_score(
        &self,
        repo_id: &str,
        delta_id: Uuid,
        base_snapshot_id: Uuid,
        head_snapshot_id: Uuid,
        pr_number: Option<i64>,
        payload: String,
    ) -> Result<ScoreRow> {
        let conn = self.conn.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO scores (id, repo_id, delta_id, base_snapshot_id, head_snapshot_id,
                pr_number, payload, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id.to_string(),
                repo_id,
                delta_id.to_string(),
                base_snapshot_id.to_string(),
                head_snapshot_id.to_string(),
                pr_number,
                payload,
                now,
            ],
        )?;
        Ok(ScoreRow {
            id,
            repo_id: repo_id.to_string(),
            delta_id,
            base_snapshot_id,
            head_snapshot_id,
            pr_number,
            payload,
            created_at: now,
        })
    }

    async fn update_score_payload(&self, id: Uuid, payload: String) -> Result<ScoreRow> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE scores SET payload = ?1 WHERE id = ?2",
            params![payload, id.to_string()],
        )?;
        if changed == 0 {
            return Err(StorageError::not_found(format!("score {id} absent")));
        }
        conn.query_row(
            "SELECT id, repo_id, delta_id, base_snapshot_id, head_snapshot_id, pr_number, payload, created_at
             FROM scores WHERE id = ?1",
            params![id.to_string()],
            row_to_score,
        )
        .map_err(StorageError::from)
    }

    async fn get_score(&self, id: Uuid) -> Result<Option<ScoreRow>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                "SELECT id, repo_id, delta_id, base_snapshot_id, head_snapshot_id, pr_number, payload, created_at
                 FROM scores WHERE id = ?1",
                params![id.to_string()],
                row_to_score,
            )
            .optional()?)
    }

    async fn list_scores_by_repo(&self, repo_id: &str) -> Result<Vec<ScoreRow>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, repo_id, delta_id, base_snapshot_id, head_snapshot_id, pr_number, payload, created_at
             FROM scores WHERE repo_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map(params![repo_id], row_to_score)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    async fn get_baseline(&self, repo_id: &str) -> Result<Option<BaselineRow>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                "SELECT repo_id, snapshot_id, updated_at FROM baselines WHERE repo_id = ?1",
                params![repo_id],
                |row| {
                    Ok(BaselineRow {
                        repo_id: row.get(0)?,
                        snapshot_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
                        updated_at: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    async fn set_baseline(&self, repo_id: &str, snapshot_id: Uuid) -> Result<BaselineRow> {
        let conn = self.conn.lock();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO baselines (repo_id, snapshot_id, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(repo_id) DO UPDATE SET snapshot_id = excluded.snapshot_id, updated_at = excluded.updated_at",
            params![repo_id, snapshot_id.to_string(), now],
        )?;
        Ok(BaselineRow {
            repo_id: repo_id.to_string(),
            snapshot_id,
            updated_at: now,
        })
    }
}

fn row_to_score(row: &rusqlite::Row) -> rusqlite::Result<ScoreRow> {
    Ok(ScoreRow {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
        repo_id: row.get(1)?,
        delta_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap(),
        base_snapshot_id: Uuid::parse_str(&row.get::<_, String>(3)?).unwrap(),
        head_snapshot_id: Uuid::parse_str(&row.get::<_, String>(4)?).unwrap(),
        pr_number: row.get(5)?,
        payload: row.get(6)?,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blob_roundtrip_and_overwrite() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.put("acme", BlobKind::Snapshots, "s1", b"v1".to_vec()).await.unwrap();
        assert_eq!(store.get("acme", BlobKind::Snapshots, "s1").await.unwrap(), b"v1");
        store.put("acme", BlobKind::Snapshots, "s1", b"v2".to_vec()).await.unwrap();
        assert_eq!(store.get("acme", BlobKind::Snapshots, "s1").await.unwrap(), b"v2");
    }

    #[tokio::test]
    async fn blob_not_found() {
        let store = SqliteStore::new_in_memory().unwrap();
        let err = store.get("acme", BlobKind::Deltas, "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn ingestion_idempotency_convergence() {
        let store = SqliteStore::new_in_memory().unwrap();
        let a = store.upsert_ingestion("k1", "acme", "repo", "sha", None).await.unwrap();
        let b = store.upsert_ingestion("k1", "acme", "repo", "sha", None).await.unwrap();
        assert_eq!(a.id, b.id);
    }

    #[tokio::test]
    async fn ingestion_state_transitions_persist() {
        let store = SqliteStore::new_in_memory().unwrap();
        let row = store.upsert_ingestion("k2", "acme", "repo", "sha", None).await.unwrap();
        let updated = store
            .transition_ingestion(row.id, IngestionState::Running, None)
            .await
            .unwrap();
        assert_eq!(updated.state, IngestionState::Running);
        let failed = store
            .transition_ingestion(row.id, IngestionState::Failed, Some("boom".to_string()))
            .await
            .unwrap();
        assert_eq!(failed.state, IngestionState::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn snapshot_uniqueness_returns_existing_id() {
        let store = SqliteStore::new_in_memory().unwrap();
        let first = Uuid::new_v4();
        let row_a = store.upsert_snapshot("repo", "sha1", first, "main").await.unwrap();
        let row_b = store.upsert_snapshot("repo", "sha1", Uuid::new_v4(), "main").await.unwrap();
        assert_eq!(row_a.id, row_b.id);
        assert_eq!(row_b.id, first);
    }

    #[tokio::test]
    async fn baseline_last_writer_wins() {
        let store = SqliteStore::new_in_memory().unwrap();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        store.set_baseline("repo", first).await.unwrap();
        let updated = store.set_baseline("repo", second).await.unwrap();
        assert_eq!(updated.snapshot_id, second);
    }

    #[tokio::test]
    async fn score_rescore_updates_in_place() {
        let store = SqliteStore::new_in_memory().unwrap();
        let (base, head, delta) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let score = store
            .insert_score("repo", delta, base, head, None, "{\"total_score\":1.0}".to_string())
            .await
            .unwrap();
        let rescored = store
            .update_score_payload(score.id, "{\"total_score\":2.0}".to_string())
            .await
            .unwrap();
        assert_eq!(rescored.payload, "{\"total_score\":2.0}");
    }
}
