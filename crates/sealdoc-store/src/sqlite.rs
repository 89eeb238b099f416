//! SQLite implementation of the Store trait.
//!
//! This is the persistent backend for the registry. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking. Each commit
//! runs in a single transaction.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use sealdoc_core::{
    DocumentId, DocumentRecord, LedgerEntry, LedgerPosition, Principal, SecretHandle,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{Commit, LedgerHead, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Background(e.to_string()))?
    }
}

fn blob32(row: &rusqlite::Row<'_>, column: &str) -> rusqlite::Result<[u8; 32]> {
    let idx = row.as_ref().column_index(column)?;
    let bytes: Vec<u8> = row.get(idx)?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Blob,
            format!("{column}: expected 32 bytes, got {}", bytes.len()).into(),
        )
    })
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRecord> {
    Ok(DocumentRecord {
        id: DocumentId(row.get::<_, i64>("id")? as u64),
        owner: Principal::from_bytes(blob32(row, "owner")?),
        name: row.get("name")?,
        body: row.get("body")?,
        secret_handle: SecretHandle::from_bytes(blob32(row, "secret_handle")?),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        last_mutation: LedgerPosition(row.get::<_, i64>("last_mutation")? as u64),
    })
}

fn collect_ids(tx: &Connection, sql: &str, principal: &Principal) -> Result<Vec<DocumentId>> {
    let mut stmt = tx.prepare_cached(sql)?;
    let ids = stmt
        .query_map(params![principal.as_bytes().as_slice()], |row| {
            row.get::<_, i64>(0)
        })?
        .map(|id| id.map(|id| DocumentId(id as u64)))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

fn current_head(conn: &Connection) -> Result<LedgerHead> {
    let head = conn
        .query_row(
            "SELECT position, timestamp FROM ledger ORDER BY position DESC LIMIT 1",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;

    Ok(match head {
        Some((position, timestamp)) => LedgerHead {
            position: LedgerPosition(position as u64),
            timestamp: Some(timestamp),
        },
        None => LedgerHead::default(),
    })
}

fn document_exists(tx: &Transaction<'_>, id: DocumentId) -> Result<bool> {
    Ok(tx
        .query_row(
            "SELECT 1 FROM documents WHERE id = ?1",
            params![id.get() as i64],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

/// Apply one commit inside an open transaction.
fn apply(tx: &Transaction<'_>, commit: Commit) -> Result<LedgerEntry> {
    let position = current_head(tx)?.position.next();
    let pos = position.0 as i64;

    let document_id = match &commit {
        Commit::CreateDocument {
            first_id,
            owner,
            name,
            body,
            secret_handle,
            timestamp,
        } => {
            let last: Option<i64> =
                tx.query_row("SELECT MAX(id) FROM documents", [], |row| row.get(0))?;
            let id = match last.map(|last| DocumentId(last as u64)) {
                Some(last) => last.next().ok_or(StoreError::IdSpaceExhausted(last))?,
                None => *first_id,
            };

            tx.execute(
                "INSERT INTO documents (
                    id, owner, name, body, secret_handle, created_at, updated_at, last_mutation
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7)",
                params![
                    id.get() as i64,
                    owner.as_bytes().as_slice(),
                    name,
                    body,
                    secret_handle.as_bytes().as_slice(),
                    timestamp,
                    pos,
                ],
            )?;
            id
        }

        Commit::UpdateBody {
            document_id,
            body,
            timestamp,
            ..
        } => {
            let changed = tx.execute(
                "UPDATE documents SET body = ?2, updated_at = ?3, last_mutation = ?4
                 WHERE id = ?1",
                params![document_id.get() as i64, body, timestamp, pos],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(*document_id));
            }
            *document_id
        }

        Commit::GrantAccess {
            document_id,
            grantee,
            ..
        } => {
            if !document_exists(tx, *document_id)? {
                return Err(StoreError::NotFound(*document_id));
            }
            tx.execute(
                "INSERT OR IGNORE INTO shares (principal, document_id, granted_at)
                 VALUES (?1, ?2, ?3)",
                params![grantee.as_bytes().as_slice(), document_id.get() as i64, pos],
            )?;
            *document_id
        }
    };

    let entry = LedgerEntry {
        position,
        timestamp: commit.timestamp(),
        event: commit.event(document_id),
    };
    tx.execute(
        "INSERT INTO ledger (position, timestamp, document_id, entry) VALUES (?1, ?2, ?3, ?4)",
        params![pos, entry.timestamp, document_id.get() as i64, entry.to_cbor()?],
    )?;

    Ok(entry)
}

#[async_trait]
impl Store for SqliteStore {
    async fn commit(&self, commit: Commit) -> Result<LedgerEntry> {
        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let entry = apply(&tx, commit)?;
            tx.commit()?;
            Ok(entry)
        })
        .await
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<DocumentRecord>> {
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT * FROM documents WHERE id = ?1",
                params![id.get() as i64],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn owned_document_ids(&self, owner: &Principal) -> Result<Vec<DocumentId>> {
        let owner = *owner;
        self.blocking(move |conn| {
            collect_ids(
                conn,
                "SELECT id FROM documents WHERE owner = ?1 ORDER BY id",
                &owner,
            )
        })
        .await
    }

    async fn shared_document_ids(&self, principal: &Principal) -> Result<Vec<DocumentId>> {
        let principal = *principal;
        self.blocking(move |conn| {
            collect_ids(
                conn,
                "SELECT document_id FROM shares WHERE principal = ?1 ORDER BY granted_at",
                &principal,
            )
        })
        .await
    }

    async fn last_document_id(&self) -> Result<Option<DocumentId>> {
        self.blocking(|conn| {
            let last: Option<i64> =
                conn.query_row("SELECT MAX(id) FROM documents", [], |row| row.get(0))?;
            Ok(last.map(|id| DocumentId(id as u64)))
        })
        .await
    }

    async fn document_count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    async fn head(&self) -> Result<LedgerHead> {
        self.blocking(|conn| current_head(conn)).await
    }

    async fn entries_since(&self, after: LedgerPosition) -> Result<Vec<LedgerEntry>> {
        self.blocking(move |conn| {
            let mut stmt = conn
                .prepare_cached("SELECT entry FROM ledger WHERE position > ?1 ORDER BY position")?;
            let blobs = stmt
                .query_map(params![after.0 as i64], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            blobs
                .iter()
                .map(|bytes| LedgerEntry::from_cbor(bytes).map_err(StoreError::from))
                .collect()
        })
        .await
    }
}
