//! SQLite schema versions.
//!
//! Applied versions are recorded in `schema_migrations`; every pending batch
//! runs in one transaction.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, StoreError};

/// Schema batches in order; entry `n` moves the schema from `n` to `n + 1`.
const MIGRATIONS: &[&str] = &[SCHEMA_V1];

/// Schema version this build writes.
pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

/// Bring the schema up to [`CURRENT_VERSION`]. A no-op when already there.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (version INTEGER PRIMARY KEY);",
    )?;

    let applied: u32 = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get::<_, Option<u32>>(0)
        })
        .optional()?
        .flatten()
        .unwrap_or(0);

    let pending = MIGRATIONS.get(applied as usize..).ok_or_else(|| {
        StoreError::Migration(format!(
            "database schema v{applied} is newer than supported v{CURRENT_VERSION}"
        ))
    })?;
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, batch) in (applied + 1..).zip(pending) {
        tx.execute_batch(batch)?;
        tx.execute("INSERT INTO schema_migrations (version) VALUES (?1)", [version])?;
        tracing::debug!(version, "applied schema migration");
    }
    tx.commit()?;
    Ok(())
}

const SCHEMA_V1: &str = r#"
    -- One row per document; never deleted
    CREATE TABLE documents (
        id INTEGER PRIMARY KEY,
        owner BLOB NOT NULL,              -- 32 bytes, Ed25519 public key
        name TEXT NOT NULL,
        body TEXT NOT NULL,               -- envelope payload, '' when empty
        secret_handle BLOB NOT NULL,      -- 32 bytes
        created_at INTEGER NOT NULL,      -- ledger time (Unix ms)
        updated_at INTEGER NOT NULL,
        last_mutation INTEGER NOT NULL    -- ledger position
    );

    -- Share index; the primary key keeps pairs unique
    CREATE TABLE shares (
        principal BLOB NOT NULL,
        document_id INTEGER NOT NULL REFERENCES documents(id),
        granted_at INTEGER NOT NULL,      -- ledger position of the first grant
        PRIMARY KEY (principal, document_id)
    );

    -- Append-only mutation log
    CREATE TABLE ledger (
        position INTEGER PRIMARY KEY,
        timestamp INTEGER NOT NULL,
        document_id INTEGER NOT NULL,
        entry BLOB NOT NULL               -- CBOR LedgerEntry
    );

    CREATE INDEX idx_documents_owner ON documents(owner, id);
    CREATE INDEX idx_shares_principal ON shares(principal, granted_at);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in ["documents", "shares", "ledger", "schema_migrations"] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute("INSERT INTO schema_migrations (version) VALUES (99)", [])
            .unwrap();

        assert!(matches!(migrate(&mut conn), Err(StoreError::Migration(_))));
    }
}
