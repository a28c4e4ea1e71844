//! Keyed binary payload store backed by SQLite.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{Result, StoreError};

/// Payload namespaces sharing the one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Staged name or usage, keyed by node identity.
    Node,
    /// Raw source record, keyed by verbatim key.
    Verbatim,
    Reference,
    Metadata,
}

impl PayloadKind {
    fn code(self) -> i64 {
        match self {
            PayloadKind::Node => 1,
            PayloadKind::Verbatim => 2,
            PayloadKind::Reference => 3,
            PayloadKind::Metadata => 4,
        }
    }
}

const SCHEMA: &str = "
    PRAGMA synchronous = OFF;
    PRAGMA journal_mode = MEMORY;
    CREATE TABLE IF NOT EXISTS payload (
        kind INTEGER NOT NULL,
        key  INTEGER NOT NULL,
        data BLOB NOT NULL,
        PRIMARY KEY (kind, key)
    ) WITHOUT ROWID;
";

fn sqlite(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> StoreError {
    move |source| StoreError::Sqlite { operation, source }
}

pub struct PayloadStore {
    conn: Connection,
}

impl PayloadStore {
    /// Opens the database file at `path`, or an in-memory database.
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let conn = match path {
            Some(path) => Connection::open(path).map_err(sqlite("open database"))?,
            None => Connection::open_in_memory().map_err(sqlite("open in-memory database"))?,
        };
        conn.execute_batch(SCHEMA)
            .map_err(sqlite("initialize schema"))?;
        Ok(Self { conn })
    }

    pub fn put(&self, kind: PayloadKind, key: u64, data: &[u8]) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO payload (kind, key, data) VALUES (?1, ?2, ?3)",
                params![kind.code(), key.cast_signed(), data],
            )
            .map_err(sqlite("write payload"))?;
        Ok(())
    }

    pub fn get(&self, kind: PayloadKind, key: u64) -> Result<Option<Vec<u8>>> {
        self.conn
            .query_row(
                "SELECT data FROM payload WHERE kind = ?1 AND key = ?2",
                params![kind.code(), key.cast_signed()],
                |row| row.get(0),
            )
            .optional()
            .map_err(sqlite("read payload"))
    }

    pub fn delete(&self, kind: PayloadKind, key: u64) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM payload WHERE kind = ?1 AND key = ?2",
                params![kind.code(), key.cast_signed()],
            )
            .map_err(sqlite("delete payload"))?;
        Ok(changed > 0)
    }

    /// All keys of one kind in ascending order.
    pub fn keys(&self, kind: PayloadKind) -> Result<Vec<u64>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT key FROM payload WHERE kind = ?1 ORDER BY key")
            .map_err(sqlite("list keys"))?;
        let keys = stmt
            .query_map(params![kind.code()], |row| row.get::<_, i64>(0))
            .map_err(sqlite("list keys"))?
            .map(|key| key.map(i64::cast_unsigned))
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(sqlite("list keys"))?;
        Ok(keys)
    }

    pub fn count(&self, kind: PayloadKind) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM payload WHERE kind = ?1",
                params![kind.code()],
                |row| row.get(0),
            )
            .map_err(sqlite("count payloads"))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub fn begin(&self) -> Result<()> {
        self.conn
            .execute_batch("BEGIN")
            .map_err(sqlite("begin transaction"))
    }

    pub fn commit(&self) -> Result<()> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(sqlite("commit transaction"))
    }

    pub fn rollback(&self) -> Result<()> {
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(sqlite("roll back transaction"))
    }

    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, source)| StoreError::Sqlite {
                operation: "close database",
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let store = PayloadStore::open(None).unwrap();
        store.put(PayloadKind::Node, 3, b"abc").unwrap();
        store.put(PayloadKind::Verbatim, 3, b"xyz").unwrap();
        assert_eq!(store.get(PayloadKind::Node, 3).unwrap(), Some(b"abc".to_vec()));
        store.put(PayloadKind::Node, 3, b"abd").unwrap();
        assert_eq!(store.get(PayloadKind::Node, 3).unwrap(), Some(b"abd".to_vec()));
        assert!(store.delete(PayloadKind::Node, 3).unwrap());
        assert_eq!(store.get(PayloadKind::Node, 3).unwrap(), None);
        assert_eq!(store.count(PayloadKind::Verbatim).unwrap(), 1);
    }

    #[test]
    fn test_rollback_discards_writes() {
        let store = PayloadStore::open(None).unwrap();
        store.put(PayloadKind::Reference, 1, b"r1").unwrap();
        store.begin().unwrap();
        store.put(PayloadKind::Reference, 2, b"r2").unwrap();
        store.delete(PayloadKind::Reference, 1).unwrap();
        store.rollback().unwrap();
        assert_eq!(store.keys(PayloadKind::Reference).unwrap(), vec![1]);
    }
}
