use std::path::Path;

use rusqlite::Connection;

use crate::error::StoreError;
use crate::schema::SCHEMA_SQL;

/// Embedded persistence for the three aggregate tables: `open`/`open_memory` constructors,
/// WAL mode, and a bare `rusqlite::Connection` rather than a pool, since `Connection` is
/// `!Sync` and callers are expected to wrap a `Store` in `Arc<Mutex<Store>>`.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}
