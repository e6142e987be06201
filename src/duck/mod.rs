use crate::error::{HexError, Result};
use duckdb::{params, Connection};
use std::{path::Path, sync::Mutex};
use tracing::debug;

/// Handle on one DuckDB database, owned by whoever builds or queries it.
///
/// Each caller gets its own connection via [`Store::connect`], so readers
/// never share a connection; the mutex only guards the cloning.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open a DuckDB database on disk at `path`, creating the file if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening duckdb");
        let conn = Connection::open(path).map_err(|e| {
            HexError::StorageUnavailable(format!("cannot open {}: {}", path.display(), e))
        })?;
        Ok(Store {
            conn: Mutex::new(conn),
        })
    }

    /// Open a DuckDB in‐memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| HexError::StorageUnavailable(format!("cannot open in-memory db: {e}")))?;
        Ok(Store {
            conn: Mutex::new(conn),
        })
    }

    /// A fresh connection to the same database.
    pub fn connect(&self) -> Result<Connection> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| HexError::StorageUnavailable("connection lock poisoned".into()))?;
        guard
            .try_clone()
            .map_err(|e| HexError::StorageUnavailable(format!("cannot clone connection: {e}")))
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        table_exists(&self.connect()?, table)
    }

    pub fn count_rows(&self, table: &str) -> Result<i64> {
        count_rows(&self.connect()?, table)
    }
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM duckdb_tables() WHERE table_name = ?",
        params![table],
        |r| r.get(0),
    )?;
    Ok(n > 0)
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    Ok(conn.query_row(&sql, [], |r| r.get(0))?)
}

/// Column names of `table`, in declaration order.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT column_name FROM information_schema.columns \
         WHERE table_name = ? ORDER BY ordinal_position",
    )?;
    let cols = stmt
        .query_map(params![table], |r| r.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(cols)
}

/// Render `s` as a single-quoted SQL string literal.
pub fn sql_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Render `s` as a double-quoted SQL identifier.
pub fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
