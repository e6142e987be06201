// src/load/mod.rs
use crate::{
    duck::{count_rows, sql_literal, table_columns},
    error::{HexError, Result},
    schema::{RawRecord, RAW_TABLE, REQUIRED_COLUMNS},
};
use duckdb::{params, Connection};
use std::{io, path::Path};
use tracing::{debug, info, warn};

/// Load CSV exports into the raw table, in order.
///
/// The first file creates the table and fixes its column set. Every later file
/// must declare exactly the same columns, in the same order, and its rows must
/// cast into the table's types, or the load stops with `SchemaMismatch` naming
/// that file.
///
/// The whole load is one transaction: on any error the raw table is rolled
/// back, so a failed load never leaves a partial table behind.
///
/// Returns the raw table's row count after loading.
#[tracing::instrument(level = "info", skip_all, fields(files = files.len()))]
pub fn load_sources<P: AsRef<Path>>(conn: &Connection, files: &[P]) -> Result<i64> {
    if files.is_empty() {
        return Err(HexError::SchemaMismatch {
            file: "<none>".into(),
            detail: "no source files given".into(),
        });
    }
    for path in files {
        ensure_exists(path.as_ref())?;
    }

    conn.execute_batch("BEGIN TRANSACTION;")?;
    match load_in_transaction(conn, files) {
        Ok(rows) => {
            conn.execute_batch("COMMIT;")?;
            Ok(rows)
        }
        Err(e) => {
            if let Err(rollback) = conn.execute_batch("ROLLBACK;") {
                warn!("rollback after failed load: {}", rollback);
            }
            Err(e)
        }
    }
}

fn load_in_transaction<P: AsRef<Path>>(conn: &Connection, files: &[P]) -> Result<i64> {
    let (first, rest) = match files.split_first() {
        Some(split) => split,
        None => return Ok(0),
    };

    let first = first.as_ref();
    info!("loading {}", display_name(first));
    conn.execute_batch(&format!(
        "CREATE TABLE {RAW_TABLE} AS SELECT * FROM read_csv_auto({});",
        sql_literal(&first.to_string_lossy())
    ))?;

    let expected = table_columns(conn, RAW_TABLE)?;
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|req| !expected.iter().any(|c| c == req))
        .collect();
    if !missing.is_empty() {
        return Err(HexError::SchemaMismatch {
            file: display_name(first),
            detail: format!("missing required columns {:?}", missing),
        });
    }
    debug!(columns = ?expected, "raw table schema");

    for path in rest {
        let path = path.as_ref();
        info!("loading {}", display_name(path));

        let found = csv_columns(conn, path)?;
        if found != expected {
            return Err(HexError::SchemaMismatch {
                file: display_name(path),
                detail: format!("expected columns {:?}, found {:?}", expected, found),
            });
        }

        let appended = conn
            .execute(
                &format!(
                    "INSERT INTO {RAW_TABLE} SELECT * FROM read_csv_auto({})",
                    sql_literal(&path.to_string_lossy())
                ),
                [],
            )
            .map_err(|e| HexError::SchemaMismatch {
                file: display_name(path),
                detail: format!("rows do not fit the raw table: {e}"),
            })?;
        debug!(rows = appended, "appended");
    }

    count_rows(conn, RAW_TABLE)
}

/// Create the raw table with just the required columns, if absent.
pub fn create_raw_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {RAW_TABLE}(
            h3_res8_id VARCHAR,
            provider_id BIGINT,
            brand_name VARCHAR,
            technology INTEGER,
            max_advertised_download_speed INTEGER,
            max_advertised_upload_speed INTEGER,
            low_latency INTEGER
        );"
    ))?;
    Ok(())
}

/// Bulk-append typed records through the appender.
/// The table must have been made by [`create_raw_table`].
pub fn append_records(conn: &Connection, records: &[RawRecord]) -> Result<usize> {
    let mut appender = conn.appender(RAW_TABLE)?;
    for rec in records {
        appender.append_row(params![
            rec.h3_res8_id,
            rec.provider_id,
            rec.brand_name,
            rec.technology,
            rec.max_advertised_download_speed,
            rec.max_advertised_upload_speed,
            rec.low_latency,
        ])?;
    }
    appender.flush()?;
    Ok(records.len())
}

/// Column names the CSV reader sees in `path`, without loading it.
fn csv_columns(conn: &Connection, path: &Path) -> Result<Vec<String>> {
    let sql = format!(
        "DESCRIBE SELECT * FROM read_csv_auto({})",
        sql_literal(&path.to_string_lossy())
    );
    let mut stmt = conn.prepare(&sql)?;
    let cols = stmt
        .query_map([], |r| r.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(cols)
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(HexError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("source file {} not found", path.display()),
        )))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
