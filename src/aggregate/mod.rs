// src/aggregate/mod.rs
use crate::{
    duck::count_rows,
    error::{HexError, Result},
    schema::{RAW_TABLE, SUMMARY_TABLE},
    score::HexMetrics,
};
use duckdb::Connection;
use tracing::{info, warn};

/// One row of the summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexSummary {
    pub hex_id: String,
    pub provider_count: i32,
    pub brand_count: i32,
    pub max_download: i32,
    pub max_upload: i32,
    pub tech_count: i32,
    /// Distinct technology codes, ascending.
    pub technologies: Vec<i32>,
    pub location_count: i32,
    pub has_low_latency: bool,
}

impl HexSummary {
    pub fn metrics(&self) -> HexMetrics {
        HexMetrics {
            providers: self.provider_count,
            max_download: self.max_download,
            max_upload: self.max_upload,
            tech_count: self.tech_count,
        }
    }
}

/// Select list that reads a summary row back in `HexSummary` field order.
pub(crate) const SUMMARY_COLUMNS: &str = "h3_res8_id, provider_count, brand_count, max_download, \
     max_upload, tech_count, list_aggr(technologies, 'string_agg', ','), location_count, \
     has_low_latency";

/// Map a row selected with [`SUMMARY_COLUMNS`].
pub(crate) fn summary_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<HexSummary> {
    let techs: Option<String> = row.get(6)?;
    Ok(HexSummary {
        hex_id: row.get(0)?,
        provider_count: row.get(1)?,
        brand_count: row.get(2)?,
        max_download: row.get(3)?,
        max_upload: row.get(4)?,
        tech_count: row.get(5)?,
        technologies: parse_codes(techs.as_deref()),
        location_count: row.get(7)?,
        has_low_latency: row.get(8)?,
    })
}

fn parse_codes(joined: Option<&str>) -> Vec<i32> {
    joined
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect()
}

/// Rebuild the summary table from the raw table in one grouped pass.
///
/// Any previous summary is dropped first; rows come out ordered by hex id with
/// sorted technology lists, so rebuilding from the same raw table is
/// reproducible. Raw rows without a hex id belong to no cell and are skipped.
/// Counts and maxima are cast to 32-bit INTEGER; a value that does not fit
/// fails the build instead of widening, and the previous summary is kept.
///
/// Also creates the hex-id indexes on both tables. Returns the number of hexes.
#[tracing::instrument(level = "info", skip(conn))]
pub fn build_summary(conn: &Connection) -> Result<i64> {
    let orphans: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {RAW_TABLE} WHERE h3_res8_id IS NULL"),
        [],
        |r| r.get(0),
    )?;
    if orphans > 0 {
        warn!(rows = orphans, "skipping raw rows without a hex id");
    }

    info!("creating {} aggregation table", SUMMARY_TABLE);
    conn.execute_batch("BEGIN TRANSACTION;")?;
    let built = conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {SUMMARY_TABLE};
         CREATE TABLE {SUMMARY_TABLE} AS
         SELECT
           h3_res8_id,
           CAST(COUNT(DISTINCT provider_id) AS INTEGER) AS provider_count,
           CAST(COUNT(DISTINCT brand_name) AS INTEGER) AS brand_count,
           CAST(COALESCE(MAX(max_advertised_download_speed), 0) AS INTEGER) AS max_download,
           CAST(COALESCE(MAX(max_advertised_upload_speed), 0) AS INTEGER) AS max_upload,
           CAST(COUNT(DISTINCT technology) AS INTEGER) AS tech_count,
           list_sort(list_distinct(LIST(CAST(technology AS INTEGER)))) AS technologies,
           CAST(COUNT(*) AS INTEGER) AS location_count,
           COALESCE(BOOL_OR(low_latency = 1), false) AS has_low_latency
         FROM {RAW_TABLE}
         WHERE h3_res8_id IS NOT NULL
         GROUP BY h3_res8_id
         ORDER BY h3_res8_id;
         CREATE INDEX idx_hex ON {SUMMARY_TABLE}(h3_res8_id);
         CREATE INDEX IF NOT EXISTS idx_broadband_hex ON {RAW_TABLE}(h3_res8_id);"
    ));
    match built {
        Ok(()) => conn.execute_batch("COMMIT;")?,
        Err(e) => {
            if let Err(rollback) = conn.execute_batch("ROLLBACK;") {
                warn!("rollback after failed aggregation: {}", rollback);
            }
            return Err(e.into());
        }
    }

    let hexes = count_rows(conn, SUMMARY_TABLE)?;
    let rows = count_rows(conn, RAW_TABLE)?;
    info!(records = rows, hexes, "summary built");
    Ok(hexes)
}

/// Verify the row invariants of a built summary against its raw table:
/// providers never exceed locations, maxima are non-negative, every populated
/// hex lists at least one technology, and each location count matches the raw
/// rows for that hex.
pub fn check_invariants(conn: &Connection) -> Result<()> {
    let bad_rows: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {SUMMARY_TABLE}
             WHERE provider_count > location_count
                OR max_download < 0
                OR max_upload < 0
                OR (location_count > 0 AND len(technologies) = 0)"
        ),
        [],
        |r| r.get(0),
    )?;

    let miscounted: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {SUMMARY_TABLE} s
             FULL OUTER JOIN (
               SELECT h3_res8_id, COUNT(*) AS n FROM {RAW_TABLE}
               WHERE h3_res8_id IS NOT NULL
               GROUP BY h3_res8_id
             ) b ON s.h3_res8_id = b.h3_res8_id
             WHERE s.h3_res8_id IS NULL OR b.h3_res8_id IS NULL OR s.location_count <> b.n"
        ),
        [],
        |r| r.get(0),
    )?;

    if bad_rows > 0 || miscounted > 0 {
        warn!(bad_rows, miscounted, "summary invariants violated");
        return Err(HexError::Integrity(format!(
            "{bad_rows} rows break field invariants, {miscounted} hexes disagree with raw counts"
        )));
    }
    Ok(())
}
