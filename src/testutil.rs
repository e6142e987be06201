//! Fixtures shared by the unit tests.

use crate::{
    aggregate,
    duck::Store,
    load,
    schema::RawRecord,
};
use anyhow::Result;
use std::path::{Path, PathBuf};

pub const CSV_HEADER: &str = "frn,provider_id,brand_name,location_id,technology,\
max_advertised_download_speed,max_advertised_upload_speed,low_latency,\
business_residential_code,state_usps,block_geoid,h3_res8_id";

pub const EXAMPLE_HEX: &str = "8844d6abffffff";

/// One CSV line in BDC export column order.
pub fn csv_row(
    hex: &str,
    provider_id: i64,
    brand: &str,
    technology: i32,
    down: i32,
    up: i32,
    low_latency: i32,
) -> String {
    format!(
        "{frn},{provider_id},{brand},{loc},{technology},{down},{up},{low_latency},R,MD,240054012001000,{hex}",
        frn = 4_000_000 + provider_id,
        loc = 1_100_000_000 + provider_id * 100 + technology as i64,
    )
}

pub fn write_csv(dir: &Path, name: &str, rows: &[String]) -> Result<PathBuf> {
    let path = dir.join(name);
    let mut body = String::from(CSV_HEADER);
    body.push('\n');
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    std::fs::write(&path, body)?;
    Ok(path)
}

fn record(hex: &str, provider_id: i64, brand: &str, tech: i32, down: i32, up: i32, ll: i32) -> RawRecord {
    RawRecord {
        h3_res8_id: hex.to_string(),
        provider_id,
        brand_name: brand.to_string(),
        technology: tech,
        max_advertised_download_speed: down,
        max_advertised_upload_speed: up,
        low_latency: ll,
    }
}

/// The three-row hex used throughout the docs.
pub fn example_records() -> Vec<RawRecord> {
    vec![
        record(EXAMPLE_HEX, 1, "ProviderA", 40, 1200, 100, 0),
        record(EXAMPLE_HEX, 1, "ProviderA", 50, 5000, 5000, 1),
        record(EXAMPLE_HEX, 2, "ProviderB", 40, 1200, 100, 0),
    ]
}

/// Example hex plus two more cells with distinct shapes.
pub fn mixed_records() -> Vec<RawRecord> {
    let mut recs = example_records();
    recs.extend([
        record("882a100d25fffff", 3, "Comcast", 40, 1200, 35, 0),
        record("882a100d25fffff", 4, "Verizon", 50, 2000, 2000, 0),
        record("882a100d25fffff", 5, "Starlink", 61, 220, 20, 1),
        record("882a100d25fffff", 4, "Verizon", 50, 2000, 2000, 0),
        record("88aa000000fffff", 6, "HughesNet", 60, 100, 3, 0),
    ]);
    recs
}

/// In-memory store with `records` loaded and the summary built.
pub fn built_store(records: &[RawRecord]) -> Result<Store> {
    let store = Store::open_in_memory()?;
    let conn = store.connect()?;
    load::create_raw_table(&conn)?;
    load::append_records(&conn, records)?;
    aggregate::build_summary(&conn)?;
    Ok(store)
}
