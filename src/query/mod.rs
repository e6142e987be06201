// src/query/mod.rs
use crate::{
    aggregate::{summary_from_row, HexSummary, SUMMARY_COLUMNS},
    duck::Store,
    error::{HexError, Result},
    schema::{Technology, RAW_TABLE, SUMMARY_TABLE},
    score::{self, HexMetrics},
};
use duckdb::params;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Hex cell ids are hexadecimal H3 indexes (15 digits at resolution 8).
static HEX_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{1,16}$").expect("hex id pattern should be valid")
});

/// One entry of the bulk listing: the four metrics a client needs to score
/// the hex itself. Library clients score it through [`HexListing::metrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HexListing {
    pub id: String,
    pub providers: i32,
    pub max_download: i32,
    pub max_upload: i32,
    pub tech_count: i32,
}

impl HexListing {
    pub fn metrics(&self) -> HexMetrics {
        HexMetrics {
            providers: self.providers,
            max_download: self.max_download,
            max_upload: self.max_upload,
            tech_count: self.tech_count,
        }
    }
}

/// Raw rows of one hex sharing brand, technology, speeds and latency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderGroup {
    pub brand_name: String,
    pub technology: Technology,
    pub download: i32,
    pub upload: i32,
    pub low_latency: bool,
    pub locations: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HexDetail {
    pub summary: HexSummary,
    /// Fastest download first.
    pub providers: Vec<ProviderGroup>,
    pub score: u8,
}

/// Read-only queries over a built store.
pub struct HexService {
    store: Store,
}

impl HexService {
    /// Wrap a store whose summary table has been built; refuses otherwise.
    pub fn new(store: Store) -> Result<Self> {
        for table in [RAW_TABLE, SUMMARY_TABLE] {
            if !store.table_exists(table)? {
                return Err(HexError::StorageUnavailable(format!(
                    "table {table} has not been built"
                )));
            }
        }
        Ok(HexService { store })
    }

    pub fn list_hexes(&self) -> Result<Vec<HexListing>> {
        let conn = self.store.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT h3_res8_id, provider_count, max_download, max_upload, tech_count
             FROM {SUMMARY_TABLE}
             ORDER BY h3_res8_id"
        ))?;
        let rows = stmt
            .query_map([], |r| {
                Ok(HexListing {
                    id: r.get(0)?,
                    providers: r.get(1)?,
                    max_download: r.get(2)?,
                    max_upload: r.get(3)?,
                    tech_count: r.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(hexes = rows.len(), "listed hexes");
        Ok(rows)
    }

    /// Summary, per-provider breakdown and score for one hex.
    ///
    /// The id is checked against the hex-digit allow-list before any query runs.
    pub fn hex_detail(&self, hex_id: &str) -> Result<HexDetail> {
        validate_hex_id(hex_id)?;
        let conn = self.store.connect()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM {SUMMARY_TABLE} WHERE h3_res8_id = ?"
        ))?;
        let summary = stmt
            .query_map(params![hex_id], summary_from_row)?
            .next()
            .transpose()?
            .ok_or_else(|| HexError::NotFound(hex_id.to_string()))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT
               COALESCE(brand_name, '') AS brand,
               CAST(technology AS INTEGER) AS tech,
               CAST(COALESCE(max_advertised_download_speed, 0) AS INTEGER) AS download,
               CAST(COALESCE(max_advertised_upload_speed, 0) AS INTEGER) AS upload,
               COALESCE(low_latency = 1, false) AS is_low_latency,
               CAST(COUNT(*) AS INTEGER) AS locations
             FROM {RAW_TABLE}
             WHERE h3_res8_id = ?
             GROUP BY brand_name, technology, max_advertised_download_speed,
                      max_advertised_upload_speed, low_latency
             ORDER BY download DESC, upload DESC, brand, tech"
        ))?;
        let providers = stmt
            .query_map(params![hex_id], |r| {
                Ok(ProviderGroup {
                    brand_name: r.get(0)?,
                    technology: Technology::from_code(r.get::<_, Option<i32>>(1)?.unwrap_or(0)),
                    download: r.get(2)?,
                    upload: r.get(3)?,
                    low_latency: r.get(4)?,
                    locations: r.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let score = score::score(&summary.metrics());
        Ok(HexDetail {
            summary,
            providers,
            score,
        })
    }
}

/// Reject anything that is not a short run of hex digits.
pub fn validate_hex_id(hex_id: &str) -> Result<()> {
    if HEX_ID.is_match(hex_id) {
        Ok(())
    } else {
        Err(HexError::InvalidInput(hex_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{load, testutil};
    use anyhow::Result;

    fn service(records: &[crate::schema::RawRecord]) -> Result<HexService> {
        Ok(HexService::new(testutil::built_store(records)?)?)
    }

    #[test]
    fn test_list_hexes() -> Result<()> {
        let svc = service(&testutil::mixed_records())?;
        let hexes = svc.list_hexes()?;
        assert_eq!(hexes.len(), 3);
        assert_eq!(
            hexes[1],
            HexListing {
                id: testutil::EXAMPLE_HEX.into(),
                providers: 2,
                max_download: 5000,
                max_upload: 5000,
                tech_count: 2,
            }
        );
        Ok(())
    }

    #[test]
    fn test_listing_serializes_camel_case() -> Result<()> {
        let svc = service(&testutil::example_records())?;
        let json = serde_json::to_value(&svc.list_hexes()?)?;
        assert_eq!(
            json,
            serde_json::json!([{
                "id": "8844d6abffffff",
                "providers": 2,
                "maxDownload": 5000,
                "maxUpload": 5000,
                "techCount": 2
            }])
        );
        Ok(())
    }

    #[test]
    fn test_listing_survives_rows_without_hex() -> Result<()> {
        let store = testutil::built_store(&testutil::example_records())?;
        let conn = store.connect()?;
        conn.execute_batch(&format!(
            "INSERT INTO {RAW_TABLE} VALUES (NULL, 9, 'X', 40, 10, 1, 0)"
        ))?;
        crate::aggregate::build_summary(&conn)?;

        let svc = HexService::new(store)?;
        let hexes = svc.list_hexes()?;
        assert_eq!(hexes.len(), 1);
        assert_eq!(hexes[0].id, testutil::EXAMPLE_HEX);
        Ok(())
    }

    #[test]
    fn test_client_side_score_matches_detail() -> Result<()> {
        let svc = service(&testutil::mixed_records())?;
        for listing in svc.list_hexes()? {
            let detail = svc.hex_detail(&listing.id)?;
            assert_eq!(score::score(&listing.metrics()), detail.score);
        }
        Ok(())
    }

    #[test]
    fn test_hex_detail_groups_and_orders() -> Result<()> {
        let svc = service(&testutil::mixed_records())?;
        let detail = svc.hex_detail("882a100d25fffff")?;

        assert_eq!(detail.summary.location_count, 4);
        let groups: Vec<(&str, i32, i32)> = detail
            .providers
            .iter()
            .map(|g| (g.brand_name.as_str(), g.download, g.locations))
            .collect();
        assert_eq!(
            groups,
            vec![("Verizon", 2000, 2), ("Comcast", 1200, 1), ("Starlink", 220, 1)]
        );
        assert_eq!(detail.providers[0].technology, Technology::Fiber);
        assert!(detail.providers[2].low_latency);
        assert_eq!(detail.score, score::score(&detail.summary.metrics()));
        Ok(())
    }

    #[test]
    fn test_hex_detail_accepts_uppercase() -> Result<()> {
        let svc = service(&testutil::example_records())?;
        // ids are stored lowercase, so an uppercase id is well-formed but absent
        let err = svc.hex_detail("8844D6ABFFFFFF").unwrap_err();
        assert_eq!(err.kind(), "not_found");
        Ok(())
    }

    #[test]
    fn test_unknown_hex_is_not_found() -> Result<()> {
        let svc = service(&testutil::example_records())?;
        match svc.hex_detail("88aa000000fffff") {
            Err(HexError::NotFound(id)) => assert_eq!(id, "88aa000000fffff"),
            other => panic!("expected NotFound, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_malformed_ids_rejected_before_storage() -> Result<()> {
        let svc = service(&testutil::example_records())?;
        // with the tables gone any query would fail with a storage error
        svc.store
            .connect()?
            .execute_batch("DROP TABLE hex_summary; DROP TABLE broadband;")?;

        for bad in [
            "",
            "8844d6abffffff'",
            "8844d6abffffff; DROP TABLE broadband",
            "' OR '1'='1",
            "zz44d6abffffff",
            "8844d6ab-fffff",
            "88 44",
            "8844d6abffffff8844d6abffffff",
        ] {
            match svc.hex_detail(bad) {
                Err(HexError::InvalidInput(id)) => assert_eq!(id, bad),
                other => panic!("{:?} should be invalid, got {:?}", bad, other),
            }
        }
        assert_eq!(svc.hex_detail("8844d6abffffff").unwrap_err().kind(), "storage");
        Ok(())
    }

    #[test]
    fn test_service_refused_before_build() -> Result<()> {
        let store = crate::duck::Store::open_in_memory()?;
        load::create_raw_table(&store.connect()?)?;
        let err = HexService::new(store).err().expect("no summary yet");
        assert_eq!(err.kind(), "storage_unavailable");
        Ok(())
    }

    #[test]
    fn test_concurrent_readers() -> Result<()> {
        let svc = std::sync::Arc::new(service(&testutil::mixed_records())?);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let svc = svc.clone();
                std::thread::spawn(move || {
                    let listed = svc.list_hexes().map(|h| h.len());
                    let located = svc
                        .hex_detail(testutil::EXAMPLE_HEX)
                        .map(|d| d.summary.location_count);
                    (listed.ok(), located.ok())
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), (Some(3), Some(3)));
        }
        Ok(())
    }
}
