pub mod types;

pub use types::{RawRecord, Technology};

/// Raw availability rows, appended from every source file.
pub const RAW_TABLE: &str = "broadband";
/// One row per hex cell, rebuilt wholesale from `RAW_TABLE`.
pub const SUMMARY_TABLE: &str = "hex_summary";

pub const HEX_ID_COLUMN: &str = "h3_res8_id";

/// Columns the aggregator and query service read from the raw table.
/// Source files may carry others; these must be present.
pub const REQUIRED_COLUMNS: &[&str] = &[
    HEX_ID_COLUMN,
    "provider_id",
    "brand_name",
    "technology",
    "max_advertised_download_speed",
    "max_advertised_upload_speed",
    "low_latency",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technology_codes_round_trip_labels() {
        assert_eq!(Technology::from_code(50), Technology::Fiber);
        assert_eq!(Technology::from_code(50).label(), "Fiber");
        assert_eq!(Technology::from_code(72).label(), "LBR FW");
        assert_eq!(Technology::from_code(10).code(), 10);
    }

    #[test]
    fn test_unknown_technology_keeps_code() {
        let tech = Technology::from_code(0);
        assert_eq!(tech, Technology::Other(0));
        assert_eq!(tech.code(), 0);
        assert_eq!(tech.label(), "Tech 0");
    }
}
