// src/schema/types.rs

/// One provider × technology × location availability row.
#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct RawRecord {
    pub h3_res8_id: String,
    pub provider_id: i64,
    pub brand_name: String,
    pub technology: i32,
    pub max_advertised_download_speed: i32,
    pub max_advertised_upload_speed: i32,
    pub low_latency: i32,
}

/// BDC technology codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Technology {
    CopperDsl,
    Cable,
    Fiber,
    GsoSatellite,
    NgsoSatellite,
    UnlicensedFixedWireless,
    LicensedFixedWireless,
    LbrFixedWireless,
    Other(i32),
}

impl Technology {
    pub fn from_code(code: i32) -> Self {
        match code {
            10 => Technology::CopperDsl,
            40 => Technology::Cable,
            50 => Technology::Fiber,
            60 => Technology::GsoSatellite,
            61 => Technology::NgsoSatellite,
            70 => Technology::UnlicensedFixedWireless,
            71 => Technology::LicensedFixedWireless,
            72 => Technology::LbrFixedWireless,
            other => Technology::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Technology::CopperDsl => 10,
            Technology::Cable => 40,
            Technology::Fiber => 50,
            Technology::GsoSatellite => 60,
            Technology::NgsoSatellite => 61,
            Technology::UnlicensedFixedWireless => 70,
            Technology::LicensedFixedWireless => 71,
            Technology::LbrFixedWireless => 72,
            Technology::Other(code) => code,
        }
    }

    /// Short display label, as shown in the map's detail panel.
    pub fn label(self) -> String {
        let name = match self {
            Technology::CopperDsl => "Copper/DSL",
            Technology::Cable => "Cable",
            Technology::Fiber => "Fiber",
            Technology::GsoSatellite => "GSO Satellite",
            Technology::NgsoSatellite => "NGSO Satellite",
            Technology::UnlicensedFixedWireless => "Unlicensed FW",
            Technology::LicensedFixedWireless => "Licensed FW",
            Technology::LbrFixedWireless => "LBR FW",
            Technology::Other(code) => return format!("Tech {}", code),
        };
        name.to_string()
    }
}
