// src/api/mod.rs
//! JSON wire types and warp routes for the map client.

use crate::{
    error::HexError,
    query::{HexDetail, HexService, ProviderGroup},
    score,
};
use serde::Serialize;
use std::{convert::Infallible, path::PathBuf, sync::Arc};
use tracing::{error, warn};
use warp::{
    http::StatusCode,
    reply::{self, Response},
    Filter, Rejection, Reply,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBody {
    pub provider_count: i32,
    pub brand_count: i32,
    pub max_download: i32,
    pub max_upload: i32,
    pub tech_count: i32,
    pub technologies: Vec<i32>,
    pub location_count: i32,
    pub has_low_latency: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderBody {
    pub provider: String,
    pub tech: i32,
    pub tech_name: String,
    pub download: i32,
    pub upload: i32,
    pub low_latency: u8,
    pub locations: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HexDetailBody {
    pub hex_id: String,
    pub score: u8,
    /// Map color band for `score`.
    pub color: &'static str,
    pub summary: SummaryBody,
    pub providers: Vec<ProviderBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

impl From<&ProviderGroup> for ProviderBody {
    fn from(g: &ProviderGroup) -> Self {
        ProviderBody {
            provider: g.brand_name.clone(),
            tech: g.technology.code(),
            tech_name: g.technology.label(),
            download: g.download,
            upload: g.upload,
            low_latency: u8::from(g.low_latency),
            locations: g.locations,
        }
    }
}

impl From<HexDetail> for HexDetailBody {
    fn from(d: HexDetail) -> Self {
        let s = d.summary;
        HexDetailBody {
            providers: d.providers.iter().map(ProviderBody::from).collect(),
            score: d.score,
            color: score::score_color(d.score),
            summary: SummaryBody {
                provider_count: s.provider_count,
                brand_count: s.brand_count,
                max_download: s.max_download,
                max_upload: s.max_upload,
                tech_count: s.tech_count,
                technologies: s.technologies,
                location_count: s.location_count,
                has_low_latency: s.has_low_latency,
            },
            hex_id: s.hex_id,
        }
    }
}

/// Status and body for a failed request. Only client errors describe
/// themselves; everything else is logged and reported generically.
pub fn error_reply(err: &HexError) -> Response {
    let (status, body) = match err {
        HexError::InvalidInput(_) => (
            StatusCode::BAD_REQUEST,
            ErrorBody {
                error: "Invalid hex ID format".into(),
                kind: err.kind(),
            },
        ),
        HexError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            ErrorBody {
                error: "Hex not found".into(),
                kind: err.kind(),
            },
        ),
        other => {
            error!(kind = other.kind(), "request failed: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Internal server error".into(),
                    kind: "internal",
                },
            )
        }
    };
    reply::with_status(reply::json(&body), status).into_response()
}

fn with_service(
    service: Arc<HexService>,
) -> impl Filter<Extract = (Arc<HexService>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

/// Run a blocking query on the blocking pool and render it as JSON.
async fn run_query<T, F>(service: Arc<HexService>, query: F) -> Result<Response, Rejection>
where
    T: Serialize,
    F: FnOnce(&HexService) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || query(&service))
        .await
        .unwrap_or_else(|e| Err(HexError::StorageUnavailable(format!("query task failed: {e}"))));

    Ok(match outcome {
        Ok(value) => reply::json(&value).into_response(),
        Err(err) => {
            if err.is_client_error() {
                warn!(kind = err.kind(), "{}", err);
            }
            error_reply(&err)
        }
    })
}

async fn list_hexes(service: Arc<HexService>) -> Result<Response, Rejection> {
    run_query(service, |svc| svc.list_hexes()).await
}

async fn hex_detail(hex_id: String, service: Arc<HexService>) -> Result<Response, Rejection> {
    run_query(service, move |svc| svc.hex_detail(&hex_id).map(HexDetailBody::from)).await
}

/// All routes: the two hex endpoints, `/health`, the `/maryland` clean URL,
/// and static files.
pub fn routes(
    service: Arc<HexService>,
    static_dir: PathBuf,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| reply::json(&serde_json::json!({ "status": "healthy" })));

    let hexes = warp::path!("api" / "maryland" / "hexes")
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(list_hexes);

    let detail = warp::path!("api" / "maryland" / "hex" / String)
        .and(warp::get())
        .and(with_service(service))
        .and_then(hex_detail);

    let map_page = warp::path!("maryland")
        .and(warp::get())
        .map(|| warp::redirect::found(warp::http::Uri::from_static("/maryland.html")));

    let files = warp::get().and(warp::fs::dir(static_dir));

    health
        .or(hexes)
        .or(detail)
        .or(map_page)
        .or(files)
        .with(warp::trace::request())
}
