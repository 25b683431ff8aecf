//! Liveness check
//!
//! `/health` returns 200 while the process is serving. The body reports which
//! store backs the service and, for MongoDB, whether the lazy connection has
//! been established yet. It also echoes the effective search caps and badge
//! thresholds, which may come from flags or a criteria file.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::json_response;
use crate::server::AppState;
use crate::services::{BadgeTable, SearchLimits};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse<'a> {
    pub healthy: bool,
    pub version: &'static str,
    /// "development" or "production"
    pub mode: &'static str,
    /// "memory" or "mongodb"
    pub store: &'static str,
    pub store_connected: bool,
    /// Paths invalidated since startup
    pub invalidated_paths: usize,
    pub search_limits: SearchLimits,
    pub badge_thresholds: &'a BadgeTable,
}

fn build_health_response(state: &AppState) -> HealthResponse<'_> {
    let (store, store_connected) = match &state.mongo {
        Some(pool) => ("mongodb", pool.is_connected()),
        None => ("memory", true),
    };

    HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        store,
        store_connected,
        invalidated_paths: state.revalidation.tracked_paths(),
        search_limits: state.search.limits(),
        badge_thresholds: state.reputation.badge_table(),
    }
}

pub fn health_check(state: &AppState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &build_health_response(state))
}
