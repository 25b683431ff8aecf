//! User profile routes
//!
//! - `GET /api/users/{clerk_id}/stats`: question/answer totals and badges
//! - `GET /api/users/{user_id}/top-tags?limit=`: most-asked tags

use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;
use serde::Deserialize;

use super::{error_response, parse_object_id, read_query, respond};
use crate::server::AppState;
use crate::services::DEFAULT_INTERACTED_LIMIT;

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

pub async fn handle_user_stats(clerk_id: &str, state: &AppState) -> Response<Full<Bytes>> {
    respond(state.reputation.compute_user_stats(clerk_id).await)
}

pub async fn handle_top_tags(
    query: Option<&str>,
    user_id: &str,
    state: &AppState,
) -> Response<Full<Bytes>> {
    let query: LimitQuery = match read_query(query) {
        Ok(q) => q,
        Err(e) => return error_response(&e),
    };
    let user = match parse_object_id(user_id) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };

    let limit = query.limit.unwrap_or(DEFAULT_INTERACTED_LIMIT);
    respond(state.tags.top_interacted_tags(&user, limit).await)
}
