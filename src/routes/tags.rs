//! GET /api/tags/popular?limit=

use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;

use super::users::LimitQuery;
use super::{error_response, read_query, respond};
use crate::server::AppState;
use crate::services::DEFAULT_POPULAR_LIMIT;

pub async fn handle_popular_tags(query: Option<&str>, state: &AppState) -> Response<Full<Bytes>> {
    let query: LimitQuery = match read_query(query) {
        Ok(q) => q,
        Err(e) => return error_response(&e),
    };

    let limit = query.limit.unwrap_or(DEFAULT_POPULAR_LIMIT);
    respond(state.tags.top_popular_tags(limit).await)
}
