//! GET /api/search?q=&type=

use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;
use serde::Deserialize;

use super::{error_response, read_query, respond};
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

pub async fn handle_search(query: Option<&str>, state: &AppState) -> Response<Full<Bytes>> {
    let query: SearchQuery = match read_query(query) {
        Ok(q) => q,
        Err(e) => return error_response(&e),
    };

    respond(state.search.search(&query.q, query.kind.as_deref()).await)
}
