//! HTTP routes for Colloquy
//!
//! Handlers are generic over the request body so the router can be driven
//! with in-memory bodies in tests.

pub mod health;
pub mod questions;
pub mod saves;
pub mod search;
pub mod tags;
pub mod users;
pub mod votes;

pub use health::health_check;
pub use questions::handle_view_question;
pub use saves::handle_toggle_save;
pub use search::handle_search;
pub use tags::handle_popular_tags;
pub use users::{handle_top_tags, handle_user_stats};
pub use votes::handle_vote;

use bson::oid::ObjectId;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use tracing::{error, warn};

use crate::types::{ColloquyError, Result};

/// Serialize `body` as a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Map an error onto its HTTP status with a JSON body
pub fn error_response(err: &ColloquyError) -> Response<Full<Bytes>> {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }

    json_response(
        status,
        &serde_json::json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": err.to_string(),
        }),
    )
}

/// Turn a handler result into a response
pub fn respond<T: Serialize>(result: Result<T>) -> Response<Full<Bytes>> {
    match result {
        Ok(body) => json_response(StatusCode::OK, &body),
        Err(e) => error_response(&e),
    }
}

async fn read_body<B>(req: Request<B>) -> Result<Bytes>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let collected = req
        .into_body()
        .collect()
        .await
        .map_err(|e| ColloquyError::InvalidArgument(format!("Failed to read request body: {}", e)))?;
    Ok(collected.to_bytes())
}

/// Read and parse a JSON request body
pub async fn read_json<B, T>(req: Request<B>) -> Result<T>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
    T: DeserializeOwned,
{
    let body = read_body(req).await?;
    serde_json::from_slice(&body)
        .map_err(|e| ColloquyError::InvalidArgument(format!("Invalid JSON: {}", e)))
}

/// Like [`read_json`], but an empty body parses as `T::default()`
pub async fn read_json_or_default<B, T>(req: Request<B>) -> Result<T>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
    T: DeserializeOwned + Default,
{
    let body = read_body(req).await?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(&body)
        .map_err(|e| ColloquyError::InvalidArgument(format!("Invalid JSON: {}", e)))
}

/// Parse a query string into `T`; a missing query parses as empty
pub fn read_query<T: DeserializeOwned>(query: Option<&str>) -> Result<T> {
    serde_urlencoded::from_str(query.unwrap_or(""))
        .map_err(|e| ColloquyError::InvalidArgument(format!("Invalid query string: {}", e)))
}

pub fn parse_object_id(value: &str) -> Result<ObjectId> {
    Ok(ObjectId::parse_str(value)?)
}
