//! POST /api/saves

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::{parse_object_id, read_json, respond};
use crate::server::AppState;
use crate::types::Result;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSaveRequest {
    pub user_id: String,
    pub question_id: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleSaveResponse {
    pub saved: bool,
}

pub async fn handle_toggle_save<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    respond(toggle(req, state).await)
}

async fn toggle<B>(req: Request<B>, state: &AppState) -> Result<ToggleSaveResponse>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let request: ToggleSaveRequest = read_json(req).await?;
    let user = parse_object_id(&request.user_id)?;
    let question = parse_object_id(&request.question_id)?;

    let saved = state.saves.toggle_save(&user, &question, &request.path).await?;
    Ok(ToggleSaveResponse { saved })
}
