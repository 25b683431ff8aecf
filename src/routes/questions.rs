//! POST /api/questions/{id}/views

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::{parse_object_id, read_json_or_default, respond};
use crate::server::AppState;
use crate::types::Result;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub recorded: bool,
}

pub async fn handle_view_question<B>(
    req: Request<B>,
    question_id: &str,
    state: &AppState,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    respond(view(req, question_id, state).await)
}

async fn view<B>(req: Request<B>, question_id: &str, state: &AppState) -> Result<ViewResponse>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let question = parse_object_id(question_id)?;
    let request: ViewRequest = read_json_or_default(req).await?;
    let viewer = request.user_id.as_deref().map(parse_object_id).transpose()?;

    let recorded = state.views.view_question(&question, viewer.as_ref()).await?;
    Ok(ViewResponse { recorded })
}
