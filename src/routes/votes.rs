//! POST /api/votes

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::{parse_object_id, read_json, respond};
use crate::model::{TargetKind, VoteDirection, VoteState, VoteTarget};
use crate::server::AppState;
use crate::types::Result;

/// Vote click as sent by the question page
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub target_kind: TargetKind,
    pub target_id: String,
    /// Absent for anonymous visitors; the vote is then ignored
    #[serde(default)]
    pub user_id: Option<String>,
    pub direction: VoteDirection,
    #[serde(default)]
    pub has_upvoted: bool,
    #[serde(default)]
    pub has_downvoted: bool,
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub applied: bool,
}

pub async fn handle_vote<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    respond(apply(req, state).await)
}

async fn apply<B>(req: Request<B>, state: &AppState) -> Result<VoteResponse>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let request: VoteRequest = read_json(req).await?;

    let id = parse_object_id(&request.target_id)?;
    let target = VoteTarget {
        kind: request.target_kind,
        id,
    };
    let voter = request.user_id.as_deref().map(parse_object_id).transpose()?;
    let current = VoteState {
        has_upvoted: request.has_upvoted,
        has_downvoted: request.has_downvoted,
    };

    state
        .votes
        .apply_vote(target, voter.as_ref(), request.direction, current, &request.path)
        .await?;

    Ok(VoteResponse {
        applied: voter.is_some(),
    })
}
