//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo; one task per connection, manual
//! `(method, path segments)` routing.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::cache::RevalidationRegistry;
use crate::config::Args;
use crate::db::MongoPool;
use crate::routes::{self, json_response};
use crate::services::{
    BadgeTable, ReputationAggregator, SaveSet, SearchAggregator, TagRanking, ViewTracker,
    VoteLedger,
};
use crate::store::ForumStore;
use crate::types::ColloquyError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// MongoDB handle; `None` when running on the in-memory store
    pub mongo: Option<Arc<MongoPool>>,
    /// Page generations bumped by mutating routes
    pub revalidation: Arc<RevalidationRegistry>,
    pub votes: VoteLedger,
    pub saves: SaveSet,
    pub reputation: ReputationAggregator,
    pub search: SearchAggregator,
    pub tags: TagRanking,
    pub views: ViewTracker,
}

impl AppState {
    pub fn new(
        args: Args,
        store: Arc<dyn ForumStore>,
        mongo: Option<Arc<MongoPool>>,
        badges: BadgeTable,
    ) -> Self {
        let revalidation = Arc::new(RevalidationRegistry::new());
        let search_limits = args.search_limits();

        Self {
            votes: VoteLedger::new(Arc::clone(&store), revalidation.clone()),
            saves: SaveSet::new(Arc::clone(&store), revalidation.clone()),
            reputation: ReputationAggregator::new(Arc::clone(&store), Arc::new(badges)),
            search: SearchAggregator::new(Arc::clone(&store), search_limits),
            tags: TagRanking::new(Arc::clone(&store)),
            views: ViewTracker::new(store),
            args,
            mongo,
            revalidation,
        }
    }
}

/// Run the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), ColloquyError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Colloquy listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - in-memory store, data is lost on exit");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    debug!("[{}] {} {}", addr, req.method(), req.uri().path());

    let response = route(&state, req).await;
    Ok(to_boxed(response))
}

/// Dispatch a request to its handler
pub async fn route<B>(state: &AppState, req: Request<B>) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method, segments.as_slice()) {
        (Method::GET, ["health"]) | (Method::GET, ["healthz"]) => routes::health_check(state),

        (Method::POST, ["api", "votes"]) => routes::handle_vote(req, state).await,

        (Method::POST, ["api", "saves"]) => routes::handle_toggle_save(req, state).await,

        (Method::GET, ["api", "search"]) => routes::handle_search(query.as_deref(), state).await,

        (Method::GET, ["api", "users", clerk_id, "stats"]) => {
            routes::handle_user_stats(clerk_id, state).await
        }

        (Method::GET, ["api", "users", user_id, "top-tags"]) => {
            routes::handle_top_tags(query.as_deref(), user_id, state).await
        }

        (Method::GET, ["api", "tags", "popular"]) => {
            routes::handle_popular_tags(query.as_deref(), state).await
        }

        (Method::POST, ["api", "questions", question_id, "views"]) => {
            routes::handle_view_question(req, question_id, state).await
        }

        _ => not_found_response(&path),
    }
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}

fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({
            "error": "Not Found",
            "path": path,
        }),
    )
}
