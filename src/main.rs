//! Colloquy - scoring and search aggregation for a community Q&A platform

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use colloquy::{
    config::Args,
    db::MongoPool,
    server::{self, AppState},
    services::BadgeTable,
    store::{ForumStore, MemoryStore, MongoStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("colloquy={},info", log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Colloquy - Q&A scoring and search");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!(
        "Search limits: {} per kind, {} for a single kind",
        args.search_per_kind_limit, args.search_single_kind_limit
    );

    let badges = match &args.badge_criteria_file {
        Some(path) => BadgeTable::from_file(path)?,
        None => {
            info!("Badge criteria: built-in table");
            BadgeTable::default()
        }
    };

    let (store, mongo): (Arc<dyn ForumStore>, Option<Arc<MongoPool>>) = if args.dev_mode {
        warn!("Using in-memory store (dev mode)");
        (Arc::new(MemoryStore::new()), None)
    } else {
        info!("MongoDB: {} (database {})", args.mongodb_uri, args.mongodb_db);
        let pool = Arc::new(MongoPool::new(&args.mongodb_uri, &args.mongodb_db));

        // Connect eagerly so a bad URI shows up at startup; requests retry lazily
        match pool.acquire().await {
            Ok(_) => info!("MongoDB connected successfully"),
            Err(e) => warn!("MongoDB not reachable yet, will retry on first request: {}", e),
        }

        (Arc::new(MongoStore::new(Arc::clone(&pool))), Some(pool))
    };

    let state = Arc::new(AppState::new(args, store, mongo, badges));
    server::run(state).await?;

    Ok(())
}
