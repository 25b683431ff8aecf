//! Colloquy - scoring and search aggregation for a community Q&A platform
//!
//! ## Services
//!
//! - **Votes**: upvote/downvote sets on questions and answers, mutually exclusive per voter
//! - **Saves**: per-user saved-question sets with toggle semantics
//! - **Reputation**: authored-content totals mapped onto bronze/silver/gold badges
//! - **Search**: one query fanned out over questions, users, answers and tags
//! - **Tags**: popular tags and a user's most-asked tags
//! - **Views**: question view counting with per-user de-duplication
//!
//! Mutations end by invalidating the page that renders the changed state
//! through [`cache::PathInvalidator`].

pub mod cache;
pub mod config;
pub mod db;
pub mod model;
pub mod routes;
pub mod server;
pub mod services;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{ColloquyError, Result};
