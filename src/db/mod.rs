//! Database layer
//!
//! MongoDB connection handling and document schemas.

pub mod mongo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection, MongoPool};
