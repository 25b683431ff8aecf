//! Configuration for Colloquy
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::services::SearchLimits;

/// Colloquy - scoring and search aggregation for a community Q&A platform
#[derive(Parser, Debug, Clone)]
#[command(name = "colloquy")]
#[command(about = "Votes, saved questions, reputation and global search for a Q&A platform")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "colloquy")]
    pub mongodb_db: String,

    /// Enable development mode (in-memory store, no MongoDB)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// JSON file with badge thresholds, e.g. {"QUESTION_COUNT": [10, 50, 100]}
    /// Criteria missing from the file keep their built-in thresholds
    #[arg(long, env = "BADGE_CRITERIA_FILE")]
    pub badge_criteria_file: Option<PathBuf>,

    /// Results per kind when searching across every kind
    #[arg(long, env = "SEARCH_PER_KIND_LIMIT", default_value = "2")]
    pub search_per_kind_limit: usize,

    /// Results when searching a single kind
    #[arg(long, env = "SEARCH_SINGLE_KIND_LIMIT", default_value = "8")]
    pub search_single_kind_limit: usize,
}

impl Args {
    /// Search caps derived from the CLI
    pub fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            per_kind: self.search_per_kind_limit,
            single_kind: self.search_single_kind_limit,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.search_per_kind_limit == 0 {
            return Err("SEARCH_PER_KIND_LIMIT must be greater than zero".to_string());
        }

        if self.search_single_kind_limit == 0 {
            return Err("SEARCH_SINGLE_KIND_LIMIT must be greater than zero".to_string());
        }

        if !self.dev_mode && self.mongodb_db.trim().is_empty() {
            return Err("MONGODB_DB is required in production mode".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["colloquy"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.search_limits(), SearchLimits::default());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let args = parse(&["--search-per-kind-limit", "0"]);
        assert!(args.validate().is_err());

        let args = parse(&["--search-single-kind-limit", "0"]);
        assert!(args.validate().is_err());
    }
}
