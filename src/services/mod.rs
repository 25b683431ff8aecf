//! Scoring and search services
//!
//! Each service holds its collaborators behind `Arc` and is shared across
//! request handlers.

pub mod badges;
pub mod reputation;
pub mod saves;
pub mod search;
pub mod tags;
pub mod views;
pub mod votes;

pub use badges::{BadgeCounts, BadgeCriteriaType, BadgeCriterion, BadgeTable};
pub use reputation::{ReputationAggregator, UserStats};
pub use saves::SaveSet;
pub use search::{SearchAggregator, SearchLimits, SearchResult};
pub use tags::{TagFrequency, TagRanking, DEFAULT_INTERACTED_LIMIT, DEFAULT_POPULAR_LIMIT};
pub use views::ViewTracker;
pub use votes::{reconcile, VoteLedger};
