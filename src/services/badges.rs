//! Badge tiers
//!
//! A badge table maps each criterion to three ascending thresholds
//! (bronze, silver, gold). A count earns one badge of every tier whose
//! threshold it reaches; tallies are summed across criteria.
//!
//! The table is plain data so deployments can tune it from a JSON file:
//!
//! ```json
//! { "QUESTION_COUNT": [10, 50, 100], "TOTAL_VIEWS": [1000, 10000, 100000] }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::types::{ColloquyError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeCriteriaType {
    QuestionCount,
    AnswerCount,
    QuestionUpvotes,
    AnswerUpvotes,
    TotalViews,
}

impl BadgeCriteriaType {
    pub const ALL: [BadgeCriteriaType; 5] = [
        BadgeCriteriaType::QuestionCount,
        BadgeCriteriaType::AnswerCount,
        BadgeCriteriaType::QuestionUpvotes,
        BadgeCriteriaType::AnswerUpvotes,
        BadgeCriteriaType::TotalViews,
    ];
}

/// A named count fed into the badge table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BadgeCriterion {
    pub kind: BadgeCriteriaType,
    pub count: u64,
}

impl BadgeCriterion {
    pub fn new(kind: BadgeCriteriaType, count: u64) -> Self {
        Self { kind, count }
    }
}

/// Badge tallies per tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeCounts {
    pub bronze: u32,
    pub silver: u32,
    pub gold: u32,
}

/// Thresholds per criterion: `[bronze_min, silver_min, gold_min]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadgeTable {
    thresholds: BTreeMap<BadgeCriteriaType, [u64; 3]>,
}

impl Default for BadgeTable {
    fn default() -> Self {
        let thresholds = BadgeCriteriaType::ALL
            .into_iter()
            .map(|kind| {
                let tiers = match kind {
                    BadgeCriteriaType::TotalViews => [1_000, 10_000, 100_000],
                    _ => [10, 50, 100],
                };
                (kind, tiers)
            })
            .collect();
        Self { thresholds }
    }
}

impl BadgeTable {
    /// Build a table from explicit thresholds, rejecting non-ascending tiers
    pub fn new(thresholds: BTreeMap<BadgeCriteriaType, [u64; 3]>) -> Result<Self> {
        let table = Self { thresholds };
        table.validate()?;
        Ok(table)
    }

    /// Parse JSON overrides on top of the default table
    pub fn from_json(json: &str) -> Result<Self> {
        let overrides: BTreeMap<BadgeCriteriaType, [u64; 3]> = serde_json::from_str(json)
            .map_err(|e| ColloquyError::Config(format!("Invalid badge criteria: {}", e)))?;

        let mut table = Self::default();
        table.thresholds.extend(overrides);
        table.validate()?;
        Ok(table)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let table = Self::from_json(&json)?;
        info!("Loaded badge criteria from {}", path.display());
        Ok(table)
    }

    pub fn thresholds(&self, kind: BadgeCriteriaType) -> Option<[u64; 3]> {
        self.thresholds.get(&kind).copied()
    }

    fn validate(&self) -> Result<()> {
        for (kind, [bronze, silver, gold]) in &self.thresholds {
            if !(bronze < silver && silver < gold) {
                return Err(ColloquyError::Config(format!(
                    "Badge thresholds for {:?} must be strictly ascending, got [{}, {}, {}]",
                    kind, bronze, silver, gold
                )));
            }
        }
        Ok(())
    }

    /// Tally badges earned by a set of criteria
    ///
    /// Criteria without thresholds in the table earn nothing.
    pub fn assign_badges(&self, criteria: &[BadgeCriterion]) -> BadgeCounts {
        let mut counts = BadgeCounts::default();

        for criterion in criteria {
            let Some([bronze, silver, gold]) = self.thresholds(criterion.kind) else {
                continue;
            };
            if criterion.count >= bronze {
                counts.bronze += 1;
            }
            if criterion.count >= silver {
                counts.silver += 1;
            }
            if criterion.count >= gold {
                counts.gold += 1;
            }
        }

        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BadgeCriteriaType::*;

    #[test]
    fn test_zero_counts_earn_nothing() {
        let table = BadgeTable::default();
        let criteria: Vec<_> = BadgeCriteriaType::ALL
            .into_iter()
            .map(|k| BadgeCriterion::new(k, 0))
            .collect();
        assert_eq!(table.assign_badges(&criteria), BadgeCounts::default());
    }

    #[test]
    fn test_tiers_are_cumulative() {
        let table = BadgeTable::default();
        let counts = table.assign_badges(&[
            BadgeCriterion::new(QuestionCount, 50),
            BadgeCriterion::new(AnswerCount, 9),
            BadgeCriterion::new(TotalViews, 100_000),
        ]);
        assert_eq!(
            counts,
            BadgeCounts {
                bronze: 2,
                silver: 2,
                gold: 1
            }
        );
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let table = BadgeTable::default();
        let criteria = [
            BadgeCriterion::new(QuestionUpvotes, 75),
            BadgeCriterion::new(AnswerUpvotes, 120),
        ];
        assert_eq!(table.assign_badges(&criteria), table.assign_badges(&criteria));
    }

    #[test]
    fn test_monotonic_in_count() {
        let table = BadgeTable::default();
        let mut previous = 0;
        for count in [0, 9, 10, 49, 50, 99, 100, 1_000] {
            let c = table.assign_badges(&[BadgeCriterion::new(AnswerCount, count)]);
            let total = c.bronze + c.silver + c.gold;
            assert!(total >= previous);
            previous = total;
        }
        assert_eq!(previous, 3);
    }

    #[test]
    fn test_json_overrides_merge_with_defaults() {
        let table = BadgeTable::from_json(r#"{"QUESTION_COUNT": [1, 2, 3]}"#).unwrap();
        assert_eq!(table.thresholds(QuestionCount), Some([1, 2, 3]));
        assert_eq!(table.thresholds(TotalViews), Some([1_000, 10_000, 100_000]));
    }

    #[test]
    fn test_rejects_non_ascending_thresholds() {
        let result = BadgeTable::from_json(r#"{"ANSWER_COUNT": [50, 10, 100]}"#);
        assert!(matches!(result, Err(ColloquyError::Config(_))));

        let mut thresholds = BTreeMap::new();
        thresholds.insert(TotalViews, [5, 5, 6]);
        assert!(BadgeTable::new(thresholds).is_err());
    }

    #[test]
    fn test_rejects_unknown_criterion() {
        assert!(BadgeTable::from_json(r#"{"KARMA": [1, 2, 3]}"#).is_err());
    }
}
