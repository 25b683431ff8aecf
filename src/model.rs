//! Domain vocabulary shared by the store and the services

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::schemas::{AnswerDoc, QuestionDoc, TagDoc, UserDoc};
use crate::types::ColloquyError;

/// Entity kinds that carry vote sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[serde(alias = "Question")]
    Question,
    #[serde(alias = "Answer")]
    Answer,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Answer => "answer",
        }
    }
}

/// A votable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoteTarget {
    pub kind: TargetKind,
    pub id: ObjectId,
}

impl VoteTarget {
    pub fn question(id: ObjectId) -> Self {
        Self { kind: TargetKind::Question, id }
    }

    pub fn answer(id: ObjectId) -> Self {
        Self { kind: TargetKind::Answer, id }
    }
}

impl fmt::Display for VoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id.to_hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    #[serde(alias = "upvote")]
    Up,
    #[serde(alias = "downvote")]
    Down,
}

impl VoteDirection {
    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// Name of the document field holding this direction's voters
    pub fn field(self) -> &'static str {
        match self {
            Self::Up => "upvotes",
            Self::Down => "downvotes",
        }
    }
}

/// What a voter has recorded on a target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteState {
    pub has_upvoted: bool,
    pub has_downvoted: bool,
}

impl VoteState {
    pub fn has(&self, direction: VoteDirection) -> bool {
        match direction {
            VoteDirection::Up => self.has_upvoted,
            VoteDirection::Down => self.has_downvoted,
        }
    }
}

/// A single atomic change to a target's vote sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    /// Add the voter to this direction and remove them from the opposite one
    Cast(VoteDirection),
    /// Remove the voter from this direction
    Retract(VoteDirection),
}

/// Searchable entity kinds, in registry order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Question,
    User,
    Answer,
    Tag,
}

impl SearchKind {
    /// Registry order used when every kind is searched
    pub const ALL: [SearchKind; 4] = [
        SearchKind::Question,
        SearchKind::User,
        SearchKind::Answer,
        SearchKind::Tag,
    ];

    /// Field matched against the query
    pub fn search_field(&self) -> &'static str {
        match self {
            Self::Question => "title",
            Self::User => "name",
            Self::Answer => "content",
            Self::Tag => "name",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::User => "user",
            Self::Answer => "answer",
            Self::Tag => "tag",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchKind {
    type Err = ColloquyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        SearchKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| ColloquyError::InvalidArgument(format!("Invalid search type: {}", s)))
    }
}

/// A hydrated document matched by a search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchHit {
    Question(QuestionDoc),
    User(UserDoc),
    Answer(AnswerDoc),
    Tag(TagDoc),
}

impl SearchHit {
    pub fn kind(&self) -> SearchKind {
        match self {
            Self::Question(_) => SearchKind::Question,
            Self::User(_) => SearchKind::User,
            Self::Answer(_) => SearchKind::Answer,
            Self::Tag(_) => SearchKind::Tag,
        }
    }
}

/// Tag with the number of questions carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagPopularity {
    #[serde(serialize_with = "bson::serde_helpers::serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub name: String,
    pub question_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_kind_parse_is_case_insensitive() {
        assert_eq!("Question".parse::<SearchKind>().unwrap(), SearchKind::Question);
        assert_eq!("TAG".parse::<SearchKind>().unwrap(), SearchKind::Tag);
        assert!(matches!(
            "invalidkind".parse::<SearchKind>(),
            Err(ColloquyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_registry_order() {
        let names: Vec<_> = SearchKind::ALL.iter().map(|k| k.search_field()).collect();
        assert_eq!(names, vec!["title", "name", "content", "name"]);
    }

    #[test]
    fn test_direction_fields() {
        assert_eq!(VoteDirection::Up.opposite(), VoteDirection::Down);
        assert_eq!(VoteDirection::Down.field(), "downvotes");
    }

    #[test]
    fn test_direction_accepts_action_names() {
        let d: VoteDirection = serde_json::from_str("\"upvote\"").unwrap();
        assert_eq!(d, VoteDirection::Up);
        let d: VoteDirection = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(d, VoteDirection::Down);
    }
}
