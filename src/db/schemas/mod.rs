//! Database schemas for Colloquy
//!
//! MongoDB document structures for users, questions, answers, tags and
//! interactions.

mod answer;
mod interaction;
mod metadata;
mod question;
mod tag;
mod user;

pub use answer::{AnswerDoc, ANSWER_COLLECTION};
pub use interaction::{InteractionAction, InteractionDoc, INTERACTION_COLLECTION};
pub use metadata::Metadata;
pub use question::{QuestionDoc, QUESTION_COLLECTION, QUESTION_TAG_RANGE};
pub use tag::{TagDoc, TAG_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};
