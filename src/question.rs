//! Question sets and their loader interface
//!
//! This module defines the questions a challenge session is played on and
//! the trait through which the persistence collaborator supplies them. A
//! question set is fetched exactly once when a session is created, frozen
//! onto the session record, and never mutated afterwards, so every
//! participant answers the same questions in the same order.

use std::{fmt::Display, str::FromStr};

use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::SubjectId;

/// A unique identifier for a question
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct QuestionId(Uuid);

impl QuestionId {
    /// Creates a new random question identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuestionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for QuestionId {
    type Err = uuid::Error;

    /// Parses a question identifier from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A single selectable answer option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct OptionChoice {
    /// The option text shown to the participant
    #[garde(length(max = crate::constants::question::MAX_OPTION_LENGTH))]
    pub text: String,
    /// Whether selecting this option scores a point
    #[garde(skip)]
    pub correct: bool,
}

/// Validates that exactly one option of a question is marked correct
///
/// True/false questions are the two-option case of the same rule: two
/// options, exactly one of them correct.
fn validate_single_correct(options: &[OptionChoice]) -> garde::Result {
    let correct_count = options.iter().filter(|o| o.correct).count();
    if correct_count == 1 {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "expected exactly one correct option, found {correct_count}",
        )))
    }
}

/// One question of a challenge's question set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Question {
    /// Identifier of the question
    #[garde(skip)]
    pub id: QuestionId,
    /// The prompt text shown to the participant
    #[garde(length(max = crate::constants::question::MAX_PROMPT_LENGTH))]
    pub prompt: String,
    /// The selectable answer options, exactly one of them correct
    #[garde(
        length(
            min = crate::constants::question::MIN_OPTION_COUNT,
            max = crate::constants::question::MAX_OPTION_COUNT,
        ),
        custom(|v, _| validate_single_correct(v)),
        dive
    )]
    pub options: Vec<OptionChoice>,
}

/// An ordered, immutable sequence of questions for one session
///
/// Once built, a question set is privately held per client and never
/// mutated; all participants of a session receive the same set through the
/// session record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    /// The questions in play order
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Creates a question set from questions in play order
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Returns the number of questions in the set
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Checks whether the set contains no questions
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Returns the question at the given 0-based index
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Iterates over the questions in play order
    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}

/// Errors that can occur when loading questions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The question source could not be reached
    #[error("question source for subject {0} is unreachable")]
    Unreachable(SubjectId),
}

/// Interface of the persistence collaborator that supplies questions
///
/// The source must return questions in a deterministic order for the same
/// `(subject, count)` query; the session-creation step relies on this when
/// it freezes the set for all participants.
pub trait QuestionSource {
    /// Fetches up to `count` questions for the given subject
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unreachable`] if the source cannot be reached; the
    /// caller surfaces this and offers a manual retry.
    fn fetch(&self, subject: &SubjectId, count: usize) -> Result<QuestionSet, Error>;
}
