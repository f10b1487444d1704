//! Challenge catalog and definitions
//!
//! This module holds the static, read-only list of challenge definitions
//! that participants can pick from. Definitions are seeded out-of-band by
//! the content pipeline; this subsystem only reads them, validates their
//! bounds, and resolves them by identifier when a session is created.

use std::fmt::Display;

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::Duration;

/// An opaque identifier of a challenge definition
///
/// Challenge identifiers are assigned by the content pipeline (for example
/// `"challenge-math-1"`) and are treated as opaque strings here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChallengeId(String);

impl ChallengeId {
    /// Creates a challenge identifier from its string form
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ChallengeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ChallengeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// An opaque identifier of a subject (curriculum area) questions belong to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(String);

impl SubjectId {
    /// Creates a subject identifier from its string form
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

type ValidationResult = garde::Result;

/// Validates that a duration falls within specified bounds
fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    field: &'static str,
    val: &Duration,
) -> ValidationResult {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "{field} is outside of the bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

/// Validates the time limit of a challenge definition
fn validate_time_limit(val: &Duration) -> ValidationResult {
    validate_duration::<
        { crate::constants::challenge::MIN_TIME_LIMIT },
        { crate::constants::challenge::MAX_TIME_LIMIT },
    >("time_limit", val)
}

/// An immutable, catalog-sourced definition of one challenge
///
/// A definition names the subject its questions are drawn from, how many
/// questions one play-through contains, and the shared time budget every
/// participant answers under.
#[serde_with::serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChallengeDefinition {
    /// Identifier of the challenge
    #[garde(skip)]
    pub id: ChallengeId,
    /// Title shown in the challenge list
    #[garde(length(max = crate::constants::challenge::MAX_TITLE_LENGTH))]
    pub title: String,
    /// Short description shown under the title
    #[garde(length(max = crate::constants::challenge::MAX_DESCRIPTION_LENGTH))]
    pub description: String,
    /// Subject the question set is drawn from
    #[garde(skip)]
    pub subject_id: SubjectId,
    /// Number of questions in one play-through
    #[garde(range(min = 1, max = crate::constants::challenge::MAX_QUESTION_COUNT))]
    pub question_count: usize,
    /// Shared time budget for answering the whole question set
    #[garde(custom(|v, _| validate_time_limit(v)))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub time_limit: Duration,
}

/// Errors that can occur when resolving catalog entries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The referenced challenge definition does not exist
    #[error("challenge {0} does not exist")]
    UnknownChallenge(ChallengeId),
}

/// The read-only list of challenge definitions
///
/// The catalog is built once from seeded content and never mutated by the
/// challenge subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// All available challenge definitions in display order
    challenges: Vec<ChallengeDefinition>,
}

impl Catalog {
    /// Creates a catalog from a list of challenge definitions
    pub fn new(challenges: Vec<ChallengeDefinition>) -> Self {
        Self { challenges }
    }

    /// Resolves a challenge definition by its identifier
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownChallenge`] if no definition carries the
    /// given identifier.
    pub fn get(&self, id: &ChallengeId) -> Result<&ChallengeDefinition, Error> {
        self.challenges
            .iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| Error::UnknownChallenge(id.clone()))
    }

    /// Iterates over the definitions in display order
    pub fn iter(&self) -> impl Iterator<Item = &ChallengeDefinition> {
        self.challenges.iter()
    }

    /// Returns the number of definitions in the catalog
    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    /// Checks whether the catalog contains no definitions
    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn math_challenge() -> ChallengeDefinition {
        ChallengeDefinition {
            id: ChallengeId::new("challenge-math-1"),
            title: "Math Sprint".to_owned(),
            description: "Five quick questions".to_owned(),
            subject_id: SubjectId::new("math"),
            question_count: 5,
            time_limit: Duration::from_secs(120),
        }
    }

    #[test]
    fn test_get_known_challenge() {
        let catalog = Catalog::new(vec![math_challenge()]);
        let definition = catalog.get(&ChallengeId::new("challenge-math-1")).unwrap();

        assert_eq!(definition.question_count, 5);
        assert_eq!(definition.time_limit, Duration::from_secs(120));
    }

    #[test]
    fn test_get_unknown_challenge() {
        let catalog = Catalog::new(vec![math_challenge()]);
        let err = catalog.get(&ChallengeId::new("does-not-exist")).unwrap_err();

        assert_eq!(
            err,
            Error::UnknownChallenge(ChallengeId::new("does-not-exist"))
        );
    }

    #[test]
    fn test_definition_validation_bounds() {
        let valid = math_challenge();
        assert!(valid.validate().is_ok());

        let too_short = ChallengeDefinition {
            time_limit: Duration::from_secs(5),
            ..math_challenge()
        };
        assert!(too_short.validate().is_err());

        let no_questions = ChallengeDefinition {
            question_count: 0,
            ..math_challenge()
        };
        assert!(no_questions.validate().is_err());
    }

    #[test]
    fn test_challenge_id_serialization() {
        let id = ChallengeId::new("challenge-math-1");
        let serialized = serde_json::to_string(&id).unwrap();
        assert_eq!(serialized, "\"challenge-math-1\"");

        let deserialized: ChallengeId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn test_catalog_iteration_order() {
        let second = ChallengeDefinition {
            id: ChallengeId::new("challenge-physics-1"),
            ..math_challenge()
        };
        let catalog = Catalog::new(vec![math_challenge(), second]);

        let ids: Vec<_> = catalog.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["challenge-math-1", "challenge-physics-1"]);
        assert_eq!(catalog.len(), 2);
        assert!(!catalog.is_empty());
    }
}
