//! Configuration constants for the challenge system
//!
//! This module contains the limits and constraints used throughout the
//! challenge subsystem to ensure data integrity and provide consistent
//! boundaries for catalog entries, questions, and result handling.

/// Challenge definition configuration constants
pub mod challenge {
    /// Maximum length of a challenge title in characters
    pub const MAX_TITLE_LENGTH: usize = 200;
    /// Maximum length of a challenge description in characters
    pub const MAX_DESCRIPTION_LENGTH: usize = 500;
    /// Maximum number of questions in a single challenge
    pub const MAX_QUESTION_COUNT: usize = 50;
    /// Minimum time limit in seconds for a challenge session
    pub const MIN_TIME_LIMIT: u64 = 30;
    /// Maximum time limit in seconds for a challenge session
    pub const MAX_TIME_LIMIT: u64 = 3600;
    /// Maximum number of participants tracked in a lobby roster
    pub const MAX_PARTICIPANT_COUNT: usize = 100;
}

/// Question configuration constants
pub mod question {
    /// Maximum length of a question prompt in characters
    pub const MAX_PROMPT_LENGTH: usize = 400;
    /// Minimum number of answer options per question (true/false questions)
    pub const MIN_OPTION_COUNT: usize = 2;
    /// Maximum number of answer options per question
    pub const MAX_OPTION_COUNT: usize = 8;
    /// Maximum length of an answer option in characters
    pub const MAX_OPTION_LENGTH: usize = 200;
}

/// Result submission configuration constants
pub mod results {
    /// Number of times a failed result submission is retried before surfacing
    pub const SUBMIT_RETRIES: usize = 1;
}
