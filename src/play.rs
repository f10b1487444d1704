//! Per-participant play loop
//!
//! This module drives one participant through the frozen question set under
//! the shared time budget. Every participant runs the same loop
//! independently; nothing here talks to the network. The embedding event
//! loop owns the actual one-second timer: it calls [`PlayLoop::tick`] once
//! per elapsed second and must stop ticking as soon as the loop reports
//! [`Progress::Finished`] or the hosting view is torn down.

use serde::Serialize;
use web_time::Duration;

use crate::question::{Question, QuestionSet};

/// The final outcome of one participant's play-through
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Number of correctly answered questions
    pub score: usize,
    /// Elapsed answering time, capped at the session's time limit
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub finish_time: Duration,
}

/// Result of feeding a tick or an answer into the play loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The loop is still running; keep ticking
    Continue,
    /// The loop terminated; stop the timer and submit the outcome
    Finished(Outcome),
}

/// One participant's countdown-and-answer loop
///
/// The loop terminates when all questions are answered or when the
/// countdown reaches zero, whichever occurs first. Once terminated it stays
/// terminated: further ticks and answers report the same outcome and change
/// nothing.
#[derive(Debug, Clone)]
pub struct PlayLoop {
    /// The frozen question set being played
    questions: QuestionSet,
    /// The session's full time budget in seconds
    time_limit_seconds: u64,
    /// Seconds left on the countdown
    remaining_seconds: u64,
    /// 0-based index of the question currently shown
    index: usize,
    /// Correct answers so far
    score: usize,
    /// Set once the loop terminates, by either path
    outcome: Option<Outcome>,
}

impl PlayLoop {
    /// Creates a play loop over an already-loaded question set
    ///
    /// The question set must be fetched before constructing the loop so the
    /// countdown measures answering time only, not load time.
    pub fn new(questions: QuestionSet, time_limit: Duration) -> Self {
        let time_limit_seconds = time_limit.as_secs();
        Self {
            questions,
            time_limit_seconds,
            remaining_seconds: time_limit_seconds,
            index: 0,
            score: 0,
            outcome: None,
        }
    }

    /// Advances the countdown by one second
    ///
    /// Must be called once per elapsed second by the embedding event loop.
    /// When the countdown reaches zero the loop terminates with
    /// `finish_time` equal to the full time limit.
    pub fn tick(&mut self) -> Progress {
        if let Some(outcome) = self.outcome {
            return Progress::Finished(outcome);
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            return self.finish();
        }

        Progress::Continue
    }

    /// Records an answer to the current question and advances past it
    ///
    /// Scores one point if the selected option is marked correct; an
    /// out-of-range index counts as a wrong answer. There is no partial
    /// credit, no negative scoring, and no going back to an earlier
    /// question. The timer wins the race with a same-second answer: once
    /// the countdown has reached zero, no answer is recorded.
    pub fn answer(&mut self, option_index: usize) -> Progress {
        if let Some(outcome) = self.outcome {
            return Progress::Finished(outcome);
        }
        if self.remaining_seconds == 0 {
            return self.finish();
        }

        let correct = self
            .questions
            .get(self.index)
            .and_then(|question| question.options.get(option_index))
            .is_some_and(|option| option.correct);
        if correct {
            self.score += 1;
        }

        self.index += 1;
        if self.index >= self.questions.len() {
            return self.finish();
        }

        Progress::Continue
    }

    /// Terminates the loop and freezes the outcome
    fn finish(&mut self) -> Progress {
        let outcome = Outcome {
            score: self.score,
            finish_time: Duration::from_secs(self.time_limit_seconds - self.remaining_seconds),
        };
        self.outcome = Some(outcome);
        Progress::Finished(outcome)
    }

    /// Returns the question currently awaiting an answer
    ///
    /// `None` once the loop has terminated.
    pub fn current_question(&self) -> Option<&Question> {
        if self.outcome.is_some() {
            return None;
        }
        self.questions.get(self.index)
    }

    /// Returns the 1-based number of the current question, for display
    pub fn question_number(&self) -> usize {
        (self.index + 1).min(self.questions.len().max(1))
    }

    /// Returns the total number of questions in the set
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Returns the time left on the countdown
    pub fn remaining(&self) -> Duration {
        Duration::from_secs(self.remaining_seconds)
    }

    /// Returns the score accumulated so far
    pub fn score(&self) -> usize {
        self.score
    }

    /// Checks whether the loop has terminated
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Returns the outcome if the loop has terminated
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }
}
