//! Result submission and ranking
//!
//! This module persists each participant's outcome as an append-only record
//! and produces the ranked leaderboard for a finished session. Records are
//! written once per `(lobby, participant)` pair; the store enforces that
//! uniqueness and reports a conflicting write as "already recorded" rather
//! than an error. The ranking is recomputed freshly on every read and never
//! cached.

use std::cmp::Ordering;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use web_time::Duration;

use crate::lobby::LobbyId;

/// The durable record of one participant's outcome for one session
///
/// Created when the participant's play loop ends, never mutated, never
/// deleted. The avatar travels with the record so the results view can be
/// rendered without consulting the identity collaborator again.
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// The session this outcome belongs to
    pub lobby_id: LobbyId,
    /// Display name of the participant who submitted it
    pub player_name: String,
    /// Avatar of the participant, for the results view
    pub avatar_url: String,
    /// Number of correctly answered questions
    pub score: usize,
    /// Elapsed time from game start to submission, capped at the time
    /// limit; absent for legacy records that predate time tracking
    #[serde_as(as = "Option<serde_with::DurationSeconds<u64>>")]
    pub finish_time: Option<Duration>,
}

/// Whether a submission created a new record or hit an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The outcome was appended as a new record
    Recorded,
    /// A record for this `(lobby, participant)` pair already existed; the
    /// new outcome was discarded
    AlreadyRecorded,
}

/// Errors that can occur when persisting or loading results
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The result write failed
    #[error("failed to persist result for {0}")]
    Submission(String),
    /// The results for a session could not be loaded
    #[error("failed to load results for lobby {0}")]
    Fetch(LobbyId),
}

/// Interface of the persistence collaborator that owns result records
///
/// Implementations must enforce uniqueness of `(lobby_id, player_name)`:
/// a second write for the same pair keeps the first record and reports
/// [`Submission::AlreadyRecorded`].
pub trait ResultStore {
    /// Appends a participant's outcome
    ///
    /// # Errors
    ///
    /// Returns [`Error::Submission`] if the write fails. A conflicting
    /// write is not an error; it reports [`Submission::AlreadyRecorded`].
    fn submit(&mut self, record: ResultRecord) -> Result<Submission, Error>;

    /// Returns all result records for a session, unranked
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] if the records cannot be loaded.
    fn fetch(&self, lobby_id: &LobbyId) -> Result<Vec<ResultRecord>, Error>;
}

/// Submits an outcome, retrying once before surfacing the failure
///
/// A participant's score must not be dropped silently: the write is retried
/// [`SUBMIT_RETRIES`](crate::constants::results::SUBMIT_RETRIES) times and
/// only then surfaced to the caller.
///
/// # Errors
///
/// Returns the last [`Error::Submission`] once all retries are exhausted.
pub fn submit_with_retry(
    store: &mut impl ResultStore,
    record: ResultRecord,
) -> Result<Submission, Error> {
    let mut attempt = 0;
    loop {
        match store.submit(record.clone()) {
            Ok(submission) => return Ok(submission),
            Err(error) if attempt < crate::constants::results::SUBMIT_RETRIES => {
                warn!(player = %record.player_name, %error, "result submission failed, retrying");
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

/// Orders result records into the session leaderboard
///
/// Sorts by score descending; ties are broken by finish time ascending (the
/// faster finisher ranks higher), and a record without a finish time sorts
/// after all records that have one within its score tier. The sort is
/// stable, so applying it twice yields the same order.
pub fn ranked(records: Vec<ResultRecord>) -> Vec<ResultRecord> {
    records
        .into_iter()
        .sorted_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| match (a.finish_time, b.finish_time) {
                    (Some(a_time), Some(b_time)) => a_time.cmp(&b_time),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                })
        })
        .collect_vec()
}
