//! Session persistence interface and in-memory backend
//!
//! This module defines the trait through which session records are created,
//! read, and advanced, plus [`MemoryBackend`], an in-memory implementation
//! of all three persistence seams (sessions, results, questions). The
//! backend serves tests and single-process embeddings; a deployment backs
//! the same traits with its real database.
//!
//! Status writes go through [`SessionStore::transition`], which applies the
//! same forward-only guard as the in-client replica. Two clients racing to
//! finish a session both succeed, but only the first write reports
//! [`Applied::Changed`], and only that client broadcasts the change.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::{
    catalog::SubjectId,
    lobby::{LobbyId, SessionRecord, Status},
    question::{self, Question, QuestionSet, QuestionSource},
    results::{self, ResultRecord, ResultStore, Submission},
};

/// Errors that can occur in session persistence
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No session record exists for the given lobby
    #[error("no session exists for lobby {0}")]
    UnknownLobby(LobbyId),
    /// A session record with the given lobby id already exists
    #[error("a session already exists for lobby {0}")]
    DuplicateLobby(LobbyId),
}

/// Result of a guarded status write
///
/// Both variants are successes; the distinction tells the caller whether it
/// was the write that moved the record, and therefore whether it should
/// broadcast the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The write advanced the record to the carried status
    Changed(Status),
    /// The record was already at or past the requested status; the carried
    /// status is the record's current one
    Unchanged(Status),
}

impl Applied {
    /// Returns the record's status after the write
    pub fn status(self) -> Status {
        match self {
            Self::Changed(status) | Self::Unchanged(status) => status,
        }
    }
}

/// Interface of the persistence collaborator that owns session records
pub trait SessionStore {
    /// Persists a freshly created session record
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateLobby`] if a record with the same id
    /// already exists.
    fn create(&mut self, record: SessionRecord) -> Result<(), Error>;

    /// Reads the session record for a lobby
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLobby`] if no record exists.
    fn fetch(&self, lobby_id: &LobbyId) -> Result<SessionRecord, Error>;

    /// Advances a session's status if the write moves it forward
    ///
    /// The guard makes the write idempotent and immune to stale requests: a
    /// status at or behind the record's current one leaves the record
    /// untouched and reports [`Applied::Unchanged`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLobby`] if no record exists.
    fn transition(&mut self, lobby_id: &LobbyId, to: Status) -> Result<Applied, Error>;
}

/// In-memory backend for all three persistence seams
///
/// Holds session records, result records, and a per-subject question bank
/// in plain maps. Questions are served in seeded order, so repeated fetches
/// for the same subject yield the same frozen set.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    /// Session records by lobby id
    sessions: HashMap<LobbyId, SessionRecord>,
    /// Result records in submission order
    results: Vec<ResultRecord>,
    /// Question bank, keyed by subject
    questions: HashMap<SubjectId, Vec<Question>>,
}

impl MemoryBackend {
    /// Creates an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds questions to the bank for a subject, in fetch order
    pub fn seed_questions(&mut self, subject: SubjectId, questions: Vec<Question>) {
        self.questions.entry(subject).or_default().extend(questions);
    }

    /// Returns the number of stored session records
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl SessionStore for MemoryBackend {
    fn create(&mut self, record: SessionRecord) -> Result<(), Error> {
        if self.sessions.contains_key(&record.id) {
            return Err(Error::DuplicateLobby(record.id));
        }
        debug!(lobby = %record.id, "storing session record");
        self.sessions.insert(record.id, record);
        Ok(())
    }

    fn fetch(&self, lobby_id: &LobbyId) -> Result<SessionRecord, Error> {
        self.sessions
            .get(lobby_id)
            .cloned()
            .ok_or(Error::UnknownLobby(*lobby_id))
    }

    fn transition(&mut self, lobby_id: &LobbyId, to: Status) -> Result<Applied, Error> {
        let record = self
            .sessions
            .get_mut(lobby_id)
            .ok_or(Error::UnknownLobby(*lobby_id))?;

        if record.status.precedes(to) {
            record.status = to;
            Ok(Applied::Changed(to))
        } else {
            Ok(Applied::Unchanged(record.status))
        }
    }
}

impl ResultStore for MemoryBackend {
    fn submit(&mut self, record: ResultRecord) -> Result<Submission, results::Error> {
        let exists = self
            .results
            .iter()
            .any(|r| r.lobby_id == record.lobby_id && r.player_name == record.player_name);
        if exists {
            return Ok(Submission::AlreadyRecorded);
        }
        self.results.push(record);
        Ok(Submission::Recorded)
    }

    fn fetch(&self, lobby_id: &LobbyId) -> Result<Vec<ResultRecord>, results::Error> {
        Ok(self
            .results
            .iter()
            .filter(|r| r.lobby_id == *lobby_id)
            .cloned()
            .collect())
    }
}

impl QuestionSource for MemoryBackend {
    fn fetch(&self, subject: &SubjectId, count: usize) -> Result<QuestionSet, question::Error> {
        let bank = self.questions.get(subject).map_or(&[][..], Vec::as_slice);
        Ok(QuestionSet::new(
            bank.iter().take(count).cloned().collect(),
        ))
    }
}
