//! Lobby state machine and session lifecycle
//!
//! This module tracks the three-state lifecycle of one play-through
//! (`waiting → running → finished`) and gates when each client moves from
//! waiting in the lobby to answering questions to viewing results. The
//! status lives in two places with different guarantees: durably on the
//! [`SessionRecord`] (the authoritative copy, advanced through guarded
//! writes) and as best-effort broadcasts on the session channel (the fast
//! path every attached client observes). Clients read the record first and
//! subscribe second, so a late joiner or reconnecting client always
//! recovers the authoritative status even if it missed every broadcast.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;
use web_time::Duration;

use crate::{
    catalog::{self, Catalog, ChallengeId},
    channel::{self, BroadcastEvent, Channel, Connector, Presence, RosterSnapshot},
    play::{Outcome, PlayLoop},
    question::{self, QuestionSet, QuestionSource},
    results::{self, ResultRecord, ResultStore, Submission},
    store::{self, Applied, SessionStore},
};

/// A unique identifier for a lobby session
///
/// A session is referenced by its identifier for the lifetime of one
/// play-through only; identifiers are never reused.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct LobbyId(Uuid);

impl LobbyId {
    /// Creates a new random lobby identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LobbyId {
    /// Creates a new random lobby identifier (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for LobbyId {
    /// Formats the identifier as a UUID string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for LobbyId {
    type Err = uuid::Error;

    /// Parses a lobby identifier from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// The lifecycle status of a lobby session
///
/// Variant order is lifecycle order: the derived `Ord` ranks `Waiting`
/// before `Running` before `Finished`, and transitions only ever move
/// forward. A client may legitimately observe any of the three as its
/// first status when it joins mid-flight.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Participants are gathering; the host has not started the game
    Waiting,
    /// The question set is in play under the shared time budget
    Running,
    /// At least one participant finished; results are available
    Finished,
}

impl Status {
    /// Checks whether this status comes strictly before another
    ///
    /// Equal and regressing statuses do not precede; this is the guard
    /// every status write and every observed broadcast goes through.
    pub fn precedes(self, next: Status) -> bool {
        self < next
    }
}

/// The durable record of one lobby session
///
/// Owned by the persistence collaborator; this subsystem holds a transient
/// copy during an active play-through. The record carries the question set
/// frozen at creation time, so every participant — including late joiners —
/// plays the exact same questions in the exact same order.
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Identifier of the session
    pub id: LobbyId,
    /// The challenge definition this session plays
    pub challenge_id: ChallengeId,
    /// Challenge title, for the lobby header
    pub title: String,
    /// Display name of the participant who created the session
    pub host_name: String,
    /// Current lifecycle status
    pub status: Status,
    /// Shared time budget copied from the challenge definition
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub time_limit: Duration,
    /// The question set frozen at session creation
    pub questions: QuestionSet,
}

/// Errors that can occur in lobby operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Catalog lookup failed
    #[error("catalog error: {0}")]
    Catalog(#[from] catalog::Error),
    /// Channel attach or send failed
    #[error("channel error: {0}")]
    Channel(#[from] channel::Error),
    /// Question loading failed
    #[error("question error: {0}")]
    Questions(#[from] question::Error),
    /// Session store read or write failed
    #[error("session store error: {0}")]
    Store(#[from] store::Error),
    /// Result store read or write failed
    #[error("result store error: {0}")]
    Results(#[from] results::Error),
    /// The question source returned nothing to freeze for this challenge
    #[error("the frozen question set for challenge {0} is empty")]
    EmptyQuestionSet(ChallengeId),
    /// A non-host participant tried to start the session
    #[error("only the host may start the session")]
    NotHost,
}

/// Creates a new lobby session for a catalog challenge
///
/// Resolves the challenge definition, freezes its question set by fetching
/// it exactly once, and persists the record in `Waiting` status with the
/// caller as host. The caller is expected to [`Lobby::join`] immediately
/// afterwards to attach to the session channel.
///
/// # Errors
///
/// - [`Error::Catalog`] if the challenge does not exist; no session is
///   created.
/// - [`Error::Questions`] if the question source cannot be reached.
/// - [`Error::EmptyQuestionSet`] if the source has no questions for the
///   challenge's subject.
/// - [`Error::Store`] if the record cannot be persisted.
pub fn create_session(
    catalog: &Catalog,
    source: &impl QuestionSource,
    session_store: &mut impl SessionStore,
    challenge_id: &ChallengeId,
    host: &Presence,
) -> Result<SessionRecord, Error> {
    let definition = catalog.get(challenge_id)?;
    let questions = source.fetch(&definition.subject_id, definition.question_count)?;
    if questions.is_empty() {
        return Err(Error::EmptyQuestionSet(definition.id.clone()));
    }

    let record = SessionRecord {
        id: LobbyId::new(),
        challenge_id: definition.id.clone(),
        title: definition.title.clone(),
        host_name: host.name.clone(),
        status: Status::Waiting,
        time_limit: definition.time_limit,
        questions,
    };
    session_store.create(record.clone())?;

    debug!(lobby = %record.id, challenge = %record.challenge_id, host = %record.host_name, "session created");

    Ok(record)
}

/// One client's live view of a lobby session
///
/// Owns the channel attachment for the session and replicates the lobby
/// status and roster from incoming channel traffic. The embedding event
/// loop feeds received broadcasts into [`Lobby::receive_broadcast`] and
/// presence snapshots into [`Lobby::receive_roster`], and must call
/// [`Lobby::leave`] on every exit path so the attachment is released.
#[derive(Debug)]
pub struct Lobby<C: Channel> {
    /// Durable session snapshot; `status` is advanced by observed traffic
    record: SessionRecord,
    /// This client's announced identity
    identity: Presence,
    /// Last roster snapshot received from the presence mechanism
    roster: RosterSnapshot,
    /// The owned channel attachment
    handle: C,
}

impl<C: Channel> Lobby<C> {
    /// Joins an existing lobby session
    ///
    /// Fetch-then-subscribe: reads the durable record first so the caller
    /// enters at the authoritative status (any of the three states is a
    /// valid entry point), then attaches the channel and announces the
    /// caller's presence. A client that reconnects after missing
    /// broadcasts recovers the current status the same way.
    ///
    /// # Errors
    ///
    /// - [`Error::Store`] if the session does not exist.
    /// - [`Error::Channel`] if the channel cannot be attached; nothing is
    ///   left acquired.
    pub fn join<K: Connector<Handle = C>>(
        session_store: &impl SessionStore,
        connector: &K,
        lobby_id: &LobbyId,
        identity: Presence,
    ) -> Result<Self, Error> {
        let record = session_store.fetch(lobby_id)?;
        let handle = connector.attach(record.id)?;
        handle.announce_presence(&identity);

        debug!(lobby = %record.id, player = %identity.name, status = ?record.status, "joined lobby");

        Ok(Self {
            record,
            identity,
            roster: RosterSnapshot::default(),
            handle,
        })
    }

    /// Starts the game
    ///
    /// Host-only: validated against the durable record's host identity, not
    /// trusted from the broadcast. The status is advanced through a guarded
    /// store write first; only a write that actually changed the record is
    /// followed by a broadcast, so a double-start emits one transition.
    ///
    /// # Errors
    ///
    /// - [`Error::NotHost`] if the caller did not create the session.
    /// - [`Error::Store`] if the guarded write fails.
    pub fn request_start(&mut self, session_store: &mut impl SessionStore) -> Result<Status, Error> {
        if self.identity.name != self.record.host_name {
            warn!(lobby = %self.record.id, player = %self.identity.name, "start rejected: not the host");
            return Err(Error::NotHost);
        }

        self.transition(session_store, Status::Running)
    }

    /// Marks the session finished
    ///
    /// Emitted by whichever client's play loop completes first; any
    /// participant may trigger it. Later finishers hit the guarded write's
    /// no-op path and broadcast nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the guarded write fails.
    pub fn request_finish(
        &mut self,
        session_store: &mut impl SessionStore,
    ) -> Result<Status, Error> {
        self.transition(session_store, Status::Finished)
    }

    /// Advances the durable status and broadcasts the change if it applied
    fn transition(
        &mut self,
        session_store: &mut impl SessionStore,
        to: Status,
    ) -> Result<Status, Error> {
        let applied = session_store.transition(&self.record.id, to)?;
        let status = applied.status();
        self.observe_status(status);

        if let Applied::Changed(changed) = applied {
            debug!(lobby = %self.record.id, status = ?changed, "broadcasting status change");
            self.handle.broadcast(&BroadcastEvent::StatusChange(changed));
        }

        Ok(status)
    }

    /// Applies a broadcast event received on the session channel
    ///
    /// Status observation is monotonic: a stale or repeated status is
    /// ignored, so the sequence of statuses seen at this client is always a
    /// subsequence of `waiting, running, finished` regardless of delivery
    /// order.
    pub fn receive_broadcast(&mut self, event: &BroadcastEvent) {
        match event {
            BroadcastEvent::StatusChange(next) => self.observe_status(*next),
        }
    }

    /// Replaces the roster with a presence snapshot from the channel
    ///
    /// The roster is a read-only projection of the channel's live
    /// connection table; the lobby never mutates presence beyond its own
    /// announcement in [`Lobby::join`].
    pub fn receive_roster(&mut self, snapshot: RosterSnapshot) {
        self.roster = snapshot;
    }

    /// Advances the replicated status if the observation moves it forward
    fn observe_status(&mut self, next: Status) {
        if self.record.status.precedes(next) {
            debug!(lobby = %self.record.id, from = ?self.record.status, to = ?next, "status advanced");
            self.record.status = next;
        } else if next != self.record.status {
            warn!(lobby = %self.record.id, stale = ?next, current = ?self.record.status, "ignoring stale status");
        }
    }

    /// Starts this participant's play loop over the frozen question set
    ///
    /// Returns `None` unless the session is `Running`; a participant still
    /// waiting (or already viewing results) has nothing to play.
    pub fn begin_play(&self) -> Option<PlayLoop> {
        if self.record.status != Status::Running {
            return None;
        }
        Some(PlayLoop::new(
            self.record.questions.clone(),
            self.record.time_limit,
        ))
    }

    /// Submits this participant's outcome and marks the session finished
    ///
    /// The result write happens first (with one retry, so a transient
    /// failure does not drop the score); the finish transition is emitted
    /// after the record is durable. The store deduplicates, so a repeated
    /// call reports [`Submission::AlreadyRecorded`] and stores nothing new.
    ///
    /// # Errors
    ///
    /// - [`Error::Results`] if the result write keeps failing.
    /// - [`Error::Store`] if the finish transition fails.
    pub fn submit_outcome(
        &mut self,
        session_store: &mut impl SessionStore,
        result_store: &mut impl ResultStore,
        outcome: &Outcome,
    ) -> Result<Submission, Error> {
        let record = ResultRecord {
            lobby_id: self.record.id,
            player_name: self.identity.name.clone(),
            avatar_url: self.identity.avatar_url.clone(),
            score: outcome.score,
            finish_time: Some(outcome.finish_time.min(self.record.time_limit)),
        };
        let submission = results::submit_with_retry(result_store, record)?;

        self.request_finish(session_store)?;

        Ok(submission)
    }

    /// Fetches and ranks all results for this session
    ///
    /// The total order is recomputed freshly on every call; see
    /// [`results::ranked`] for the tie-break rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Results`] if the records cannot be loaded.
    pub fn results(&self, result_store: &impl ResultStore) -> Result<Vec<ResultRecord>, Error> {
        Ok(results::ranked(result_store.fetch(&self.record.id)?))
    }

    /// Leaves the lobby and releases the channel attachment
    ///
    /// Must be called on every exit path: success, error, or the user
    /// navigating away. Presence removal happens implicitly when the
    /// attachment drops.
    pub fn leave(self) {
        debug!(lobby = %self.record.id, player = %self.identity.name, "leaving lobby");
        self.handle.detach();
    }

    /// Returns the session identifier
    pub fn id(&self) -> LobbyId {
        self.record.id
    }

    /// Returns the replicated lifecycle status
    pub fn status(&self) -> Status {
        self.record.status
    }

    /// Returns the challenge title, for the lobby header
    pub fn title(&self) -> &str {
        &self.record.title
    }

    /// Returns the host's display name
    pub fn host_name(&self) -> &str {
        &self.record.host_name
    }

    /// Checks whether this client is the session host
    pub fn is_host(&self) -> bool {
        self.identity.name == self.record.host_name
    }

    /// Returns this client's announced identity
    pub fn identity(&self) -> &Presence {
        &self.identity
    }

    /// Returns the last received roster snapshot
    pub fn roster(&self) -> &RosterSnapshot {
        &self.roster
    }

    /// Returns the frozen question set of this session
    pub fn questions(&self) -> &QuestionSet {
        &self.record.questions
    }

    /// Returns the session's shared time budget
    pub fn time_limit(&self) -> Duration {
        self.record.time_limit
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        catalog::{ChallengeDefinition, SubjectId},
        channel::testing::{RecordingChannel, RecordingConnector},
        play::Progress,
        question::{OptionChoice, Question, QuestionId},
        store::MemoryBackend,
    };

    fn presence(name: &str) -> Presence {
        Presence {
            name: name.to_owned(),
            avatar_url: format!("https://avatars.test/{name}.png"),
        }
    }

    fn math_question(n: usize) -> Question {
        Question {
            id: QuestionId::new(),
            prompt: format!("question {n}"),
            options: vec![
                OptionChoice {
                    text: "wrong".to_owned(),
                    correct: false,
                },
                OptionChoice {
                    text: "right".to_owned(),
                    correct: true,
                },
            ],
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![ChallengeDefinition {
            id: ChallengeId::new("challenge-math-1"),
            title: "Math Sprint".to_owned(),
            description: "Five quick questions".to_owned(),
            subject_id: SubjectId::new("math"),
            question_count: 5,
            time_limit: Duration::from_secs(120),
        }])
    }

    fn backend() -> MemoryBackend {
        let mut backend = MemoryBackend::new();
        backend.seed_questions(
            SubjectId::new("math"),
            (0..8).map(math_question).collect(),
        );
        backend
    }

    fn create(backend: &mut MemoryBackend) -> SessionRecord {
        create_session(
            &catalog(),
            &backend.clone(),
            backend,
            &ChallengeId::new("challenge-math-1"),
            &presence("host"),
        )
        .unwrap()
    }

    fn join(
        backend: &MemoryBackend,
        connector: &RecordingConnector,
        lobby_id: &LobbyId,
        name: &str,
    ) -> Lobby<RecordingChannel> {
        Lobby::join(backend, connector, lobby_id, presence(name)).unwrap()
    }

    #[test]
    fn test_create_session_waiting_with_caller_as_host() {
        let mut backend = backend();
        let record = create(&mut backend);

        assert_eq!(record.status, Status::Waiting);
        assert_eq!(record.host_name, "host");
        assert_eq!(record.questions.len(), 5);
        assert_eq!(record.time_limit, Duration::from_secs(120));

        // The record is durable and readable back by id.
        let fetched = SessionStore::fetch(&backend, &record.id).unwrap();
        assert_eq!(fetched, record);
    }

    #[test]
    fn test_create_session_unknown_challenge() {
        let mut backend = backend();
        let err = create_session(
            &catalog(),
            &backend.clone(),
            &mut backend,
            &ChallengeId::new("does-not-exist"),
            &presence("host"),
        )
        .unwrap_err();

        assert_eq!(
            err,
            Error::Catalog(catalog::Error::UnknownChallenge(ChallengeId::new(
                "does-not-exist"
            )))
        );
        assert_eq!(backend.session_count(), 0);
    }

    #[test]
    fn test_create_session_empty_question_set() {
        let mut backend = MemoryBackend::new();
        let err = create_session(
            &catalog(),
            &backend.clone(),
            &mut backend,
            &ChallengeId::new("challenge-math-1"),
            &presence("host"),
        )
        .unwrap_err();

        assert_eq!(
            err,
            Error::EmptyQuestionSet(ChallengeId::new("challenge-math-1"))
        );
        assert_eq!(backend.session_count(), 0);
    }

    #[test]
    fn test_join_announces_presence() {
        let mut backend = backend();
        let record = create(&mut backend);
        let connector = RecordingConnector::default();

        let lobby = join(&backend, &connector, &record.id, "host");

        assert_eq!(lobby.status(), Status::Waiting);
        assert!(lobby.is_host());
        assert_eq!(lobby.title(), "Math Sprint");
        assert_eq!(connector.log.borrow().presences, vec![presence("host")]);
    }

    #[test]
    fn test_join_unknown_lobby() {
        let backend = backend();
        let connector = RecordingConnector::default();
        let missing = LobbyId::new();

        let err =
            Lobby::join(&backend, &connector, &missing, presence("aya")).unwrap_err();

        assert_eq!(err, Error::Store(store::Error::UnknownLobby(missing)));
    }

    #[test]
    fn test_join_channel_unreachable() {
        let mut backend = backend();
        let record = create(&mut backend);
        let connector = RecordingConnector {
            unreachable: true,
            ..RecordingConnector::default()
        };

        let err = Lobby::join(&backend, &connector, &record.id, presence("aya")).unwrap_err();

        assert_eq!(err, Error::Channel(channel::Error::Unreachable(record.id)));
    }

    #[test]
    fn test_only_host_may_start() {
        let mut backend = backend();
        let record = create(&mut backend);
        let connector = RecordingConnector::default();
        let mut guest = join(&backend, &connector, &record.id, "aya");

        assert_eq!(guest.request_start(&mut backend).unwrap_err(), Error::NotHost);
        assert_eq!(guest.status(), Status::Waiting);
        assert!(connector.log.borrow().broadcasts.is_empty());
    }

    #[test]
    fn test_host_start_advances_and_broadcasts() {
        let mut backend = backend();
        let record = create(&mut backend);
        let connector = RecordingConnector::default();
        let mut host = join(&backend, &connector, &record.id, "host");

        let status = host.request_start(&mut backend).unwrap();

        assert_eq!(status, Status::Running);
        assert_eq!(host.status(), Status::Running);
        assert_eq!(
            connector.log.borrow().broadcasts,
            vec![BroadcastEvent::StatusChange(Status::Running)]
        );

        // A double start changes nothing and broadcasts nothing more.
        assert_eq!(host.request_start(&mut backend).unwrap(), Status::Running);
        assert_eq!(connector.log.borrow().broadcasts.len(), 1);
    }

    #[test]
    fn test_status_observation_is_monotonic() {
        let mut backend = backend();
        let record = create(&mut backend);
        let connector = RecordingConnector::default();
        let mut lobby = join(&backend, &connector, &record.id, "aya");

        lobby.receive_broadcast(&BroadcastEvent::StatusChange(Status::Running));
        assert_eq!(lobby.status(), Status::Running);

        // Stale and repeated statuses are ignored.
        lobby.receive_broadcast(&BroadcastEvent::StatusChange(Status::Waiting));
        assert_eq!(lobby.status(), Status::Running);
        lobby.receive_broadcast(&BroadcastEvent::StatusChange(Status::Running));
        assert_eq!(lobby.status(), Status::Running);

        lobby.receive_broadcast(&BroadcastEvent::StatusChange(Status::Finished));
        assert_eq!(lobby.status(), Status::Finished);
        lobby.receive_broadcast(&BroadcastEvent::StatusChange(Status::Running));
        assert_eq!(lobby.status(), Status::Finished);
    }

    #[test]
    fn test_late_joiner_enters_at_authoritative_status() {
        let mut backend = backend();
        let record = create(&mut backend);
        let connector = RecordingConnector::default();
        let mut host = join(&backend, &connector, &record.id, "host");
        host.request_start(&mut backend).unwrap();

        // The late joiner never saw the broadcast; the record carries it.
        let late = join(&backend, &connector, &record.id, "late");

        assert_eq!(late.status(), Status::Running);
        assert_eq!(late.questions(), &record.questions);
        assert!(late.begin_play().is_some());
    }

    #[test]
    fn test_begin_play_requires_running() {
        let mut backend = backend();
        let record = create(&mut backend);
        let connector = RecordingConnector::default();
        let mut lobby = join(&backend, &connector, &record.id, "aya");

        assert!(lobby.begin_play().is_none());

        lobby.receive_broadcast(&BroadcastEvent::StatusChange(Status::Running));
        let play = lobby.begin_play().unwrap();

        assert_eq!(play.question_count(), 5);
        assert_eq!(play.remaining(), Duration::from_secs(120));
    }

    #[test]
    fn test_roster_is_replaced_by_snapshots() {
        let mut backend = backend();
        let record = create(&mut backend);
        let connector = RecordingConnector::default();
        let mut lobby = join(&backend, &connector, &record.id, "host");

        lobby.receive_roster(RosterSnapshot::new(vec![
            presence("host"),
            presence("aya"),
        ]));
        assert_eq!(lobby.roster().len(), 2);

        // aya disconnects; the next snapshot silently drops her.
        lobby.receive_roster(RosterSnapshot::new(vec![presence("host")]));
        assert_eq!(lobby.roster().len(), 1);
        assert!(!lobby.roster().contains("aya"));
    }

    #[test]
    fn test_leave_releases_the_attachment() {
        let mut backend = backend();
        let record = create(&mut backend);
        let connector = RecordingConnector::default();
        let lobby = join(&backend, &connector, &record.id, "host");

        lobby.leave();

        assert!(connector.log.borrow().detached);
    }

    #[test]
    fn test_duplicate_outcome_is_deduplicated() {
        let mut backend = backend();
        let record = create(&mut backend);
        let connector = RecordingConnector::default();
        let mut host = join(&backend, &connector, &record.id, "host");
        host.request_start(&mut backend).unwrap();

        let outcome = Outcome {
            score: 3,
            finish_time: Duration::from_secs(50),
        };
        let mut results_backend = backend.clone();

        let first = host
            .submit_outcome(&mut backend, &mut results_backend, &outcome)
            .unwrap();
        let second = host
            .submit_outcome(&mut backend, &mut results_backend, &outcome)
            .unwrap();

        assert_eq!(first, Submission::Recorded);
        assert_eq!(second, Submission::AlreadyRecorded);
        assert_eq!(host.results(&results_backend).unwrap().len(), 1);
    }

    #[test]
    fn test_full_session_flow() {
        let mut backend = backend();
        let record = create(&mut backend);
        let connector = RecordingConnector::default();

        let mut host = join(&backend, &connector, &record.id, "host");
        let mut guest = join(&backend, &connector, &record.id, "aya");

        host.request_start(&mut backend).unwrap();
        guest.receive_broadcast(&BroadcastEvent::StatusChange(Status::Running));

        // The host answers everything correctly and quickly.
        let mut host_play = host.begin_play().unwrap();
        for _ in 0..20 {
            host_play.tick();
        }
        let mut host_progress = Progress::Continue;
        while host_progress == Progress::Continue {
            host_progress = host_play.answer(1);
        }
        let Progress::Finished(host_outcome) = host_progress else {
            panic!("expected the host loop to finish");
        };
        assert_eq!(host_outcome.score, 5);
        assert_eq!(host_outcome.finish_time, Duration::from_secs(20));

        // The guest gets two right, slower.
        let mut guest_play = guest.begin_play().unwrap();
        for _ in 0..40 {
            guest_play.tick();
        }
        guest_play.answer(1);
        guest_play.answer(0);
        guest_play.answer(1);
        guest_play.answer(0);
        let Progress::Finished(guest_outcome) = guest_play.answer(0) else {
            panic!("expected the guest loop to finish");
        };
        assert_eq!(guest_outcome.score, 2);

        let mut results_backend = MemoryBackend::new();
        host.submit_outcome(&mut backend, &mut results_backend, &host_outcome)
            .unwrap();
        guest.submit_outcome(&mut backend, &mut results_backend, &guest_outcome)
            .unwrap();

        // Exactly one finish broadcast despite two finishers.
        let finish_broadcasts = connector
            .log
            .borrow()
            .broadcasts
            .iter()
            .filter(|e| **e == BroadcastEvent::StatusChange(Status::Finished))
            .count();
        assert_eq!(finish_broadcasts, 1);

        let leaderboard = host.results(&results_backend).unwrap();
        let names: Vec<_> = leaderboard.iter().map(|r| r.player_name.as_str()).collect();
        assert_eq!(names, ["host", "aya"]);
        assert_eq!(leaderboard[0].score, 5);

        host.leave();
        guest.leave();
    }
}
