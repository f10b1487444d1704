//! Session/presence channel interface
//!
//! This module defines the traits for the external publish/subscribe
//! collaborator that scopes one ephemeral topic to each lobby. The channel
//! carries two kinds of traffic: presence (who is connected, with display
//! metadata) and broadcast events (lobby status transitions). Delivery is
//! best-effort and at-most-once, nothing is queued for late joiners, and no
//! ordering holds across distinct clients; the lobby state machine is
//! written against exactly these guarantees.
//!
//! Incoming traffic flows the other way: the embedding event loop passes
//! received events into [`crate::lobby::Lobby::receive_broadcast`] and
//! [`crate::lobby::Lobby::receive_roster`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lobby::{LobbyId, Status};

/// The display identity a connected client announces on its channel
///
/// Identity is resolved by the external auth collaborator; this subsystem
/// treats both fields as opaque, already-resolved strings. Uniqueness of
/// `name` within a session is not enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    /// Display name of the participant
    pub name: String,
    /// URL of the participant's avatar image
    pub avatar_url: String,
}

/// A full snapshot of the currently connected participants
///
/// The presence mechanism reports the complete roster on every change, not
/// a diff; the last snapshot received wins. A participant disappears from
/// the snapshot the moment its connection drops, with no grace period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    /// The connected participants, in channel-reported order
    participants: Vec<Presence>,
}

impl RosterSnapshot {
    /// Creates a snapshot from the channel-reported participant list
    ///
    /// The list is truncated to
    /// [`MAX_PARTICIPANT_COUNT`](crate::constants::challenge::MAX_PARTICIPANT_COUNT).
    pub fn new(participants: Vec<Presence>) -> Self {
        let mut participants = participants;
        participants.truncate(crate::constants::challenge::MAX_PARTICIPANT_COUNT);
        Self { participants }
    }

    /// Returns the connected participants
    pub fn participants(&self) -> &[Presence] {
        &self.participants
    }

    /// Returns the number of connected participants
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Checks whether no participant is connected
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Checks whether a participant with the given name is connected
    pub fn contains(&self, name: &str) -> bool {
        self.participants.iter().any(|p| p.name == name)
    }
}

/// A structured message broadcast to all attached subscribers of a lobby
///
/// Status transitions are the only broadcast traffic of the challenge
/// subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::From)]
pub enum BroadcastEvent {
    /// The lobby moved to a new lifecycle status
    StatusChange(Status),
}

impl BroadcastEvent {
    /// Converts the event to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }

    /// Parses an event from its JSON wire form
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if the payload is not a valid event.
    pub fn from_message(message: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(message)
    }
}

/// Errors that can occur when talking to the channel collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The channel service could not be reached for the given lobby
    #[error("channel for lobby {0} is unreachable")]
    Unreachable(LobbyId),
}

/// A live attachment to one lobby's channel
///
/// Outgoing operations are fire-and-forget: there is no acknowledgment and
/// no retry. The handle must be released on every exit path, including
/// errors and navigation away from the lobby view; [`crate::lobby::Lobby`]
/// owns its handle and releases it in `leave`.
pub trait Channel {
    /// Announces or updates the caller's own presence metadata
    ///
    /// This is an idempotent upsert; it becomes effective once the channel
    /// reports the caller as subscribed.
    fn announce_presence(&self, presence: &Presence);

    /// Broadcasts an event to all currently attached subscribers
    ///
    /// Delivery is at-most-once to clients attached at send time; late
    /// joiners never receive it.
    fn broadcast(&self, event: &BroadcastEvent);

    /// Releases the attachment
    fn detach(self);
}

/// Factory for channel attachments
pub trait Connector {
    /// The attachment type produced by this connector
    type Handle: Channel;

    /// Establishes a connection to the channel scoped to one lobby
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unreachable`] if the channel service cannot be
    /// reached. No automatic reconnection is attempted; the caller
    /// surfaces the failure with a manual retry affordance.
    fn attach(&self, lobby_id: LobbyId) -> Result<Self::Handle, Error>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording channel doubles shared by the crate's test modules.

    use std::{cell::RefCell, rc::Rc};

    use super::{BroadcastEvent, Channel, Connector, Error, Presence};
    use crate::lobby::LobbyId;

    /// Shared log of everything a [`RecordingChannel`] saw.
    #[derive(Debug, Default)]
    pub(crate) struct ChannelLog {
        pub(crate) presences: Vec<Presence>,
        pub(crate) broadcasts: Vec<BroadcastEvent>,
        pub(crate) detached: bool,
    }

    /// A channel that records outgoing traffic instead of delivering it.
    #[derive(Debug, Clone)]
    pub(crate) struct RecordingChannel {
        pub(crate) log: Rc<RefCell<ChannelLog>>,
    }

    impl Channel for RecordingChannel {
        fn announce_presence(&self, presence: &Presence) {
            self.log.borrow_mut().presences.push(presence.clone());
        }

        fn broadcast(&self, event: &BroadcastEvent) {
            self.log.borrow_mut().broadcasts.push(*event);
        }

        fn detach(self) {
            self.log.borrow_mut().detached = true;
        }
    }

    /// A connector handing out [`RecordingChannel`]s over a shared log.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingConnector {
        pub(crate) log: Rc<RefCell<ChannelLog>>,
        pub(crate) unreachable: bool,
    }

    impl Connector for RecordingConnector {
        type Handle = RecordingChannel;

        fn attach(&self, lobby_id: LobbyId) -> Result<Self::Handle, Error> {
            if self.unreachable {
                return Err(Error::Unreachable(lobby_id));
            }
            Ok(RecordingChannel {
                log: Rc::clone(&self.log),
            })
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn presence(name: &str) -> Presence {
        Presence {
            name: name.to_owned(),
            avatar_url: format!("https://avatars.test/{name}.png"),
        }
    }

    #[test]
    fn test_broadcast_event_wire_round_trip() {
        let event = BroadcastEvent::StatusChange(Status::Running);
        let message = event.to_message();

        assert!(message.contains("running"));
        assert_eq!(BroadcastEvent::from_message(&message).unwrap(), event);
    }

    #[test]
    fn test_broadcast_event_rejects_garbage() {
        assert!(BroadcastEvent::from_message("not json").is_err());
        assert!(BroadcastEvent::from_message("{\"Unknown\":1}").is_err());
    }

    #[test]
    fn test_roster_snapshot_replaces_not_merges() {
        let first = RosterSnapshot::new(vec![presence("aya"), presence("karim")]);
        let second = RosterSnapshot::new(vec![presence("aya")]);

        assert_eq!(first.len(), 2);
        assert!(first.contains("karim"));
        assert_eq!(second.len(), 1);
        assert!(!second.contains("karim"));
    }

    #[test]
    fn test_roster_snapshot_truncates_to_limit() {
        let crowd = (0..crate::constants::challenge::MAX_PARTICIPANT_COUNT + 10)
            .map(|i| presence(&format!("user-{i}")))
            .collect();
        let snapshot = RosterSnapshot::new(crowd);

        assert_eq!(
            snapshot.len(),
            crate::constants::challenge::MAX_PARTICIPANT_COUNT
        );
    }

    #[test]
    fn test_empty_roster() {
        let snapshot = RosterSnapshot::default();
        assert!(snapshot.is_empty());
        assert!(!snapshot.contains("aya"));
    }
}
