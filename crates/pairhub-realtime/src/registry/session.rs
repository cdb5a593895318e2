//! Session registry — active pairwise sessions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use pairhub_core::types::{RoleTag, SessionId, SocketId, UserId};

use super::peer::PeerRegistry;

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created, not yet joined by both sides.
    Pending,
    /// Both participants joined.
    Active,
    /// Temporarily suspended.
    Paused,
    /// Torn down.
    Ended,
}

/// One side of a session.
#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    /// User id.
    pub user_id: UserId,
    /// Socket carrying this participant at join time.
    pub socket_id: SocketId,
    /// Role within the session; the host is always the original
    /// requester.
    pub role: RoleTag,
    /// When the participant joined.
    pub joined_at: DateTime<Utc>,
    /// Last message activity.
    pub last_activity_at: DateTime<Utc>,
}

/// A pairwise routing channel between two peers.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// Unique session id.
    pub session_id: SessionId,
    /// The original requester.
    pub host_user_id: UserId,
    /// Participant info by user id. Exactly two entries while active.
    pub participants: HashMap<UserId, Participant>,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last activity across all participants.
    pub last_activity_at: DateTime<Utc>,
}

/// Registry of active sessions. Peer session lists are maintained in the
/// same operation as the session record itself, under the shared lock.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an active session for an accepted request. The first user
    /// is the host (the original requester). Writes the session id into
    /// both peers' session lists.
    pub fn create_for_pair(
        &mut self,
        peers: &mut PeerRegistry,
        host: &UserId,
        host_socket: &SocketId,
        guest: &UserId,
        guest_socket: &SocketId,
    ) -> SessionId {
        let session_id = SessionId::generate();
        let now = Utc::now();

        let mut participants = HashMap::new();
        participants.insert(
            host.clone(),
            Participant {
                user_id: host.clone(),
                socket_id: host_socket.clone(),
                role: RoleTag::Host,
                joined_at: now,
                last_activity_at: now,
            },
        );
        participants.insert(
            guest.clone(),
            Participant {
                user_id: guest.clone(),
                socket_id: guest_socket.clone(),
                role: RoleTag::Guest,
                joined_at: now,
                last_activity_at: now,
            },
        );

        self.sessions.insert(
            session_id.clone(),
            Session {
                session_id: session_id.clone(),
                host_user_id: host.clone(),
                participants,
                status: SessionStatus::Active,
                created_at: now,
                last_activity_at: now,
            },
        );

        peers.add_session(host, &session_id);
        peers.add_session(guest, &session_id);

        debug!(session_id = %session_id, host = %host, guest = %guest, "session created");
        session_id
    }

    /// Looks up a session.
    pub fn get(&self, session_id: &SessionId) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    /// Whether a user participates in a session.
    pub fn is_participant(&self, session_id: &SessionId, user_id: &UserId) -> bool {
        self.sessions
            .get(session_id)
            .map(|s| s.participants.contains_key(user_id))
            .unwrap_or(false)
    }

    /// Participants of a session.
    pub fn participants(&self, session_id: &SessionId) -> Vec<&Participant> {
        self.sessions
            .get(session_id)
            .map(|s| s.participants.values().collect())
            .unwrap_or_default()
    }

    /// Stamps session and participant activity.
    pub fn update_activity(&mut self, session_id: &SessionId, user_id: &UserId) {
        if let Some(session) = self.sessions.get_mut(session_id) {
            let now = Utc::now();
            session.last_activity_at = now;
            if let Some(participant) = session.participants.get_mut(user_id) {
                participant.last_activity_at = now;
            }
        }
    }

    /// Removes a participant. The session ends when the departing user
    /// is the host or fewer than two participants remain — with pairwise
    /// sessions, any departure.
    pub fn remove_participant(
        &mut self,
        peers: &mut PeerRegistry,
        session_id: &SessionId,
        user_id: &UserId,
    ) {
        let end = match self.sessions.get_mut(session_id) {
            Some(session) => {
                if session.participants.remove(user_id).is_some() {
                    peers.remove_session(user_id, session_id);
                }
                session.host_user_id == *user_id || session.participants.len() < 2
            }
            None => return,
        };

        if end {
            self.end(peers, session_id);
        }
    }

    /// Ends a session: clears it from every remaining peer's session
    /// list and deletes the record.
    pub fn end(&mut self, peers: &mut PeerRegistry, session_id: &SessionId) -> Option<Session> {
        let mut session = self.sessions.remove(session_id)?;
        session.status = SessionStatus::Ended;
        for user_id in session.participants.keys() {
            peers.remove_session(user_id, session_id);
        }
        debug!(session_id = %session_id, "session ended");
        Some(session)
    }

    /// Removes a departing user from every session they are in.
    pub fn handle_user_disconnect(&mut self, peers: &mut PeerRegistry, user_id: &UserId) {
        let involved: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|s| s.participants.contains_key(user_id))
            .map(|s| s.session_id.clone())
            .collect();

        for session_id in involved {
            self.remove_participant(peers, &session_id, user_id);
        }
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
