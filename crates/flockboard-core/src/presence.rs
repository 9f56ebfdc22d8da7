//! Who else is on the board, and where their pointers are.

use crate::elements::SerializableColor;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Peer identifier as the relay reports it (the username).
pub type PeerId = String;

/// Color used for a peer cursor when the relay does not send one.
pub const DEFAULT_CURSOR_COLOR: SerializableColor = SerializableColor {
    r: 0x00,
    g: 0x7b,
    b: 0xff,
    a: 0xff,
};

/// A peer's live pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteCursor {
    /// Canvas coordinates.
    pub position: Point,
    pub color: SerializableColor,
}

/// Remote cursors keyed by peer.
#[derive(Debug, Clone, Default)]
pub struct RemoteCursors {
    cursors: BTreeMap<PeerId, RemoteCursor>,
}

impl RemoteCursors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or move a peer's cursor. An unparseable or missing color
    /// falls back to [`DEFAULT_CURSOR_COLOR`].
    pub fn upsert(&mut self, peer: &str, position: Point, color: Option<&str>) {
        let color = color
            .and_then(SerializableColor::from_hex)
            .unwrap_or(DEFAULT_CURSOR_COLOR);
        match self.cursors.get_mut(peer) {
            Some(cursor) => {
                cursor.position = position;
                cursor.color = color;
            }
            None => {
                self.cursors.insert(peer.to_string(), RemoteCursor { position, color });
            }
        }
    }

    pub fn remove(&mut self, peer: &str) -> Option<RemoteCursor> {
        self.cursors.remove(peer)
    }

    pub fn get(&self, peer: &str) -> Option<&RemoteCursor> {
        self.cursors.get(peer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RemoteCursor)> {
        self.cursors.iter().map(|(peer, cursor)| (peer.as_str(), cursor))
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn clear(&mut self) {
        self.cursors.clear();
    }
}

/// Presence metadata for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user: PeerId,
    #[serde(default)]
    pub online: bool,
}

impl Participant {
    pub fn online(user: impl Into<PeerId>) -> Self {
        Self {
            user: user.into(),
            online: true,
        }
    }
}

/// Where the full participant list comes from (the room's participant
/// endpoint in a deployed client).
pub trait ParticipantSource {
    fn participants(&mut self, room: &str) -> Vec<Participant>;
}

/// Participants currently in the room.
#[derive(Debug, Clone, Default)]
pub struct ParticipantSet {
    participants: BTreeMap<PeerId, Participant>,
}

impl ParticipantSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, user: &str) {
        self.participants
            .insert(user.to_string(), Participant::online(user));
    }

    pub fn leave(&mut self, user: &str) -> Option<Participant> {
        self.participants.remove(user)
    }

    /// Swap in a freshly fetched list.
    pub fn replace(&mut self, participants: Vec<Participant>) {
        self.participants = participants
            .into_iter()
            .map(|p| (p.user.clone(), p))
            .collect();
    }

    /// Refresh from a source, if there is one.
    pub fn refresh<P: ParticipantSource + ?Sized>(&mut self, source: Option<&mut P>, room: &str) {
        if let Some(source) = source {
            self.replace(source.participants(room));
            log::debug!("participants refreshed: {} in {}", self.len(), room);
        }
    }

    pub fn contains(&self, user: &str) -> bool {
        self.participants.contains_key(user)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<Participant>);

    impl ParticipantSource for Fixed {
        fn participants(&mut self, _room: &str) -> Vec<Participant> {
            self.0.clone()
        }
    }

    #[test]
    fn test_cursor_created_lazily_and_updated_in_place() {
        let mut cursors = RemoteCursors::new();
        cursors.upsert("alice", Point::new(1.0, 2.0), None);
        assert_eq!(cursors.get("alice").map(|c| c.color), Some(DEFAULT_CURSOR_COLOR));
        cursors.upsert("alice", Point::new(5.0, 6.0), Some("#ff0000"));
        assert_eq!(cursors.len(), 1);
        let cursor = cursors.get("alice").unwrap();
        assert_eq!(cursor.position, Point::new(5.0, 6.0));
        assert_eq!(cursor.color, SerializableColor::new(255, 0, 0, 255));
    }

    #[test]
    fn test_bad_cursor_color_uses_default() {
        let mut cursors = RemoteCursors::new();
        cursors.upsert("bob", Point::ZERO, Some("chartreuse"));
        assert_eq!(cursors.get("bob").map(|c| c.color), Some(DEFAULT_CURSOR_COLOR));
        assert!(cursors.remove("bob").is_some());
        assert!(cursors.is_empty());
    }

    #[test]
    fn test_participant_join_leave() {
        let mut set = ParticipantSet::new();
        set.join("alice");
        set.join("bob");
        set.join("alice");
        assert_eq!(set.len(), 2);
        set.leave("alice");
        assert!(!set.contains("alice"));
        assert!(set.contains("bob"));
    }

    #[test]
    fn test_refresh_replaces_wholesale() {
        let mut set = ParticipantSet::new();
        set.join("stale");
        let mut source = Fixed(vec![Participant::online("carol"), Participant::online("dave")]);
        set.refresh(Some(&mut source), "room-1");
        assert_eq!(set.len(), 2);
        assert!(!set.contains("stale"));

        set.refresh(None::<&mut Fixed>, "room-1");
        assert_eq!(set.len(), 2);
    }
}
