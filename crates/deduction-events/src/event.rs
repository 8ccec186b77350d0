//! Event Types
//!
//! The authoritative game log record types: per-action events, per-timestep
//! presence sightings, and the meeting chat transcript. Ledgers and belief
//! models downstream are rebuilt exclusively from these records.

use serde::{Deserialize, Serialize};

use crate::player::PlayerId;

/// Canonical room identifiers for the standard ship map.
pub mod rooms {
    pub const CAFETERIA: &str = "cafeteria";
    pub const WEAPONS: &str = "weapons";
    pub const NAVIGATION: &str = "navigation";
    pub const O2: &str = "o2";
    pub const SHIELDS: &str = "shields";
    pub const COMMUNICATIONS: &str = "communications";
    pub const STORAGE: &str = "storage";
    pub const ADMIN: &str = "admin";
    pub const ELECTRICAL: &str = "electrical";
    pub const LOWER_ENGINE: &str = "lower engine";
    pub const SECURITY: &str = "security";
    pub const REACTOR: &str = "reactor";
    pub const UPPER_ENGINE: &str = "upper engine";
    pub const MEDBAY: &str = "medbay";

    /// The default room catalogue, in map order.
    pub const STANDARD: &[&str] = &[
        CAFETERIA,
        WEAPONS,
        NAVIGATION,
        O2,
        SHIELDS,
        COMMUNICATIONS,
        STORAGE,
        ADMIN,
        ELECTRICAL,
        LOWER_ENGINE,
        SECURITY,
        REACTOR,
        UPPER_ENGINE,
        MEDBAY,
    ];
}

/// Generates an event id with the given sequence number.
pub fn generate_event_id(sequence: u64) -> String {
    format!("evt_{:06}", sequence)
}

/// Kind of a logged game action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Move,
    Kill,
    Vent,
    Sabotage,
    FixSabotage,
    FakeTask,
    VisualTask,
    CompleteTask,
    ReportBody,
    CallMeeting,
    Die,
}

impl EventKind {
    /// Hard-evidence crimes: witnessing one identifies the impostor outright.
    pub fn is_crime(self) -> bool {
        matches!(self, EventKind::Kill | EventKind::Vent)
    }

    /// Actions that incriminate the actor when witnessed.
    pub fn is_incriminating(self) -> bool {
        matches!(
            self,
            EventKind::Kill | EventKind::Vent | EventKind::Sabotage | EventKind::FakeTask
        )
    }

    /// Lowercase label used in log output.
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Move => "move",
            EventKind::Kill => "kill",
            EventKind::Vent => "vent",
            EventKind::Sabotage => "sabotage",
            EventKind::FixSabotage => "fix_sabotage",
            EventKind::FakeTask => "fake_task",
            EventKind::VisualTask => "visual_task",
            EventKind::CompleteTask => "complete_task",
            EventKind::ReportBody => "report_body",
            EventKind::CallMeeting => "call_meeting",
            EventKind::Die => "die",
        }
    }
}

/// One entry of the authoritative game log.
///
/// Witnesses are computed by the engine as the other living players
/// co-present in `room` at `timestep`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEvent {
    pub event_id: String,
    pub timestep: u64,
    pub kind: EventKind,
    pub actor: PlayerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PlayerId>,
    pub room: String,
    #[serde(default)]
    pub witnesses: Vec<PlayerId>,
}

impl GameEvent {
    /// Creates an event with no target and no witnesses.
    pub fn new(
        event_id: impl Into<String>,
        timestep: u64,
        kind: EventKind,
        actor: PlayerId,
        room: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            timestep,
            kind,
            actor,
            target: None,
            room: room.into(),
            witnesses: Vec::new(),
        }
    }

    /// Sets the target player (kill victims, vote targets).
    pub fn with_target(mut self, target: PlayerId) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the witness list.
    pub fn with_witnesses(mut self, witnesses: Vec<PlayerId>) -> Self {
        self.witnesses = witnesses;
        self
    }

    /// Whether the given player saw this event happen.
    pub fn witnessed_by(&self, player: PlayerId) -> bool {
        self.witnesses.contains(&player)
    }
}

/// Per-timestep sighting record for one player.
///
/// The engine emits one of these per living player per timestep; ledgers
/// derive `rooms_visited` and co-occupancy from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub timestep: u64,
    pub player: PlayerId,
    pub room: String,
    #[serde(default)]
    pub others_seen: Vec<PlayerId>,
}

impl PresenceRecord {
    /// Creates a presence record.
    pub fn new(timestep: u64, player: PlayerId, room: impl Into<String>) -> Self {
        Self {
            timestep,
            player,
            room: room.into(),
            others_seen: Vec::new(),
        }
    }

    /// Sets the players sighted in the same room.
    pub fn with_others(mut self, others: Vec<PlayerId>) -> Self {
        self.others_seen = others;
        self
    }
}

/// One committed statement from a meeting discussion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub timestep: u64,
    pub round: u32,
    pub speaker: PlayerId,
    pub text: String,
}

impl ChatMessage {
    /// Creates a chat message.
    pub fn new(timestep: u64, round: u32, speaker: PlayerId, text: impl Into<String>) -> Self {
        Self {
            timestep,
            round,
            speaker,
            text: text.into(),
        }
    }
}

/// Ordered transcript of committed meeting statements.
///
/// Statements are appended only after they have passed validation; drafts
/// never enter the history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a committed statement.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// All committed messages in order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of committed statements.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All statements by one speaker, oldest first.
    pub fn statements_by(&self, speaker: PlayerId) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|m| m.speaker == speaker)
            .map(|m| m.text.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_event_id() {
        assert_eq!(generate_event_id(1), "evt_000001");
        assert_eq!(generate_event_id(42371), "evt_042371");
    }

    #[test]
    fn test_event_kind_classification() {
        assert!(EventKind::Kill.is_crime());
        assert!(EventKind::Vent.is_crime());
        assert!(!EventKind::Sabotage.is_crime());

        assert!(EventKind::Sabotage.is_incriminating());
        assert!(EventKind::FakeTask.is_incriminating());
        assert!(!EventKind::CompleteTask.is_incriminating());
        assert!(!EventKind::Move.is_incriminating());
    }

    #[test]
    fn test_game_event_builder() {
        let event = GameEvent::new("evt_000001", 5, EventKind::Kill, PlayerId(0), rooms::REACTOR)
            .with_target(PlayerId(2))
            .with_witnesses(vec![PlayerId(1)]);

        assert_eq!(event.timestep, 5);
        assert_eq!(event.target, Some(PlayerId(2)));
        assert!(event.witnessed_by(PlayerId(1)));
        assert!(!event.witnessed_by(PlayerId(3)));
    }

    #[test]
    fn test_event_serialization_roundtrip() {
        let event = GameEvent::new("evt_000007", 3, EventKind::Vent, PlayerId(0), rooms::ADMIN)
            .with_witnesses(vec![PlayerId(4)]);

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"vent\""));

        let parsed: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.kind, EventKind::Vent);
        assert_eq!(parsed.witnesses, vec![PlayerId(4)]);
    }

    #[test]
    fn test_chat_history_statements_by() {
        let mut history = ChatHistory::new();
        history.push(ChatMessage::new(10, 0, PlayerId(1), "I was in admin."));
        history.push(ChatMessage::new(10, 0, PlayerId(2), "I was in storage."));
        history.push(ChatMessage::new(10, 1, PlayerId(1), "Still think it's Red."));

        let own = history.statements_by(PlayerId(1));
        assert_eq!(own, vec!["I was in admin.", "Still think it's Red."]);
        assert!(history.statements_by(PlayerId(4)).is_empty());
    }

    #[test]
    fn test_standard_rooms() {
        assert_eq!(rooms::STANDARD.len(), 14);
        assert!(rooms::STANDARD.contains(&rooms::ELECTRICAL));
    }
}
