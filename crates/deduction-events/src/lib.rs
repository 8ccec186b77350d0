//! Shared game-state and event types for the deduction overseer.
//!
//! This crate contains pure data structures with no decision logic.
//! It is a dependency for all other crates in the workspace.

pub mod event;
pub mod player;
pub mod snapshot;

// Re-export player types
pub use player::{PlayerId, PlayerInfo, Role, Roster};

// Re-export event types
pub use event::{
    generate_event_id, rooms, ChatHistory, ChatMessage, EventKind, GameEvent, PresenceRecord,
};

// Re-export snapshot types
pub use snapshot::{GameStateSnapshot, MeetingSnapshot, MeetingStage};
