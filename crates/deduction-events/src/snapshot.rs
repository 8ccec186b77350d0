//! Snapshot Types
//!
//! Immutable per-timestep views of the game supplied by the external
//! engine. The overseer never mutates these; it only reads them when
//! estimating state value, resolving rewards, and assigning meeting roles.

use serde::{Deserialize, Serialize};

use crate::player::{PlayerId, Role};

/// Stage of a staged meeting discussion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStage {
    /// Facts only; no accusations yet.
    Testimony,
    /// Testimonies are compared; accusations and defenses open.
    Accusation,
    /// Closing statements; no new accusations.
    FinalArguments,
}

impl MeetingStage {
    /// Whether new accusations may be raised in this stage.
    pub fn allows_new_accusations(self) -> bool {
        matches!(self, MeetingStage::Accusation)
    }

    /// The stage that follows this one, if any.
    pub fn next(self) -> Option<MeetingStage> {
        match self {
            MeetingStage::Testimony => Some(MeetingStage::Accusation),
            MeetingStage::Accusation => Some(MeetingStage::FinalArguments),
            MeetingStage::FinalArguments => None,
        }
    }

    /// Display name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            MeetingStage::Testimony => "testimony",
            MeetingStage::Accusation => "accusation",
            MeetingStage::FinalArguments => "final_arguments",
        }
    }
}

/// State of an active meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingSnapshot {
    /// Discussion round number, starting at 0.
    pub round: u32,
    /// Current stage of the discussion.
    pub stage: MeetingStage,
    /// Players currently under accusation.
    #[serde(default)]
    pub accused: Vec<PlayerId>,
}

impl MeetingSnapshot {
    /// Creates a meeting snapshot with no accusations.
    pub fn new(round: u32, stage: MeetingStage) -> Self {
        Self {
            round,
            stage,
            accused: Vec::new(),
        }
    }

    /// Records an accusation against a player.
    pub fn accuse(&mut self, player: PlayerId) {
        if !self.accused.contains(&player) {
            self.accused.push(player);
        }
    }

    /// Whether the player is currently accused.
    pub fn is_accused(&self, player: PlayerId) -> bool {
        self.accused.contains(&player)
    }
}

/// Immutable view of the aggregate game state at one timestep.
///
/// Task completion counts real tasks only; faked tasks never move the bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    pub timestep: u64,
    pub living_crew: u32,
    pub living_impostors: u32,
    #[serde(default)]
    pub dead_crew: u32,
    #[serde(default)]
    pub dead_impostors: u32,
    /// Real-task completion percentage in [0, 100].
    #[serde(default)]
    pub task_completion_pct: f32,
    #[serde(default)]
    pub sabotage_active: bool,
    /// Set by the engine on the turn the game ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Role>,
    /// Present while a meeting is in progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting: Option<MeetingSnapshot>,
}

impl GameStateSnapshot {
    /// Creates a snapshot with default task/sabotage/meeting state.
    pub fn new(timestep: u64, living_crew: u32, living_impostors: u32) -> Self {
        Self {
            timestep,
            living_crew,
            living_impostors,
            dead_crew: 0,
            dead_impostors: 0,
            task_completion_pct: 0.0,
            sabotage_active: false,
            winner: None,
            meeting: None,
        }
    }

    /// Sets the real-task completion percentage.
    pub fn with_tasks(mut self, pct: f32) -> Self {
        self.task_completion_pct = pct;
        self
    }

    /// Sets the active-sabotage flag.
    pub fn with_sabotage(mut self, active: bool) -> Self {
        self.sabotage_active = active;
        self
    }

    /// Marks the game as won by the given team this turn.
    pub fn with_winner(mut self, winner: Role) -> Self {
        self.winner = Some(winner);
        self
    }

    /// Attaches meeting state.
    pub fn with_meeting(mut self, meeting: MeetingSnapshot) -> Self {
        self.meeting = Some(meeting);
        self
    }

    /// Total living players.
    pub fn living_total(&self) -> u32 {
        self.living_crew + self.living_impostors
    }

    /// Whether the game ended this turn.
    pub fn is_terminal(&self) -> bool {
        self.winner.is_some()
    }

    /// Whether a meeting is in progress.
    pub fn in_meeting(&self) -> bool {
        self.meeting.is_some()
    }

    /// Serializes the snapshot to compact JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
