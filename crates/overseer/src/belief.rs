//! Belief Model
//!
//! Deterministic theory-of-mind state per agent. Crewmates track first-order
//! suspicion (who is the impostor?); impostors track second-order threat
//! (who suspects me?). Updates are hard-coded multiplicative rules with
//! mandatory clamping at every write.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use deduction_events::{EventKind, GameEvent, PlayerId, Role, Roster};

use crate::ledger::GroundTruthLedger;

/// Fixed belief update rules.
pub mod update_rules {
    /// Neutral prior assigned to every player at game start.
    pub const INITIAL: f32 = 0.5;
    /// Witnessed kill or vent overrides the prior entirely.
    pub const HARD_EVIDENCE: f32 = 1.0;
    /// Witnessed sabotage multiplier.
    pub const SABOTAGE_FACTOR: f32 = 1.25;
    /// Witnessed fake task multiplier.
    pub const FAKE_TASK_FACTOR: f32 = 1.10;
    /// Witnessed visual or completed task multiplier.
    pub const TASK_CLEAR_FACTOR: f32 = 0.90;
}

/// Clamps a probability-like score to [0.0, 1.0].
pub fn clamp_unit(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Bounded per-player scores owned by one agent.
///
/// Semantics depend on the owner's role: suspicion for crewmates,
/// perceived threat for impostors. Every entry stays within [0.0, 1.0].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeliefMatrix {
    entries: BTreeMap<PlayerId, f32>,
}

impl BeliefMatrix {
    /// Initializes a uniform matrix over every other roster member.
    pub fn uniform(owner: PlayerId, roster: &Roster) -> Self {
        let entries = roster
            .ids()
            .filter(|&id| id != owner)
            .map(|id| (id, update_rules::INITIAL))
            .collect();
        Self { entries }
    }

    /// The current score for a player, if tracked.
    pub fn get(&self, id: PlayerId) -> Option<f32> {
        self.entries.get(&id).copied()
    }

    /// Whether the matrix tracks the given player.
    pub fn tracks(&self, id: PlayerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Iterates entries in ascending player-id order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, f32)> + '_ {
        self.entries.iter().map(|(&id, &v)| (id, v))
    }

    /// The highest-scoring entry; ties break toward the lowest id.
    pub fn highest(&self) -> Option<(PlayerId, f32)> {
        self.entries
            .iter()
            .fold(None, |best: Option<(PlayerId, f32)>, (&id, &v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((id, v)),
            })
    }

    fn set(&mut self, id: PlayerId, value: f32) {
        if let Some(entry) = self.entries.get_mut(&id) {
            *entry = clamp_unit(value);
        }
    }
}

/// Rejected belief input.
#[derive(Debug)]
pub enum BeliefError {
    /// Event references a player outside the roster.
    UnknownPlayer(PlayerId),
}

impl fmt::Display for BeliefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeliefError::UnknownPlayer(id) => write!(f, "unknown player {}", id),
        }
    }
}

impl std::error::Error for BeliefError {}

/// One applied belief change, for audit trails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeliefUpdate {
    pub subject: PlayerId,
    pub previous: f32,
    pub current: f32,
}

/// Theory-of-mind state for a single agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeliefModel {
    owner: PlayerId,
    role: Role,
    matrix: BeliefMatrix,
}

impl BeliefModel {
    /// Creates a model with a uniform 0.5 prior over every other player.
    pub fn new(owner: PlayerId, role: Role, roster: &Roster) -> Self {
        Self {
            owner,
            role,
            matrix: BeliefMatrix::uniform(owner, roster),
        }
    }

    /// The agent this model belongs to.
    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Read access to the current matrix.
    pub fn matrix(&self) -> &BeliefMatrix {
        &self.matrix
    }

    /// Applies one observed event and returns the changes made.
    ///
    /// Crewmates update their suspicion of the actor for any event they
    /// witnessed (co-presence in the acting room at the event timestep).
    /// Impostors update their threat entry for each player that witnessed
    /// one of the impostor's own incriminating actions. Events the owner
    /// did not witness are a no-op.
    pub fn observe(
        &mut self,
        event: &GameEvent,
        ledger: &GroundTruthLedger,
    ) -> Result<Vec<BeliefUpdate>, BeliefError> {
        if event.actor != self.owner && !self.matrix.tracks(event.actor) {
            return Err(BeliefError::UnknownPlayer(event.actor));
        }

        match self.role {
            Role::Crewmate => self.observe_as_crewmate(event, ledger),
            Role::Impostor => Ok(self.observe_as_impostor(event)),
        }
    }

    fn observe_as_crewmate(
        &mut self,
        event: &GameEvent,
        ledger: &GroundTruthLedger,
    ) -> Result<Vec<BeliefUpdate>, BeliefError> {
        if event.actor == self.owner {
            return Ok(Vec::new());
        }
        // Witnessing requires co-presence in the acting room at that timestep.
        let co_present = ledger.room_at(event.timestep) == Some(event.room.as_str());
        if !co_present {
            return Ok(Vec::new());
        }

        let Some(previous) = self.matrix.get(event.actor) else {
            return Err(BeliefError::UnknownPlayer(event.actor));
        };

        let next = match event.kind {
            EventKind::Kill | EventKind::Vent => update_rules::HARD_EVIDENCE,
            EventKind::Sabotage => previous * update_rules::SABOTAGE_FACTOR,
            EventKind::FakeTask => previous * update_rules::FAKE_TASK_FACTOR,
            EventKind::VisualTask | EventKind::CompleteTask => {
                previous * update_rules::TASK_CLEAR_FACTOR
            }
            _ => return Ok(Vec::new()),
        };

        self.matrix.set(event.actor, next);
        Ok(vec![BeliefUpdate {
            subject: event.actor,
            previous,
            current: clamp_unit(next),
        }])
    }

    fn observe_as_impostor(&mut self, event: &GameEvent) -> Vec<BeliefUpdate> {
        // Only the impostor's own incriminating actions move the threat
        // matrix, and only for the players who saw them.
        if event.actor != self.owner || !event.kind.is_incriminating() {
            return Vec::new();
        }

        let mut updates = Vec::new();
        for &witness in &event.witnesses {
            let Some(previous) = self.matrix.get(witness) else {
                continue;
            };
            let next = match event.kind {
                EventKind::Kill | EventKind::Vent => update_rules::HARD_EVIDENCE,
                EventKind::Sabotage => previous * update_rules::SABOTAGE_FACTOR,
                EventKind::FakeTask => previous * update_rules::FAKE_TASK_FACTOR,
                _ => continue,
            };
            self.matrix.set(witness, next);
            updates.push(BeliefUpdate {
                subject: witness,
                previous,
                current: clamp_unit(next),
            });
        }
        updates
    }
}
