//! Generator Context
//!
//! The composed overlay object handed to the external action-generation
//! layer before each turn: belief matrix, kill-risk ranking, meeting role,
//! danger score, and a ground-truth alibi. Dead agents get a reduced
//! context with none of the overlays and no room-adjacency restriction.

use serde::{Deserialize, Serialize};

use deduction_events::{GameStateSnapshot, PlayerId, Role};

use crate::belief::BeliefMatrix;
use crate::ledger::{AlibiClaim, GroundTruthLedger};
use crate::risk::TargetRisk;
use crate::roles::RoleAssignment;

/// Danger score weights for crewmate self-preservation.
pub mod danger_weights {
    pub const ALONE_IN_ROOM: u32 = 30;
    pub const SUSPECT_NEARBY: u32 = 25;
    pub const SABOTAGE_ACTIVE: u32 = 20;
    pub const BODY_IN_ROOM: u32 = 25;
    pub const FEW_ALIVE: u32 = 15;
    /// Living-player count at or below which the bonus applies.
    pub const FEW_ALIVE_THRESHOLD: u32 = 3;
    /// Belief score at which a co-present player counts as a suspect.
    pub const SUSPECT_THRESHOLD: f32 = 0.8;
    pub const MAX: u32 = 100;
}

/// Role-specific overlay context for one agent turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContext {
    pub agent: PlayerId,
    pub role: Role,
    pub alive: bool,
    /// Critic value from this agent's team perspective.
    pub team_value: f32,
    /// Belief overlay; absent for dead agents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub belief: Option<BeliefMatrix>,
    /// Kill-risk ranking; living impostors with candidates only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kill_risk: Option<Vec<TargetRisk>>,
    /// Meeting role and speaking style; meetings only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting: Option<RoleAssignment>,
    /// Self-preservation score 0-100; living crewmates only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger_score: Option<u32>,
    /// Recent verified presence entries for grounded testimony.
    #[serde(default)]
    pub alibi: Vec<AlibiClaim>,
    /// Dead agents move without adjacency constraints.
    pub movement_unrestricted: bool,
}

impl AgentContext {
    /// Builds the reduced context handed to a dead agent.
    pub fn for_dead(agent: PlayerId, role: Role, team_value: f32) -> Self {
        Self {
            agent,
            role,
            alive: false,
            team_value,
            belief: None,
            kill_risk: None,
            meeting: None,
            danger_score: None,
            alibi: Vec::new(),
            movement_unrestricted: true,
        }
    }
}

/// Computes the crewmate self-preservation danger score.
///
/// Zero for impostors and the dead; otherwise a clamped sum of situational
/// hazards. High scores mean stop tasking and seek safety.
pub fn danger_score(
    role: Role,
    alive: bool,
    snapshot: &GameStateSnapshot,
    ledger: &GroundTruthLedger,
    belief: &BeliefMatrix,
    body_in_room: bool,
) -> u32 {
    if role.is_impostor() || !alive {
        return 0;
    }

    let mut score = 0;

    let others_present = ledger
        .last_presence()
        .map(|p| p.witnesses.as_slice())
        .unwrap_or(&[]);
    if others_present.is_empty() {
        score += danger_weights::ALONE_IN_ROOM;
    } else {
        let suspect_nearby = others_present.iter().any(|&other| {
            belief
                .get(other)
                .is_some_and(|v| v >= danger_weights::SUSPECT_THRESHOLD)
        });
        if suspect_nearby {
            score += danger_weights::SUSPECT_NEARBY;
        }
    }

    if snapshot.sabotage_active {
        score += danger_weights::SABOTAGE_ACTIVE;
    }
    if body_in_room {
        score += danger_weights::BODY_IN_ROOM;
    }
    if snapshot.living_total() <= danger_weights::FEW_ALIVE_THRESHOLD {
        score += danger_weights::FEW_ALIVE;
    }

    score.min(danger_weights::MAX)
}
