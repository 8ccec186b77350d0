//! State-Value Critic
//!
//! Estimates per-team win probability from an aggregate game-state
//! snapshot. The default estimator is a fixed heuristic sitting behind the
//! [`ValueEstimator`] trait so a learned critic can be swapped in without
//! touching any caller.

use serde::{Deserialize, Serialize};

use deduction_events::{GameStateSnapshot, Role};

use crate::belief::clamp_unit;

/// Weights of the heuristic value formula.
pub mod value_weights {
    /// Baseline crew value before any factor applies.
    pub const BASELINE: f32 = 0.1;
    /// Maximum contribution of real-task progress.
    pub const TASK_WEIGHT: f32 = 0.5;
    /// Maximum contribution of the numbers advantage.
    pub const NUMBERS_WEIGHT: f32 = 0.4;
    /// Flat penalty while a sabotage is active.
    pub const SABOTAGE_PENALTY: f32 = 0.1;
}

/// Zero-sum pair of team win probabilities.
///
/// The impostor side is always derived, so `crew + impostor == 1.0`
/// holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamValue {
    crew: f32,
    impostor: f32,
}

impl TeamValue {
    /// Builds the pair from the crew-side value, clamped to [0, 1].
    pub fn from_crew(crew: f32) -> Self {
        let crew = clamp_unit(crew);
        Self {
            crew,
            impostor: 1.0 - crew,
        }
    }

    /// Crew win probability.
    pub fn crew(&self) -> f32 {
        self.crew
    }

    /// Impostor win probability.
    pub fn impostor(&self) -> f32 {
        self.impostor
    }

    /// The value from one team's perspective.
    pub fn for_role(&self, role: Role) -> f32 {
        match role {
            Role::Crewmate => self.crew,
            Role::Impostor => self.impostor,
        }
    }
}

/// State-value estimation interface.
pub trait ValueEstimator {
    /// Estimates both teams' win probability for the snapshot.
    fn value(&self, snapshot: &GameStateSnapshot) -> TeamValue;
}

/// The fixed heuristic estimator.
///
/// Terminal overrides take precedence; otherwise the crew value is
/// baseline + task progress + numbers advantage - sabotage penalty.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicCritic;

impl HeuristicCritic {
    /// Creates the heuristic estimator.
    pub fn new() -> Self {
        Self
    }
}

impl ValueEstimator for HeuristicCritic {
    fn value(&self, snapshot: &GameStateSnapshot) -> TeamValue {
        let crew = snapshot.living_crew;
        let imps = snapshot.living_impostors;

        // Terminal overrides.
        if imps == 0 {
            return TeamValue::from_crew(1.0);
        }
        if crew <= imps {
            return TeamValue::from_crew(0.0);
        }
        if snapshot.task_completion_pct >= 100.0 {
            return TeamValue::from_crew(1.0);
        }

        let task_factor = (snapshot.task_completion_pct / 100.0) * value_weights::TASK_WEIGHT;
        let total = (crew + imps).max(1) as f32;
        let numbers_factor = ((crew as f32 - imps as f32) / total) * value_weights::NUMBERS_WEIGHT;
        let sabotage_penalty = if snapshot.sabotage_active {
            value_weights::SABOTAGE_PENALTY
        } else {
            0.0
        };

        TeamValue::from_crew(
            value_weights::BASELINE + task_factor + numbers_factor - sabotage_penalty,
        )
    }
}
