//! Reward Engine
//!
//! Computes the scalar turn reward for each agent. Resolution is strictly
//! priority-ordered: terminal rewards first (and alone), then social and
//! cognitive rewards, then role-specific action rewards. Crewmate task and
//! death rewards scale up under the endgame Critical State.

use serde::{Deserialize, Serialize};
use std::fmt;

use deduction_events::{EventKind, GameStateSnapshot, PlayerId, Role};

/// The fixed reward tables.
pub mod reward_table {
    // Terminal
    pub const WIN_ALIVE: f32 = 50.0;
    pub const WIN_DEAD: f32 = 30.0;
    pub const LOSS: f32 = -20.0;

    // Social / cognitive
    pub const HALLUCINATION: f32 = -100.0;
    pub const LIE_SUCCESS: f32 = 2.0;
    pub const LIE_REFUTED: f32 = -5.0;
    pub const VOTE_HIT_IMPOSTOR: f32 = 5.0;
    pub const VOTE_HIT_CREWMATE: f32 = -2.0;
    pub const FRAME_VOTE: f32 = 3.0;
    pub const SURVIVED_VOTE: f32 = 10.0;

    // Impostor actions
    pub const KILL_BASE: f32 = 10.0;
    pub const KILL_UNSEEN_BONUS: f32 = 5.0;
    pub const KILL_WITNESS_PENALTY: f32 = 8.0;
    pub const VENT_UNSEEN: f32 = 1.0;
    pub const VENT_SEEN: f32 = -10.0;
    pub const SELF_REPORT: f32 = 3.0;
    pub const IMPOSTOR_FAKE_TASK: f32 = 2.0;
    pub const IMPOSTOR_SABOTAGE: f32 = 1.0;
    pub const IMPOSTOR_FIX_SABOTAGE: f32 = 1.0;

    // Crewmate actions
    pub const CREW_COMPLETE_TASK: f32 = 2.0;
    pub const CREW_COMPLETE_TASK_CRITICAL: f32 = 5.0;
    pub const CREW_FIX_SABOTAGE: f32 = 3.0;
    pub const CREW_REPORT_BODY: f32 = 2.0;
    pub const CREW_DIE: f32 = -15.0;
    pub const CREW_DIE_CRITICAL: f32 = -50.0;
}

/// Endgame predicate: stakes amplify once crew numbers run low.
///
/// Holds when living crew <= 3 or living crew <= living impostors + 2.
/// Monotonic over a game since crew counts never increase.
pub fn is_critical_state(snapshot: &GameStateSnapshot) -> bool {
    snapshot.living_crew <= 3 || snapshot.living_crew <= snapshot.living_impostors + 2
}

/// Contributing category of a reward component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardCategory {
    Terminal,
    Social,
    Action,
}

impl fmt::Display for RewardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewardCategory::Terminal => write!(f, "terminal"),
            RewardCategory::Social => write!(f, "social"),
            RewardCategory::Action => write!(f, "action"),
        }
    }
}

/// One labeled contribution to a turn's reward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardComponent {
    pub category: RewardCategory,
    pub label: String,
    pub value: f32,
}

impl RewardComponent {
    fn new(category: RewardCategory, label: &str, value: f32) -> Self {
        Self {
            category,
            label: label.to_string(),
            value,
        }
    }
}

/// The resolved reward for one agent turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReward {
    /// Sum over all components.
    pub total: f32,
    /// Dominant category (terminal > social > action).
    pub category: RewardCategory,
    /// Individual contributions, in resolution order.
    pub components: Vec<RewardComponent>,
}

/// The executed action and how many players saw it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub kind: EventKind,
    pub witness_count: u32,
}

impl ActionOutcome {
    /// Creates an action outcome.
    pub fn new(kind: EventKind, witness_count: u32) -> Self {
        Self {
            kind,
            witness_count,
        }
    }
}

/// A vote whose target's role has since been confirmed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub target: PlayerId,
    pub target_role: Role,
}

/// Everything that happened on one agent's turn, as reward input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Executed action, if the turn was not skipped.
    pub action: Option<ActionOutcome>,
    /// Judge verdict on the finalized statement.
    pub hallucination: bool,
    /// Impostor lie passed unchallenged.
    pub lie_success: bool,
    /// Impostor lie was refuted in discussion.
    pub lie_refuted: bool,
    /// Vote cast this turn, with the target's confirmed role.
    pub vote: Option<VoteOutcome>,
    /// Impostor survived an ejection vote this turn.
    pub survived_vote: bool,
}

impl TurnOutcome {
    /// Creates an empty outcome (skipped turn).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the executed action.
    pub fn with_action(mut self, kind: EventKind, witness_count: u32) -> Self {
        self.action = Some(ActionOutcome::new(kind, witness_count));
        self
    }

    /// Sets the vote cast this turn.
    pub fn with_vote(mut self, target: PlayerId, target_role: Role) -> Self {
        self.vote = Some(VoteOutcome {
            target,
            target_role,
        });
        self
    }

    /// Marks the statement as a detected hallucination.
    pub fn with_hallucination(mut self) -> Self {
        self.hallucination = true;
        self
    }
}

/// Priority-ordered reward calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewardEngine;

impl RewardEngine {
    /// Creates the engine.
    pub fn new() -> Self {
        Self
    }

    /// Resolves the reward for one agent turn.
    ///
    /// If the game ended this turn only the terminal reward is returned;
    /// all other categories are skipped.
    pub fn resolve(
        &self,
        role: Role,
        alive: bool,
        snapshot: &GameStateSnapshot,
        outcome: &TurnOutcome,
    ) -> TurnReward {
        // A. Terminal rewards override everything.
        if let Some(winner) = snapshot.winner {
            let value = if role == winner {
                if alive {
                    reward_table::WIN_ALIVE
                } else {
                    reward_table::WIN_DEAD
                }
            } else {
                reward_table::LOSS
            };
            let label = if role == winner { "win" } else { "loss" };
            return TurnReward {
                total: value,
                category: RewardCategory::Terminal,
                components: vec![RewardComponent::new(RewardCategory::Terminal, label, value)],
            };
        }

        let mut components = Vec::new();

        // B. Social and cognitive rewards.
        if outcome.hallucination {
            components.push(RewardComponent::new(
                RewardCategory::Social,
                "hallucination",
                reward_table::HALLUCINATION,
            ));
        }
        if role.is_impostor() {
            if outcome.lie_success {
                components.push(RewardComponent::new(
                    RewardCategory::Social,
                    "lie_success",
                    reward_table::LIE_SUCCESS,
                ));
            }
            if outcome.lie_refuted {
                components.push(RewardComponent::new(
                    RewardCategory::Social,
                    "lie_refuted",
                    reward_table::LIE_REFUTED,
                ));
            }
        }
        if let Some(vote) = &outcome.vote {
            match (role, vote.target_role) {
                (Role::Crewmate, Role::Impostor) => components.push(RewardComponent::new(
                    RewardCategory::Social,
                    "vote_hit_impostor",
                    reward_table::VOTE_HIT_IMPOSTOR,
                )),
                (Role::Crewmate, Role::Crewmate) => components.push(RewardComponent::new(
                    RewardCategory::Social,
                    "vote_hit_crewmate",
                    reward_table::VOTE_HIT_CREWMATE,
                )),
                (Role::Impostor, Role::Crewmate) => components.push(RewardComponent::new(
                    RewardCategory::Social,
                    "framed_innocent",
                    reward_table::FRAME_VOTE,
                )),
                (Role::Impostor, Role::Impostor) => {}
            }
        }
        if role.is_impostor() && outcome.survived_vote {
            components.push(RewardComponent::new(
                RewardCategory::Social,
                "survived_vote",
                reward_table::SURVIVED_VOTE,
            ));
        }

        // C. Role-specific action rewards. Critical State is recomputed
        // from the current snapshot before every resolution.
        if let Some(action) = &outcome.action {
            let critical = is_critical_state(snapshot);
            let value = match role {
                Role::Impostor => Self::impostor_action_reward(action),
                Role::Crewmate => Self::crewmate_action_reward(action, critical),
            };
            if let Some(value) = value {
                components.push(RewardComponent::new(
                    RewardCategory::Action,
                    action.kind.label(),
                    value,
                ));
            }
        }

        let total = components.iter().map(|c| c.value).sum();
        let category = if components
            .iter()
            .any(|c| c.category == RewardCategory::Social)
        {
            RewardCategory::Social
        } else {
            RewardCategory::Action
        };

        TurnReward {
            total,
            category,
            components,
        }
    }

    fn impostor_action_reward(action: &ActionOutcome) -> Option<f32> {
        match action.kind {
            EventKind::Kill => {
                let mut value = reward_table::KILL_BASE;
                if action.witness_count == 0 {
                    value += reward_table::KILL_UNSEEN_BONUS;
                } else {
                    value -= reward_table::KILL_WITNESS_PENALTY * action.witness_count as f32;
                }
                Some(value)
            }
            // Witness treatment for venting is binary: seen or unseen.
            EventKind::Vent => Some(if action.witness_count == 0 {
                reward_table::VENT_UNSEEN
            } else {
                reward_table::VENT_SEEN
            }),
            EventKind::ReportBody => Some(reward_table::SELF_REPORT),
            EventKind::FakeTask => Some(reward_table::IMPOSTOR_FAKE_TASK),
            EventKind::Sabotage => Some(reward_table::IMPOSTOR_SABOTAGE),
            EventKind::FixSabotage => Some(reward_table::IMPOSTOR_FIX_SABOTAGE),
            _ => None,
        }
    }

    fn crewmate_action_reward(action: &ActionOutcome, critical: bool) -> Option<f32> {
        match action.kind {
            EventKind::CompleteTask => Some(if critical {
                reward_table::CREW_COMPLETE_TASK_CRITICAL
            } else {
                reward_table::CREW_COMPLETE_TASK
            }),
            EventKind::FixSabotage => Some(reward_table::CREW_FIX_SABOTAGE),
            EventKind::ReportBody => Some(reward_table::CREW_REPORT_BODY),
            EventKind::Die => Some(if critical {
                reward_table::CREW_DIE_CRITICAL
            } else {
                reward_table::CREW_DIE
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm_state() -> GameStateSnapshot {
        // 5 crew is above both critical thresholds with 1 impostor.
        GameStateSnapshot::new(10, 5, 1)
    }

    fn critical_state() -> GameStateSnapshot {
        GameStateSnapshot::new(20, 3, 2)
    }

    #[test]
    fn test_critical_state_predicate() {
        assert!(!is_critical_state(&GameStateSnapshot::new(0, 5, 1)));
        assert!(is_critical_state(&GameStateSnapshot::new(0, 3, 1)));
        // 3 <= 2 + 2
        assert!(is_critical_state(&GameStateSnapshot::new(0, 3, 2)));
        assert!(is_critical_state(&GameStateSnapshot::new(0, 4, 2)));
    }

    #[test]
    fn test_critical_state_monotonic_as_crew_falls() {
        let engine_states: Vec<GameStateSnapshot> = (0..=5)
            .rev()
            .map(|crew| GameStateSnapshot::new(0, crew, 1))
            .collect();

        let mut seen_critical = false;
        for snapshot in &engine_states {
            let critical = is_critical_state(snapshot);
            if seen_critical {
                assert!(critical, "critical state must not clear as crew falls");
            }
            seen_critical |= critical;
        }
        assert!(seen_critical);
    }

    #[test]
    fn test_terminal_overrides_action() {
        let engine = RewardEngine::new();
        let snapshot = calm_state().with_winner(Role::Impostor);
        let outcome = TurnOutcome::new().with_action(EventKind::Kill, 0);

        let reward = engine.resolve(Role::Impostor, true, &snapshot, &outcome);

        assert_eq!(reward.total, 50.0);
        assert_eq!(reward.category, RewardCategory::Terminal);
        assert_eq!(reward.components.len(), 1);
    }

    #[test]
    fn test_terminal_martyr_and_loss() {
        let engine = RewardEngine::new();
        let snapshot = calm_state().with_winner(Role::Crewmate);

        let dead_winner = engine.resolve(Role::Crewmate, false, &snapshot, &TurnOutcome::new());
        assert_eq!(dead_winner.total, 30.0);

        let loser = engine.resolve(Role::Impostor, true, &snapshot, &TurnOutcome::new());
        assert_eq!(loser.total, -20.0);
    }

    #[test]
    fn test_unseen_kill_reward() {
        let engine = RewardEngine::new();
        let outcome = TurnOutcome::new().with_action(EventKind::Kill, 0);
        let reward = engine.resolve(Role::Impostor, true, &calm_state(), &outcome);
        assert_eq!(reward.total, 15.0);
        assert_eq!(reward.category, RewardCategory::Action);
    }

    #[test]
    fn test_kill_witness_penalty_scales() {
        let engine = RewardEngine::new();

        let one = TurnOutcome::new().with_action(EventKind::Kill, 1);
        assert_eq!(
            engine.resolve(Role::Impostor, true, &calm_state(), &one).total,
            2.0
        );

        // 10 - 8*2 = -6
        let two = TurnOutcome::new().with_action(EventKind::Kill, 2);
        assert_eq!(
            engine.resolve(Role::Impostor, true, &calm_state(), &two).total,
            -6.0
        );
    }

    #[test]
    fn test_vent_is_binary_on_witnesses() {
        let engine = RewardEngine::new();

        let unseen = TurnOutcome::new().with_action(EventKind::Vent, 0);
        assert_eq!(
            engine
                .resolve(Role::Impostor, true, &calm_state(), &unseen)
                .total,
            1.0
        );

        for witnesses in [1, 2, 3] {
            let seen = TurnOutcome::new().with_action(EventKind::Vent, witnesses);
            assert_eq!(
                engine
                    .resolve(Role::Impostor, true, &calm_state(), &seen)
                    .total,
                -10.0
            );
        }
    }

    #[test]
    fn test_crewmate_task_scales_in_critical_state() {
        let engine = RewardEngine::new();
        let outcome = TurnOutcome::new().with_action(EventKind::CompleteTask, 0);

        assert_eq!(
            engine
                .resolve(Role::Crewmate, true, &calm_state(), &outcome)
                .total,
            2.0
        );
        assert_eq!(
            engine
                .resolve(Role::Crewmate, true, &critical_state(), &outcome)
                .total,
            5.0
        );
    }

    #[test]
    fn test_crewmate_death_in_critical_state() {
        let engine = RewardEngine::new();
        let outcome = TurnOutcome::new().with_action(EventKind::Die, 0);

        // 3 crew, 2 impostors: 3 <= 2+2 holds.
        let reward = engine.resolve(Role::Crewmate, true, &critical_state(), &outcome);
        assert_eq!(reward.total, -50.0);

        let calm = engine.resolve(Role::Crewmate, true, &calm_state(), &outcome);
        assert_eq!(calm.total, -15.0);
    }

    #[test]
    fn test_hallucination_dominates_action_reward() {
        let engine = RewardEngine::new();
        let outcome = TurnOutcome::new()
            .with_action(EventKind::CompleteTask, 0)
            .with_hallucination();

        let reward = engine.resolve(Role::Crewmate, true, &calm_state(), &outcome);

        // -100 applied on top of the +2 task reward.
        assert_eq!(reward.total, -98.0);
        assert_eq!(reward.category, RewardCategory::Social);
        assert_eq!(reward.components.len(), 2);
    }

    #[test]
    fn test_vote_rewards_by_role() {
        let engine = RewardEngine::new();

        let crew_hit = TurnOutcome::new().with_vote(PlayerId(0), Role::Impostor);
        assert_eq!(
            engine
                .resolve(Role::Crewmate, true, &calm_state(), &crew_hit)
                .total,
            5.0
        );

        let crew_miss = TurnOutcome::new().with_vote(PlayerId(2), Role::Crewmate);
        assert_eq!(
            engine
                .resolve(Role::Crewmate, true, &calm_state(), &crew_miss)
                .total,
            -2.0
        );

        let framed = TurnOutcome::new().with_vote(PlayerId(2), Role::Crewmate);
        assert_eq!(
            engine
                .resolve(Role::Impostor, true, &calm_state(), &framed)
                .total,
            3.0
        );
    }

    #[test]
    fn test_impostor_survives_vote() {
        let engine = RewardEngine::new();
        let mut outcome = TurnOutcome::new();
        outcome.survived_vote = true;

        assert_eq!(
            engine
                .resolve(Role::Impostor, true, &calm_state(), &outcome)
                .total,
            10.0
        );
        // Crewmates get nothing from the same flag.
        assert_eq!(
            engine
                .resolve(Role::Crewmate, true, &calm_state(), &outcome)
                .total,
            0.0
        );
    }

    #[test]
    fn test_skipped_turn_is_zero() {
        let engine = RewardEngine::new();
        let reward = engine.resolve(Role::Crewmate, true, &calm_state(), &TurnOutcome::new());
        assert_eq!(reward.total, 0.0);
        assert!(reward.components.is_empty());
    }
}
