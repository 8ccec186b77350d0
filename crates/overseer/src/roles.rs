//! Discussion Role Assignment
//!
//! Assigns each living agent a discussion role and speaking style at the
//! start of every meeting stage. Roles are recomputed each round so they
//! adapt as accusations land; a Bystander accused in round one defends in
//! round two. Agents sharing a role in the same round get distinct
//! speaking styles to avoid near-duplicate phrasing.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use deduction_events::{MeetingSnapshot, PlayerId, Role, Roster};

use crate::ledger::LedgerSet;

/// Discussion role for one meeting round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingRole {
    /// Accused while holding eyewitness evidence: defend by attacking.
    CounterAttacker,
    /// Accused: survival first.
    Defender,
    /// Holds hard eyewitness evidence: present it.
    Prosecutor,
    /// Holds location data: ask questions, cross-reference.
    Detective,
    /// No strong evidence: listen, evaluate, vouch.
    Bystander,
}

impl MeetingRole {
    /// Short behavioral brief for the prompt layer.
    pub fn brief(self) -> &'static str {
        match self {
            MeetingRole::CounterAttacker => {
                "You are accused but you saw the real crime. Turn the accusation back with your evidence."
            }
            MeetingRole::Defender => {
                "You are accused. Defend yourself with your exact location history and who can vouch for you."
            }
            MeetingRole::Prosecutor => {
                "You witnessed a crime. Present what you saw, exactly and concisely."
            }
            MeetingRole::Detective => {
                "You hold location data. Ask targeted questions and cross-reference testimonies."
            }
            MeetingRole::Bystander => {
                "You have no strong evidence. Listen, evaluate, and vouch only for what you know."
            }
        }
    }
}

/// Stylistic variation applied to agents sharing a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakingStyle {
    Direct,
    Methodical,
    Urgent,
    Analytical,
    Conversational,
}

impl SpeakingStyle {
    /// The fixed style set, in assignment order.
    pub const ALL: [SpeakingStyle; 5] = [
        SpeakingStyle::Direct,
        SpeakingStyle::Methodical,
        SpeakingStyle::Urgent,
        SpeakingStyle::Analytical,
        SpeakingStyle::Conversational,
    ];

    /// Style instruction for the prompt layer.
    pub fn instruction(self) -> &'static str {
        match self {
            SpeakingStyle::Direct => {
                "Be direct and brief. Short sentences, most important fact first."
            }
            SpeakingStyle::Methodical => {
                "Be detailed and methodical. Walk through the evidence step by step."
            }
            SpeakingStyle::Urgent => {
                "Be emotional and urgent. Make the stakes felt; use rhetorical questions."
            }
            SpeakingStyle::Analytical => {
                "Be analytical. Present your reasoning as an if-then chain."
            }
            SpeakingStyle::Conversational => {
                "Be conversational and natural, casual phrasing with accurate facts."
            }
        }
    }
}

/// One agent's assignment for a meeting round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: MeetingRole,
    pub style: SpeakingStyle,
}

/// Per-round role and style assignor.
///
/// Owns a seeded rng so the impostor's blend-in choice is reproducible
/// across runs with the same configuration.
#[derive(Debug)]
pub struct RoleAssigner {
    rng: SmallRng,
}

impl RoleAssigner {
    /// Creates an assigner with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Computes the role for one agent in the current round.
    ///
    /// Crewmate priority stack, highest match wins: accused with
    /// eyewitness evidence, accused, witnessed a crime, holds location
    /// data, else bystander. Impostors never prosecute: accused defend,
    /// fabricated-claim holders investigate, the rest blend in at random.
    pub fn assign(
        &mut self,
        agent: PlayerId,
        role: Role,
        meeting: &MeetingSnapshot,
        ledgers: &LedgerSet,
    ) -> MeetingRole {
        let Some(ledger) = ledgers.get(agent) else {
            return MeetingRole::Bystander;
        };
        let accused = meeting.is_accused(agent);
        let witnessed = ledger.has_witnessed_crime();

        if role.is_impostor() {
            let fabricated = witnessed
                || ledger.deception().is_some_and(|d| d.has_claims());
            if accused {
                MeetingRole::Defender
            } else if fabricated {
                // A "witnessed" claim is framing material; prosecuting
                // outright draws too much attention.
                MeetingRole::Detective
            } else if self.rng.gen_range(0..2) == 0 {
                MeetingRole::Detective
            } else {
                MeetingRole::Bystander
            }
        } else if accused && witnessed {
            MeetingRole::CounterAttacker
        } else if accused {
            MeetingRole::Defender
        } else if witnessed {
            MeetingRole::Prosecutor
        } else if ledger.has_location_data() {
            MeetingRole::Detective
        } else {
            MeetingRole::Bystander
        }
    }

    /// Assigns every living, non-ejected agent a role and a style for one
    /// stage of the meeting.
    ///
    /// Within the round, agents sharing a role receive distinct styles in
    /// roster order.
    pub fn assign_round(
        &mut self,
        roster: &Roster,
        living: &[PlayerId],
        meeting: &MeetingSnapshot,
        ledgers: &LedgerSet,
    ) -> BTreeMap<PlayerId, RoleAssignment> {
        let mut assignments = BTreeMap::new();
        let mut per_role_counts: BTreeMap<MeetingRole, usize> = BTreeMap::new();

        let mut ordered: Vec<PlayerId> = living.to_vec();
        ordered.sort();

        for agent in ordered {
            let Some(info) = roster.get(agent) else {
                continue;
            };
            let role = self.assign(agent, info.role, meeting, ledgers);
            let count = per_role_counts.entry(role).or_insert(0);
            let style = SpeakingStyle::ALL[*count % SpeakingStyle::ALL.len()];
            *count += 1;
            assignments.insert(agent, RoleAssignment { role, style });
        }

        assignments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deduction_events::{rooms, EventKind, GameEvent, MeetingStage, PresenceRecord};

    fn make_roster() -> Roster {
        Roster::from_names([
            ("Red", Role::Impostor),
            ("Blue", Role::Crewmate),
            ("Green", Role::Crewmate),
            ("Yellow", Role::Crewmate),
            ("Purple", Role::Crewmate),
        ])
    }

    /// Blue witnessed the kill; Green and Yellow have location data;
    /// Purple has nothing on record.
    fn make_ledgers() -> LedgerSet {
        let mut set = LedgerSet::new(&make_roster(), rooms::STANDARD.iter().copied());
        let presence = vec![
            PresenceRecord::new(1, PlayerId(1), rooms::REACTOR),
            PresenceRecord::new(1, PlayerId(2), rooms::ADMIN),
            PresenceRecord::new(1, PlayerId(3), rooms::STORAGE),
        ];
        let kill = GameEvent::new("evt_000001", 1, EventKind::Kill, PlayerId(0), rooms::REACTOR)
            .with_target(PlayerId(4))
            .with_witnesses(vec![PlayerId(1)]);
        set.ingest_timestep(&presence, &[kill]);
        set
    }

    #[test]
    fn test_crewmate_priority_stack() {
        let mut assigner = RoleAssigner::with_seed(7);
        let ledgers = make_ledgers();
        let mut meeting = MeetingSnapshot::new(0, MeetingStage::Accusation);

        // Witness, not accused: prosecutor.
        assert_eq!(
            assigner.assign(PlayerId(1), Role::Crewmate, &meeting, &ledgers),
            MeetingRole::Prosecutor
        );
        // Location data only: detective.
        assert_eq!(
            assigner.assign(PlayerId(2), Role::Crewmate, &meeting, &ledgers),
            MeetingRole::Detective
        );
        // Nothing on record: bystander.
        assert_eq!(
            assigner.assign(PlayerId(4), Role::Crewmate, &meeting, &ledgers),
            MeetingRole::Bystander
        );

        // Accusations flip the stack.
        meeting.accuse(PlayerId(1));
        meeting.accuse(PlayerId(2));
        assert_eq!(
            assigner.assign(PlayerId(1), Role::Crewmate, &meeting, &ledgers),
            MeetingRole::CounterAttacker
        );
        assert_eq!(
            assigner.assign(PlayerId(2), Role::Crewmate, &meeting, &ledgers),
            MeetingRole::Defender
        );
    }

    #[test]
    fn test_impostor_never_prosecutor() {
        let ledgers = make_ledgers();
        let meeting = MeetingSnapshot::new(0, MeetingStage::Accusation);

        for seed in 0..20 {
            let mut assigner = RoleAssigner::with_seed(seed);
            let role = assigner.assign(PlayerId(0), Role::Impostor, &meeting, &ledgers);
            assert_ne!(role, MeetingRole::Prosecutor);
            assert_ne!(role, MeetingRole::CounterAttacker);
        }
    }

    #[test]
    fn test_accused_impostor_defends() {
        let mut assigner = RoleAssigner::with_seed(3);
        let ledgers = make_ledgers();
        let mut meeting = MeetingSnapshot::new(1, MeetingStage::Accusation);
        meeting.accuse(PlayerId(0));

        assert_eq!(
            assigner.assign(PlayerId(0), Role::Impostor, &meeting, &ledgers),
            MeetingRole::Defender
        );
    }

    #[test]
    fn test_impostor_with_fabricated_claims_investigates() {
        let mut assigner = RoleAssigner::with_seed(3);
        let mut ledgers = make_ledgers();
        ledgers.set_claimed_alibi(PlayerId(0), rooms::MEDBAY);
        let meeting = MeetingSnapshot::new(0, MeetingStage::Testimony);

        assert_eq!(
            assigner.assign(PlayerId(0), Role::Impostor, &meeting, &ledgers),
            MeetingRole::Detective
        );
    }

    #[test]
    fn test_shared_roles_get_distinct_styles() {
        let mut assigner = RoleAssigner::with_seed(11);
        let roster = make_roster();
        let ledgers = make_ledgers();
        let meeting = MeetingSnapshot::new(0, MeetingStage::Testimony);
        let living: Vec<PlayerId> = roster.ids().collect();

        let assignments = assigner.assign_round(&roster, &living, &meeting, &ledgers);
        assert_eq!(assignments.len(), 5);

        let mut by_role: BTreeMap<MeetingRole, Vec<SpeakingStyle>> = BTreeMap::new();
        for assignment in assignments.values() {
            by_role
                .entry(assignment.role)
                .or_default()
                .push(assignment.style);
        }
        for (role, styles) in by_role {
            let mut unique = styles.clone();
            unique.sort_by_key(|s| *s as usize);
            unique.dedup();
            assert_eq!(unique.len(), styles.len(), "duplicate style within {:?}", role);
        }
    }

    #[test]
    fn test_same_seed_same_assignments() {
        let roster = make_roster();
        // No events on record, so the impostor has no fabricated claims
        // and the blend-in choice actually consults the rng.
        let ledgers = LedgerSet::new(&roster, rooms::STANDARD.iter().copied());
        let meeting = MeetingSnapshot::new(0, MeetingStage::Testimony);
        let living: Vec<PlayerId> = roster.ids().collect();

        let mut a = RoleAssigner::with_seed(99);
        let mut b = RoleAssigner::with_seed(99);

        let first = a.assign_round(&roster, &living, &meeting, &ledgers);
        let second = b.assign_round(&roster, &living, &meeting, &ledgers);
        assert_eq!(first, second);
    }

    #[test]
    fn test_dead_players_excluded_by_caller() {
        let mut assigner = RoleAssigner::with_seed(5);
        let roster = make_roster();
        let ledgers = make_ledgers();
        let meeting = MeetingSnapshot::new(0, MeetingStage::Testimony);

        // Purple is dead; the caller passes only the living.
        let living = vec![PlayerId(0), PlayerId(1), PlayerId(2), PlayerId(3)];
        let assignments = assigner.assign_round(&roster, &living, &meeting, &ledgers);

        assert_eq!(assignments.len(), 4);
        assert!(!assignments.contains_key(&PlayerId(4)));
    }
}
