//! Kill-Risk Matrix
//!
//! Ranks candidate kill targets for an impostor, safest first. The ranking
//! is advisory context for the external action generator; it never selects
//! or vetoes an action itself.

use serde::{Deserialize, Serialize};

use deduction_events::PlayerId;

use crate::ledger::GroundTruthLedger;

/// Weights of the composite risk formula.
pub mod risk_weights {
    /// Risk added per other killable player left alive in the room.
    pub const WITNESS_STEP: f32 = 0.35;
    /// Weight of historical co-presence with the target.
    pub const EXPOSURE_WEIGHT: f32 = 0.4;
    /// Flat penalty when no vent is reachable from the kill room.
    pub const NO_ESCAPE_PENALTY: f32 = 0.25;
}

/// Risk assessment for one candidate target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRisk {
    pub target: PlayerId,
    /// Players left behind as witnesses if this target is killed.
    pub witnesses: u32,
    /// Fraction of elapsed timesteps the target was co-located with us.
    pub exposure: f32,
    /// Whether a vent escape is reachable from the kill room.
    pub vent_escape: bool,
    /// Composite risk in [0.0, 1.0].
    pub risk: f32,
}

/// Ranks kill candidates by composite risk.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskMatrix;

impl RiskMatrix {
    /// Creates the estimator.
    pub fn new() -> Self {
        Self
    }

    /// Ranks the candidates in the current room, ascending by risk.
    ///
    /// Ties break toward the lower player id so the ordering is fully
    /// deterministic.
    pub fn rank(
        &self,
        candidates: &[PlayerId],
        vent_reachable: bool,
        ledger: &GroundTruthLedger,
    ) -> Vec<TargetRisk> {
        if candidates.is_empty() {
            return Vec::new();
        }

        // Killing one candidate leaves the rest as witnesses.
        let witnesses = candidates.len().saturating_sub(1) as u32;
        let witness_risk = (witnesses as f32 * risk_weights::WITNESS_STEP).min(1.0);
        let escape_penalty = if vent_reachable {
            0.0
        } else {
            risk_weights::NO_ESCAPE_PENALTY
        };
        let total_timesteps = ledger.timesteps_recorded().max(1);

        let mut ranked: Vec<TargetRisk> = candidates
            .iter()
            .map(|&target| {
                let exposure = (ledger.co_location_count(target) as f32
                    / total_timesteps as f32)
                    .min(1.0);
                let risk = (witness_risk + risk_weights::EXPOSURE_WEIGHT * exposure
                    + escape_penalty)
                    .min(1.0);
                TargetRisk {
                    target,
                    witnesses,
                    exposure,
                    vent_escape: vent_reachable,
                    risk,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            a.risk
                .partial_cmp(&b.risk)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.target.cmp(&b.target))
        });
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deduction_events::{rooms, PresenceRecord, Role, Roster};

    use crate::ledger::LedgerSet;

    fn make_roster() -> Roster {
        Roster::from_names([
            ("Red", Role::Impostor),
            ("Blue", Role::Crewmate),
            ("Green", Role::Crewmate),
            ("Yellow", Role::Crewmate),
            ("Purple", Role::Crewmate),
        ])
    }

    /// Red has spent 4 timesteps around: Blue seen 3 times, Green once,
    /// Yellow never.
    fn red_ledger() -> LedgerSet {
        let mut set = LedgerSet::new(&make_roster(), rooms::STANDARD.iter().copied());
        let presence = vec![
            PresenceRecord::new(1, PlayerId(0), rooms::CAFETERIA)
                .with_others(vec![PlayerId(1), PlayerId(2)]),
            PresenceRecord::new(2, PlayerId(0), rooms::ADMIN).with_others(vec![PlayerId(1)]),
            PresenceRecord::new(3, PlayerId(0), rooms::STORAGE).with_others(vec![PlayerId(1)]),
            PresenceRecord::new(4, PlayerId(0), rooms::ELECTRICAL),
        ];
        set.ingest_timestep(&presence, &[]);
        set
    }

    #[test]
    fn test_lower_exposure_ranks_safer() {
        let set = red_ledger();
        let matrix = RiskMatrix::new();

        let ranked = matrix.rank(
            &[PlayerId(1), PlayerId(2), PlayerId(3)],
            true,
            set.get(PlayerId(0)).unwrap(),
        );

        assert_eq!(ranked.len(), 3);
        // Yellow (never co-located) is safest, Blue (3/4 exposure) riskiest.
        assert_eq!(ranked[0].target, PlayerId(3));
        assert_eq!(ranked[1].target, PlayerId(2));
        assert_eq!(ranked[2].target, PlayerId(1));
        assert!(ranked[0].risk <= ranked[1].risk);
        assert!(ranked[1].risk <= ranked[2].risk);
    }

    #[test]
    fn test_risk_formula_components() {
        let set = red_ledger();
        let matrix = RiskMatrix::new();

        let ranked = matrix.rank(&[PlayerId(1), PlayerId(2)], true, set.get(PlayerId(0)).unwrap());

        // Two candidates: one witness left behind.
        let blue = ranked.iter().find(|r| r.target == PlayerId(1)).unwrap();
        assert_eq!(blue.witnesses, 1);
        // witness_risk 0.35 + 0.4 * exposure (3/4) = 0.65
        assert!((blue.risk - 0.65).abs() < 1e-6);
        assert!((blue.exposure - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_no_vent_escape_penalty() {
        let set = red_ledger();
        let matrix = RiskMatrix::new();
        let ledger = set.get(PlayerId(0)).unwrap();

        let with_vent = matrix.rank(&[PlayerId(3)], true, ledger);
        let without_vent = matrix.rank(&[PlayerId(3)], false, ledger);

        assert!(
            (without_vent[0].risk - with_vent[0].risk - risk_weights::NO_ESCAPE_PENALTY).abs()
                < 1e-6
        );
    }

    #[test]
    fn test_risk_clamped_to_unit() {
        let set = red_ledger();
        let matrix = RiskMatrix::new();
        // A crowded room: witness risk alone is 4 * 0.35 = 1.4 before the cap.
        let crowd = vec![
            PlayerId(1),
            PlayerId(2),
            PlayerId(3),
            PlayerId(4),
            PlayerId(0),
        ];

        let ranked = matrix.rank(&crowd, false, set.get(PlayerId(0)).unwrap());
        for entry in &ranked {
            assert!(entry.risk <= 1.0);
        }
    }

    #[test]
    fn test_empty_candidates() {
        let set = red_ledger();
        let matrix = RiskMatrix::new();
        assert!(matrix
            .rank(&[], true, set.get(PlayerId(0)).unwrap())
            .is_empty());
    }
}
