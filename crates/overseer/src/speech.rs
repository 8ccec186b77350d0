//! Speech Validator
//!
//! Pre-commit gate for candidate discussion speech. Builds a per-agent
//! line-of-sight truth table from the ground-truth ledger, then scores the
//! draft with an additive rule table: hallucination-class matches are
//! strongly negative, evidence-class matches positive in proportion to
//! evidentiary strength, filler weakly positive. A negative total rejects
//! the draft and the caller must regenerate.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use deduction_events::Roster;

use crate::ledger::GroundTruthLedger;

/// Point values for the scoring rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechWeights {
    // Hallucination class
    pub xray_vision: i32,
    pub meta_gaming: i32,
    pub self_incrimination: i32,
    pub spatial_non_sequitur: i32,
    // Evidence class
    pub kill_witness: i32,
    pub vent_witness: i32,
    pub verified_alibi: i32,
    pub path_contradiction: i32,
    pub visual_task_defense: i32,
    pub task_bar: i32,
    pub spatial_logic: i32,
    pub sighting: i32,
    // Filler class
    pub uncertainty: i32,
    pub skip_vote: i32,
    pub agreement: i32,
    pub unclassified: i32,
}

impl Default for SpeechWeights {
    fn default() -> Self {
        Self {
            xray_vision: -100,
            meta_gaming: -50,
            self_incrimination: -50,
            spatial_non_sequitur: -20,
            kill_witness: 20,
            vent_witness: 18,
            verified_alibi: 12,
            path_contradiction: 10,
            visual_task_defense: 10,
            task_bar: 8,
            spatial_logic: 8,
            sighting: 5,
            uncertainty: 2,
            skip_vote: 1,
            agreement: 1,
            unclassified: 2,
        }
    }
}

/// Named scoring rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechRule {
    XrayVision,
    MetaGaming,
    SelfIncrimination,
    SpatialNonSequitur,
    KillWitness,
    VentWitness,
    VerifiedAlibi,
    PathContradiction,
    VisualTaskDefense,
    TaskBar,
    SpatialLogic,
    Sighting,
    Uncertainty,
    SkipVote,
    Agreement,
    Unclassified,
}

impl SpeechRule {
    /// Correction guidance sent back with a rejection.
    pub fn correction_hint(self) -> Option<&'static str> {
        match self {
            SpeechRule::XrayVision => Some(
                "Only discuss rooms you personally visited and players you personally saw.",
            ),
            SpeechRule::MetaGaming => {
                Some("Speak naturally; do not reference logs, timesteps, or game mechanics.")
            }
            SpeechRule::SelfIncrimination => {
                Some("Protect your cover; do not reveal your own actions.")
            }
            SpeechRule::SpatialNonSequitur => Some(
                "Being in one room tells you nothing about a different room.",
            ),
            _ => None,
        }
    }
}

impl fmt::Display for SpeechRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpeechRule::XrayVision => "xray_vision",
            SpeechRule::MetaGaming => "meta_gaming",
            SpeechRule::SelfIncrimination => "self_incrimination",
            SpeechRule::SpatialNonSequitur => "spatial_non_sequitur",
            SpeechRule::KillWitness => "kill_witness",
            SpeechRule::VentWitness => "vent_witness",
            SpeechRule::VerifiedAlibi => "verified_alibi",
            SpeechRule::PathContradiction => "path_contradiction",
            SpeechRule::VisualTaskDefense => "visual_task_defense",
            SpeechRule::TaskBar => "task_bar",
            SpeechRule::SpatialLogic => "spatial_logic",
            SpeechRule::Sighting => "sighting",
            SpeechRule::Uncertainty => "uncertainty",
            SpeechRule::SkipVote => "skip_vote",
            SpeechRule::Agreement => "agreement",
            SpeechRule::Unclassified => "unclassified",
        };
        write!(f, "{}", name)
    }
}

/// One rule that fired on a draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleMatch {
    pub rule: SpeechRule,
    pub points: i32,
    pub detail: String,
}

/// Validation result for one draft statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechVerdict {
    pub accepted: bool,
    pub score: i32,
    pub matches: Vec<RuleMatch>,
}

impl SpeechVerdict {
    /// Rules that contributed negative points.
    pub fn rejection_rules(&self) -> Vec<SpeechRule> {
        self.matches
            .iter()
            .filter(|m| m.points < 0)
            .map(|m| m.rule)
            .collect()
    }

    /// Regeneration instruction assembled from the failed rules.
    pub fn correction_instruction(&self) -> String {
        let hints: Vec<&str> = self
            .rejection_rules()
            .iter()
            .filter_map(|r| r.correction_hint())
            .collect();
        if hints.is_empty() {
            "Stick to what you actually saw in rooms you visited.".to_string()
        } else {
            hints.join(" ")
        }
    }
}

/// Line-of-sight truth table for one agent, built strictly from the
/// ground-truth ledger. No claim about a room outside `rooms_visited` is
/// ever valid; an impostor's claimed alibi room is the one sanctioned
/// exception (intentional deception is their job).
#[derive(Debug, Clone)]
pub struct TruthTable {
    pub saw_kill: bool,
    pub saw_vent: bool,
    pub rooms_visited: BTreeSet<String>,
    /// room -> lowercase names of players seen there
    pub players_seen_per_room: BTreeMap<String, BTreeSet<String>>,
    pub is_impostor: bool,
    pub kill_room: Option<String>,
    pub claimed_alibi: Option<String>,
}

impl TruthTable {
    /// Builds the table from one agent's ledger.
    pub fn build(ledger: &GroundTruthLedger, roster: &Roster) -> Self {
        let mut rooms_visited = ledger.rooms_visited().clone();
        let mut players_seen_per_room = BTreeMap::new();

        for room in ledger.rooms_visited() {
            let names: BTreeSet<String> = ledger
                .players_seen_in(room)
                .into_iter()
                .filter_map(|id| roster.name_of(id).map(str::to_lowercase))
                .collect();
            if !names.is_empty() {
                players_seen_per_room.insert(room.clone(), names);
            }
        }

        let deception = ledger.deception();
        let kill_room = deception.and_then(|d| d.kill_room.clone());
        let claimed_alibi = deception.and_then(|d| d.claimed_alibi.clone());
        if let Some(alibi) = &claimed_alibi {
            rooms_visited.insert(alibi.to_lowercase());
        }

        Self {
            saw_kill: ledger.saw_kill(),
            saw_vent: ledger.saw_vent(),
            rooms_visited,
            players_seen_per_room,
            is_impostor: deception.is_some(),
            kill_room,
            claimed_alibi,
        }
    }

    fn visited(&self, room: &str) -> bool {
        self.rooms_visited.contains(room)
    }
}

/// Validator construction failure.
#[derive(Debug)]
pub enum SpeechError {
    /// A scoring pattern failed to compile.
    Pattern(regex::Error),
}

impl fmt::Display for SpeechError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeechError::Pattern(e) => write!(f, "Pattern error: {}", e),
        }
    }
}

impl std::error::Error for SpeechError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SpeechError::Pattern(e) => Some(e),
        }
    }
}

impl From<regex::Error> for SpeechError {
    fn from(e: regex::Error) -> Self {
        SpeechError::Pattern(e)
    }
}

const PATH_CONTRADICTION_PHRASES: &[&str] = &[
    "how did you get from",
    "rooms aren't connected",
    "rooms aren't adjacent",
    "not adjacent",
    "that's impossible",
    "couldn't get from",
    "did you vent",
    "those rooms",
];

const TASK_BAR_PHRASES: &[&str] = &[
    "task bar didn't",
    "task bar did not",
    "faking task",
    "fake task",
    "bar didn't go up",
    "bar didn't move",
    "bar didn't increase",
];

const SPATIAL_LOGIC_PHRASES: &[&str] = &[
    "couldn't get from",
    "can't get from",
    "too far",
    "rooms apart",
    "not enough time",
];

const VISUAL_DEFENSE_PHRASES: &[&str] = &[
    "watch me do",
    "visual task",
    "medbay scan",
    "asteroids",
    "watch me complete",
    "i can prove",
];

const UNCERTAINTY_PHRASES: &[&str] = &[
    "didn't see",
    "don't know",
    "no information",
    "no evidence",
    "nothing suspicious",
    "i have no",
];

const IMPOSTOR_FALLBACK: &str =
    "I was doing my tasks. I didn't see anything unusual. Has anyone else found anything?";
const CREWMATE_FALLBACK: &str =
    "I was doing my tasks. I don't have any direct evidence to share right now.";

/// Pre-scored safe statement used when the retry budget runs out.
pub fn fallback_statement(is_impostor: bool) -> &'static str {
    if is_impostor {
        IMPOSTOR_FALLBACK
    } else {
        CREWMATE_FALLBACK
    }
}

/// The scoring gate itself. Patterns are compiled once per game from the
/// configured room catalogue and roster names.
pub struct SpeechValidator {
    weights: SpeechWeights,
    meta_patterns: Vec<Regex>,
    incrimination_patterns: Vec<Regex>,
    spatial_non_sequitur: Regex,
    first_person_location: Regex,
    observation_patterns: Vec<Regex>,
    presence_denial: Regex,
    verified_alibi: Regex,
    sighting: Regex,
    kill_reference: Regex,
    vent_reference: Regex,
}

impl SpeechValidator {
    /// Compiles the rule patterns for the given rooms and roster.
    pub fn new(
        weights: SpeechWeights,
        known_rooms: &[String],
        roster: &Roster,
    ) -> Result<Self, SpeechError> {
        let room_alt = alternation(known_rooms.iter().map(String::as_str));
        let name_alt = alternation(roster.iter().map(|p| p.name.as_str()));
        let subject_alt = format!(r"(?:player\s*\d+|{})", name_alt);

        let meta_patterns = [
            r"\bverified presence log\b",
            r"\bgame engine\b",
            r"\bsystem log\b",
            r"\bmemory stream\b",
            r"\btimestep\s*\d+\b",
            r"\bt\d+\b",
            r"\bobservation history\b",
            r"\baction history\b",
            r"\bpresence log\b",
        ]
        .iter()
        .map(|p| Regex::new(p))
        .collect::<Result<Vec<_>, _>>()?;

        let incrimination_patterns = [
            r"\bi killed\b",
            r"\bi did kill\b",
            r"\bi murdered\b",
            r"\bi vented\b",
            r"\bi used (?:the )?vent\b",
        ]
        .iter()
        .map(|p| Regex::new(p))
        .collect::<Result<Vec<_>, _>>()?;

        let spatial_non_sequitur = Regex::new(&format!(
            concat!(
                r"i was (?:in|at) ({room})",
                r".*?(?:so|therefore|thus|which means|that means|this means)",
                r".*?(?:you|they|he|she|{subject})\s+",
                r"(?:weren't|wasn't|couldn't|could not|were not|was not|can't|cannot)\s+",
                r"(?:have been\s+)?(?:in|at)\s+({room})",
            ),
            room = room_alt,
            subject = subject_alt,
        ))?;

        let first_person_location =
            Regex::new(&format!(r"\bi was (?:in|at) ({})", room_alt))?;

        let observation_patterns = [
            format!(
                r"\bi (?:saw|noticed|watched|witnessed) .+? (?:in|at) ({})",
                room_alt
            ),
            format!(r"\bwhen i was (?:in|at) ({})", room_alt),
            format!(
                r"\bin ({}),?\s+i (?:saw|noticed|watched|witnessed)",
                room_alt
            ),
        ]
        .iter()
        .map(|p| Regex::new(p))
        .collect::<Result<Vec<_>, _>>()?;

        let presence_denial = Regex::new(&format!(
            r"{}\s+(?:was not|wasn't|were not|weren't|couldn't have been|could not have been)\s+(?:in|at)\s+({})",
            subject_alt, room_alt,
        ))?;

        let verified_alibi = Regex::new(&format!(
            r"\bi was with ([a-z0-9 ]+?) (?:in|at) ({})",
            room_alt
        ))?;

        let sighting = Regex::new(r"\bi saw [a-z0-9 ]+ (?:in|at|near|heading|going)")?;
        let kill_reference = Regex::new(r"\b(?:kill|murder|stab|attack)")?;
        let vent_reference = Regex::new(r"\bvent(?:ed|ing)?\b")?;

        Ok(Self {
            weights,
            meta_patterns,
            incrimination_patterns,
            spatial_non_sequitur,
            first_person_location,
            observation_patterns,
            presence_denial,
            verified_alibi,
            sighting,
            kill_reference,
            vent_reference,
        })
    }

    /// Scores a draft statement against the agent's truth table.
    ///
    /// Score >= 0 accepts; score < 0 rejects and the caller must
    /// regenerate.
    pub fn validate(&self, draft: &str, truths: &TruthTable) -> SpeechVerdict {
        let speech = normalize(draft);
        let mut score = 0i32;
        let mut matches = Vec::new();

        self.apply_hallucination_rules(&speech, truths, &mut score, &mut matches);
        self.apply_evidence_rules(&speech, truths, &mut score, &mut matches);
        self.apply_filler_rules(&speech, &mut score, &mut matches);

        let verdict = SpeechVerdict {
            accepted: score >= 0,
            score,
            matches,
        };
        tracing::debug!(score, accepted = verdict.accepted, "scored speech draft");
        verdict
    }

    fn apply_hallucination_rules(
        &self,
        speech: &str,
        truths: &TruthTable,
        score: &mut i32,
        matches: &mut Vec<RuleMatch>,
    ) {
        // Meta-gaming: referencing game internals instead of speaking
        // naturally.
        for pattern in &self.meta_patterns {
            if let Some(found) = pattern.find(speech) {
                *score += self.weights.meta_gaming;
                matches.push(RuleMatch {
                    rule: SpeechRule::MetaGaming,
                    points: self.weights.meta_gaming,
                    detail: format!("referenced game mechanic '{}'", found.as_str()),
                });
                break;
            }
        }

        // Self-incrimination: an impostor with a recorded kill confessing
        // or revealing the true kill room.
        if truths.is_impostor && truths.kill_room.is_some() {
            for pattern in &self.incrimination_patterns {
                if pattern.is_match(speech) {
                    *score += self.weights.self_incrimination;
                    matches.push(RuleMatch {
                        rule: SpeechRule::SelfIncrimination,
                        points: self.weights.self_incrimination,
                        detail: "confession detected".to_string(),
                    });
                    break;
                }
            }
            if let (Some(kill_room), Some(alibi)) = (&truths.kill_room, &truths.claimed_alibi) {
                if kill_room != alibi {
                    for caps in self.first_person_location.captures_iter(speech) {
                        if &caps[1] == kill_room.as_str() {
                            *score += self.weights.self_incrimination;
                            matches.push(RuleMatch {
                                rule: SpeechRule::SelfIncrimination,
                                points: self.weights.self_incrimination,
                                detail: format!("revealed kill location '{}'", kill_room),
                            });
                            break;
                        }
                    }
                }
            }
        }

        // Spatial non-sequitur: being in room A proves nothing about room B.
        if let Some(caps) = self.spatial_non_sequitur.captures(speech) {
            let room_a = &caps[1];
            let room_b = &caps[2];
            if room_a != room_b {
                *score += self.weights.spatial_non_sequitur;
                matches.push(RuleMatch {
                    rule: SpeechRule::SpatialNonSequitur,
                    points: self.weights.spatial_non_sequitur,
                    detail: format!("in '{}' yet claimed knowledge of '{}'", room_a, room_b),
                });
            }
        }

        // Sight claims outside line of sight. Crewmates are checked on
        // first-person presence claims; everyone is checked on observation
        // and denial claims.
        if !truths.is_impostor {
            for caps in self.first_person_location.captures_iter(speech) {
                let room = &caps[1];
                if !truths.visited(room) {
                    *score += self.weights.xray_vision;
                    matches.push(RuleMatch {
                        rule: SpeechRule::XrayVision,
                        points: self.weights.xray_vision,
                        detail: format!("claimed presence in unvisited '{}'", room),
                    });
                    break;
                }
            }
        }
        'observation: for pattern in &self.observation_patterns {
            for caps in pattern.captures_iter(speech) {
                let room = &caps[1];
                if !truths.visited(room) {
                    *score += self.weights.xray_vision;
                    matches.push(RuleMatch {
                        rule: SpeechRule::XrayVision,
                        points: self.weights.xray_vision,
                        detail: format!("claimed observation in unvisited '{}'", room),
                    });
                    break 'observation;
                }
            }
        }
        for caps in self.presence_denial.captures_iter(speech) {
            let room = &caps[1];
            if !truths.visited(room) {
                *score += self.weights.xray_vision;
                matches.push(RuleMatch {
                    rule: SpeechRule::XrayVision,
                    points: self.weights.xray_vision,
                    detail: format!("denied presence in unvisited '{}'", room),
                });
                break;
            }
        }
    }

    fn apply_evidence_rules(
        &self,
        speech: &str,
        truths: &TruthTable,
        score: &mut i32,
        matches: &mut Vec<RuleMatch>,
    ) {
        if truths.saw_kill && self.kill_reference.is_match(speech) {
            *score += self.weights.kill_witness;
            matches.push(RuleMatch {
                rule: SpeechRule::KillWitness,
                points: self.weights.kill_witness,
                detail: "referenced witnessed kill".to_string(),
            });
        }

        if truths.saw_vent && self.vent_reference.is_match(speech) {
            *score += self.weights.vent_witness;
            matches.push(RuleMatch {
                rule: SpeechRule::VentWitness,
                points: self.weights.vent_witness,
                detail: "referenced witnessed vent".to_string(),
            });
        }

        // Verified alibi: "I was with X in Y" confirmed by the ledger.
        if let Some(caps) = self.verified_alibi.captures(speech) {
            let claimed_player = caps[1].trim().to_string();
            let room = &caps[2];
            if truths.visited(room) {
                let seen = truths
                    .players_seen_per_room
                    .get(room)
                    .is_some_and(|names| names.iter().any(|n| claimed_player.contains(n.as_str())));
                if seen {
                    *score += self.weights.verified_alibi;
                    matches.push(RuleMatch {
                        rule: SpeechRule::VerifiedAlibi,
                        points: self.weights.verified_alibi,
                        detail: format!("verified with '{}' in '{}'", claimed_player, room),
                    });
                }
            }
        }

        if contains_any(speech, PATH_CONTRADICTION_PHRASES) {
            *score += self.weights.path_contradiction;
            matches.push(RuleMatch {
                rule: SpeechRule::PathContradiction,
                points: self.weights.path_contradiction,
                detail: "challenged impossible travel".to_string(),
            });
        }

        if contains_any(speech, TASK_BAR_PHRASES) {
            *score += self.weights.task_bar;
            matches.push(RuleMatch {
                rule: SpeechRule::TaskBar,
                points: self.weights.task_bar,
                detail: "referenced task bar evidence".to_string(),
            });
        }

        // Spatial impossibility overlaps with path contradiction; count
        // only one of the two.
        if contains_any(speech, SPATIAL_LOGIC_PHRASES)
            && !matches.iter().any(|m| m.rule == SpeechRule::PathContradiction)
        {
            *score += self.weights.spatial_logic;
            matches.push(RuleMatch {
                rule: SpeechRule::SpatialLogic,
                points: self.weights.spatial_logic,
                detail: "argued spatial impossibility".to_string(),
            });
        }

        if contains_any(speech, VISUAL_DEFENSE_PHRASES) {
            *score += self.weights.visual_task_defense;
            matches.push(RuleMatch {
                rule: SpeechRule::VisualTaskDefense,
                points: self.weights.visual_task_defense,
                detail: "offered visual proof".to_string(),
            });
        }

        if !truths.saw_kill && !truths.saw_vent && self.sighting.is_match(speech) {
            *score += self.weights.sighting;
            matches.push(RuleMatch {
                rule: SpeechRule::Sighting,
                points: self.weights.sighting,
                detail: "reported a sighting".to_string(),
            });
        }
    }

    fn apply_filler_rules(&self, speech: &str, score: &mut i32, matches: &mut Vec<RuleMatch>) {
        // Filler is a floor for otherwise empty statements, never a rescue
        // for ones that tripped a rule.
        if !matches.is_empty() {
            return;
        }

        let (rule, points, detail) = if speech.contains("skip") || speech.contains("don't have enough")
        {
            (SpeechRule::SkipVote, self.weights.skip_vote, "suggested skipping")
        } else if speech.contains("i agree") || speech.contains("i think so too") {
            (SpeechRule::Agreement, self.weights.agreement, "agreed with another player")
        } else if contains_any(speech, UNCERTAINTY_PHRASES) {
            (
                SpeechRule::Uncertainty,
                self.weights.uncertainty,
                "admitted lack of information",
            )
        } else {
            (
                SpeechRule::Unclassified,
                self.weights.unclassified,
                "unclassified speech",
            )
        };

        *score += points;
        matches.push(RuleMatch {
            rule,
            points,
            detail: detail.to_string(),
        });
    }
}

/// Lowercases and collapses whitespace so multi-line drafts score the same
/// as single-line ones.
fn normalize(speech: &str) -> String {
    speech
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn contains_any(speech: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| speech.contains(p))
}

/// Builds a regex alternation, longest entries first, all literals escaped.
fn alternation<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let mut escaped: Vec<String> = items.map(|s| regex::escape(&s.to_lowercase())).collect();
    escaped.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    format!("(?:{})", escaped.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deduction_events::{rooms, GameEvent, EventKind, PlayerId, PresenceRecord, Role};

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

    fn standard_rooms() -> Vec<String> {
        rooms::STANDARD.iter().map(|r| r.to_string()).collect()
    }

    fn make_validator() -> SpeechValidator {
        SpeechValidator::new(SpeechWeights::default(), &standard_rooms(), &make_roster()).unwrap()
    }

    fn truths_for(set: &LedgerSet, id: PlayerId) -> TruthTable {
        TruthTable::build(set.get(id).unwrap(), &make_roster())
    }

    fn blue_in_admin_with_green() -> LedgerSet {
        let mut set = LedgerSet::new(&make_roster(), rooms::STANDARD.iter().copied());
        let presence = vec![
            PresenceRecord::new(1, PlayerId(1), rooms::CAFETERIA),
            PresenceRecord::new(2, PlayerId(1), rooms::ADMIN).with_others(vec![PlayerId(2)]),
        ];
        set.ingest_timestep(&presence, &[]);
        set
    }

    #[test]
    fn test_unvisited_room_claim_rejected() {
        let validator = make_validator();
        let set = blue_in_admin_with_green();
        let truths = truths_for(&set, PlayerId(1));

        let verdict = validator.validate("I was in reactor doing my tasks.", &truths);

        assert!(!verdict.accepted);
        assert!(verdict.score <= -100);
        assert!(verdict.rejection_rules().contains(&SpeechRule::XrayVision));
    }

    #[test]
    fn test_observation_outside_los_rejected() {
        let validator = make_validator();
        let set = blue_in_admin_with_green();
        let truths = truths_for(&set, PlayerId(1));

        let verdict = validator.validate("I saw Red in electrical near the wires.", &truths);

        assert!(!verdict.accepted);
        assert!(verdict.rejection_rules().contains(&SpeechRule::XrayVision));
    }

    #[test]
    fn test_denial_outside_los_rejected() {
        let validator = make_validator();
        let set = blue_in_admin_with_green();
        let truths = truths_for(&set, PlayerId(1));

        let verdict = validator.validate("Red wasn't in storage, I'm sure of it.", &truths);

        assert!(!verdict.accepted);
        assert!(verdict.rejection_rules().contains(&SpeechRule::XrayVision));
    }

    #[test]
    fn test_meta_gaming_rejected() {
        let validator = make_validator();
        let set = blue_in_admin_with_green();
        let truths = truths_for(&set, PlayerId(1));

        let verdict = validator.validate(
            "According to my observation history, Red moved at timestep 4.",
            &truths,
        );

        assert!(!verdict.accepted);
        assert!(verdict.rejection_rules().contains(&SpeechRule::MetaGaming));
    }

    #[test]
    fn test_verified_alibi_scores_positive() {
        let validator = make_validator();
        let set = blue_in_admin_with_green();
        let truths = truths_for(&set, PlayerId(1));

        let verdict = validator.validate("I was with green in admin the whole time.", &truths);

        assert!(verdict.accepted);
        assert!(verdict
            .matches
            .iter()
            .any(|m| m.rule == SpeechRule::VerifiedAlibi));
        assert_eq!(verdict.score, 12);
    }

    #[test]
    fn test_kill_witness_reference() {
        let mut set = LedgerSet::new(&make_roster(), rooms::STANDARD.iter().copied());
        let presence = vec![PresenceRecord::new(3, PlayerId(1), rooms::REACTOR)];
        let kill = GameEvent::new("evt_000001", 3, EventKind::Kill, PlayerId(0), rooms::REACTOR)
            .with_target(PlayerId(2))
            .with_witnesses(vec![PlayerId(1)]);
        set.ingest_timestep(&presence, &[kill]);

        let validator = make_validator();
        let truths = truths_for(&set, PlayerId(1));

        let verdict = validator.validate("I watched Red kill Green in reactor!", &truths);

        assert!(verdict.accepted);
        assert!(verdict
            .matches
            .iter()
            .any(|m| m.rule == SpeechRule::KillWitness));
    }

    #[test]
    fn test_impostor_alibi_room_exempt() {
        let mut set = LedgerSet::new(&make_roster(), rooms::STANDARD.iter().copied());
        let kill = GameEvent::new("evt_000001", 3, EventKind::Kill, PlayerId(0), rooms::REACTOR)
            .with_target(PlayerId(2));
        set.ingest_timestep(&[], &[kill]);
        set.set_claimed_alibi(PlayerId(0), rooms::MEDBAY);

        let validator = make_validator();
        let truths = truths_for(&set, PlayerId(0));

        // The claimed alibi room counts as sayable even though it was
        // never visited.
        let verdict = validator.validate("I was in medbay doing my scan.", &truths);
        assert!(verdict.accepted);

        // Revealing the true kill room is self-incrimination.
        let confession = validator.validate("I was in reactor earlier.", &truths);
        assert!(!confession.accepted);
        assert!(confession
            .rejection_rules()
            .contains(&SpeechRule::SelfIncrimination));
    }

    #[test]
    fn test_impostor_confession_rejected() {
        let mut set = LedgerSet::new(&make_roster(), rooms::STANDARD.iter().copied());
        let kill = GameEvent::new("evt_000001", 3, EventKind::Kill, PlayerId(0), rooms::REACTOR)
            .with_target(PlayerId(2));
        set.ingest_timestep(&[], &[kill]);

        let validator = make_validator();
        let truths = truths_for(&set, PlayerId(0));

        let verdict = validator.validate("Fine, I killed Green. What of it?", &truths);
        assert!(!verdict.accepted);
    }

    #[test]
    fn test_spatial_non_sequitur_penalized() {
        let validator = make_validator();
        let set = blue_in_admin_with_green();
        let truths = truths_for(&set, PlayerId(1));

        let verdict = validator.validate(
            "I was in admin, so you couldn't have been in electrical.",
            &truths,
        );

        assert!(verdict
            .matches
            .iter()
            .any(|m| m.rule == SpeechRule::SpatialNonSequitur));
    }

    #[test]
    fn test_filler_tiers() {
        let validator = make_validator();
        let set = blue_in_admin_with_green();
        let truths = truths_for(&set, PlayerId(1));

        let skip = validator.validate("Let's just skip this vote.", &truths);
        assert_eq!(skip.score, 1);

        let agree = validator.validate("I agree with Yellow.", &truths);
        assert_eq!(agree.score, 1);

        let unsure = validator.validate("I didn't see anything this round.", &truths);
        assert_eq!(unsure.score, 2);

        let generic = validator.validate("Hmm, that is strange.", &truths);
        assert_eq!(generic.score, 2);
        assert!(generic.accepted);
    }

    #[test]
    fn test_fallback_statements_always_pass() {
        let validator = make_validator();
        let set = blue_in_admin_with_green();

        for (id, is_impostor) in [(PlayerId(1), false), (PlayerId(0), true)] {
            let truths = truths_for(&set, id);
            let verdict = validator.validate(fallback_statement(is_impostor), &truths);
            assert!(verdict.accepted, "fallback must always score >= 0");
        }
    }

    #[test]
    fn test_correction_instruction_names_failure() {
        let validator = make_validator();
        let set = blue_in_admin_with_green();
        let truths = truths_for(&set, PlayerId(1));

        let verdict = validator.validate("I was in reactor.", &truths);
        let instruction = verdict.correction_instruction();
        assert!(instruction.contains("personally visited"));
    }
}
