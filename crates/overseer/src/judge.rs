//! Hallucination Judge
//!
//! Classifies a finalized statement against the applicable truth standard.
//! Crewmates are held to the ground-truth ledger with zero tolerance; any
//! mismatch between a checkable claim and the ledger is a hallucination.
//! Impostors are allowed to fabricate events and are checked only for
//! contradictions against their own prior statements. Runs once per
//! finalized statement and is never retried.

use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use deduction_events::{ChatHistory, PlayerId, Role, Roster};

use crate::ledger::GroundTruthLedger;

/// A checkable factual claim extracted from a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Claim {
    /// "I was in <room>"
    Location { room: String },
    /// "I saw ... in <room>" / "when I was in <room>"
    Observation { room: String },
    /// "I was with <player> in <room>"
    CoPresence { other: String, room: String },
}

/// Verdict on one finalized statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeVerdict {
    pub hallucination: bool,
    pub reasoning: String,
}

impl JudgeVerdict {
    fn ok(reasoning: impl Into<String>) -> Self {
        Self {
            hallucination: false,
            reasoning: reasoning.into(),
        }
    }

    fn hallucination(reasoning: impl Into<String>) -> Self {
        Self {
            hallucination: true,
            reasoning: reasoning.into(),
        }
    }
}

/// Judge construction failure.
#[derive(Debug)]
pub enum JudgeError {
    /// A claim-extraction pattern failed to compile.
    Pattern(regex::Error),
}

impl fmt::Display for JudgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JudgeError::Pattern(e) => write!(f, "Pattern error: {}", e),
        }
    }
}

impl std::error::Error for JudgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JudgeError::Pattern(e) => Some(e),
        }
    }
}

impl From<regex::Error> for JudgeError {
    fn from(e: regex::Error) -> Self {
        JudgeError::Pattern(e)
    }
}

/// The truthfulness judge.
pub struct Judge {
    location: Regex,
    observation: Vec<Regex>,
    co_presence: Regex,
    any_room: Regex,
}

impl Judge {
    /// Compiles claim-extraction patterns over the room catalogue.
    pub fn new(known_rooms: &[String]) -> Result<Self, JudgeError> {
        let mut escaped: Vec<String> = known_rooms
            .iter()
            .map(|r| regex::escape(&r.to_lowercase()))
            .collect();
        escaped.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let room_alt = format!("(?:{})", escaped.join("|"));

        Ok(Self {
            location: Regex::new(&format!(r"\bi was (?:in|at) ({})", room_alt))?,
            observation: vec![
                Regex::new(&format!(
                    r"\bi (?:saw|noticed|watched|witnessed) .+? (?:in|at) ({})",
                    room_alt
                ))?,
                Regex::new(&format!(r"\bwhen i was (?:in|at) ({})", room_alt))?,
            ],
            co_presence: Regex::new(&format!(
                r"\bi was with ([a-z0-9 ]+?) (?:in|at) ({})",
                room_alt
            ))?,
            any_room: Regex::new(&format!(r"\b({})\b", room_alt))?,
        })
    }

    /// Extracts the checkable claims from a statement.
    pub fn extract_claims(&self, statement: &str) -> Vec<Claim> {
        let text = normalize(statement);
        let mut claims = Vec::new();

        for caps in self.co_presence.captures_iter(&text) {
            claims.push(Claim::CoPresence {
                other: caps[1].trim().to_string(),
                room: caps[2].to_string(),
            });
        }
        for caps in self.location.captures_iter(&text) {
            claims.push(Claim::Location {
                room: caps[1].to_string(),
            });
        }
        for pattern in &self.observation {
            for caps in pattern.captures_iter(&text) {
                claims.push(Claim::Observation {
                    room: caps[1].to_string(),
                });
            }
        }

        claims
    }

    /// Classifies one finalized statement.
    pub fn classify(
        &self,
        statement: &str,
        speaker: PlayerId,
        role: Role,
        ledger: &GroundTruthLedger,
        history: &ChatHistory,
        roster: &Roster,
    ) -> JudgeVerdict {
        if statement.trim().is_empty() {
            return JudgeVerdict::ok("empty statement, nothing to check");
        }

        match role {
            Role::Crewmate => self.classify_crewmate(statement, ledger, roster),
            Role::Impostor => self.classify_impostor(statement, speaker, history),
        }
    }

    /// Crewmate standard: every claim must match the ledger exactly.
    fn classify_crewmate(
        &self,
        statement: &str,
        ledger: &GroundTruthLedger,
        roster: &Roster,
    ) -> JudgeVerdict {
        let claims = self.extract_claims(statement);
        if claims.is_empty() {
            return JudgeVerdict::ok("no checkable claims");
        }

        for claim in &claims {
            match claim {
                Claim::Location { room } | Claim::Observation { room } => {
                    if !ledger.visited(room) {
                        return JudgeVerdict::hallucination(format!(
                            "claimed to be in {} but the logs do not confirm this",
                            room
                        ));
                    }
                }
                Claim::CoPresence { other, room } => {
                    if !ledger.visited(room) {
                        return JudgeVerdict::hallucination(format!(
                            "claimed to be in {} but the logs do not confirm this",
                            room
                        ));
                    }
                    let confirmed = ledger.players_seen_in(room).into_iter().any(|id| {
                        roster
                            .name_of(id)
                            .is_some_and(|n| other.contains(&n.to_lowercase()))
                    });
                    if !confirmed {
                        return JudgeVerdict::hallucination(format!(
                            "claimed to be with {} in {} but never saw them there",
                            other, room
                        ));
                    }
                }
            }
        }

        JudgeVerdict::ok("statement is consistent with ground truth")
    }

    /// Impostor standard: fabrication is allowed, self-contradiction is not.
    fn classify_impostor(
        &self,
        statement: &str,
        speaker: PlayerId,
        history: &ChatHistory,
    ) -> JudgeVerdict {
        let current_rooms = self.rooms_mentioned(statement);
        if current_rooms.is_empty() {
            return JudgeVerdict::ok("no checkable claims");
        }

        let mut previous_rooms = BTreeSet::new();
        for prior in history.statements_by(speaker) {
            previous_rooms.extend(self.rooms_mentioned(prior));
        }
        if previous_rooms.is_empty() {
            return JudgeVerdict::ok("no prior statements to contradict");
        }

        if current_rooms.is_disjoint(&previous_rooms) {
            return JudgeVerdict::hallucination(
                "current statement contradicts previous claim about location",
            );
        }

        JudgeVerdict::ok("statement is self-consistent with prior claims")
    }

    fn rooms_mentioned(&self, statement: &str) -> BTreeSet<String> {
        let text = normalize(statement);
        self.any_room
            .captures_iter(&text)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

fn normalize(statement: &str) -> String {
    statement
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use deduction_events::{rooms, ChatMessage, PresenceRecord};

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

    fn make_judge() -> Judge {
        Judge::new(&standard_rooms()).unwrap()
    }

    fn blue_ledger() -> LedgerSet {
        let mut set = LedgerSet::new(&make_roster(), rooms::STANDARD.iter().copied());
        let presence = vec![
            PresenceRecord::new(1, PlayerId(1), rooms::CAFETERIA).with_others(vec![PlayerId(2)]),
            PresenceRecord::new(2, PlayerId(1), rooms::ADMIN).with_others(vec![PlayerId(0)]),
            PresenceRecord::new(3, PlayerId(1), rooms::STORAGE),
        ];
        set.ingest_timestep(&presence, &[]);
        set
    }

    #[test]
    fn test_crewmate_spatial_hallucination() {
        let judge = make_judge();
        let set = blue_ledger();
        let history = ChatHistory::new();

        let verdict = judge.classify(
            "I was in reactor doing my tasks.",
            PlayerId(1),
            Role::Crewmate,
            set.get(PlayerId(1)).unwrap(),
            &history,
            &make_roster(),
        );

        assert!(verdict.hallucination);
        assert!(verdict.reasoning.contains("reactor"));
    }

    #[test]
    fn test_crewmate_truthful_statement() {
        let judge = make_judge();
        let set = blue_ledger();
        let history = ChatHistory::new();

        let verdict = judge.classify(
            "I was in admin completing a task.",
            PlayerId(1),
            Role::Crewmate,
            set.get(PlayerId(1)).unwrap(),
            &history,
            &make_roster(),
        );

        assert!(!verdict.hallucination);
    }

    #[test]
    fn test_crewmate_false_co_presence() {
        let judge = make_judge();
        let set = blue_ledger();
        let history = ChatHistory::new();

        // Was in storage, but alone there.
        let verdict = judge.classify(
            "I was with yellow in storage.",
            PlayerId(1),
            Role::Crewmate,
            set.get(PlayerId(1)).unwrap(),
            &history,
            &make_roster(),
        );
        assert!(verdict.hallucination);

        // Really did see Green in the cafeteria.
        let confirmed = judge.classify(
            "I was with green in cafeteria.",
            PlayerId(1),
            Role::Crewmate,
            set.get(PlayerId(1)).unwrap(),
            &history,
            &make_roster(),
        );
        assert!(!confirmed.hallucination);
    }

    #[test]
    fn test_impostor_self_contradiction() {
        let judge = make_judge();
        let set = blue_ledger();

        let mut history = ChatHistory::new();
        history.push(ChatMessage::new(
            10,
            0,
            PlayerId(0),
            "I was in medbay doing a scan.",
        ));

        let verdict = judge.classify(
            "I was in admin the whole time.",
            PlayerId(0),
            Role::Impostor,
            set.get(PlayerId(0)).unwrap(),
            &history,
            &make_roster(),
        );

        assert!(verdict.hallucination);
    }

    #[test]
    fn test_impostor_consistent_lie_allowed() {
        let judge = make_judge();
        let set = blue_ledger();

        let mut history = ChatHistory::new();
        history.push(ChatMessage::new(
            10,
            0,
            PlayerId(0),
            "I was in medbay doing a scan.",
        ));

        // A lie, but consistent with the earlier lie.
        let verdict = judge.classify(
            "I finished my medbay scan and headed to cafeteria.",
            PlayerId(0),
            Role::Impostor,
            set.get(PlayerId(0)).unwrap(),
            &history,
            &make_roster(),
        );

        assert!(!verdict.hallucination);
    }

    #[test]
    fn test_impostor_first_statement_always_ok() {
        let judge = make_judge();
        let set = blue_ledger();
        let history = ChatHistory::new();

        let verdict = judge.classify(
            "I was in electrical fixing wires.",
            PlayerId(0),
            Role::Impostor,
            set.get(PlayerId(0)).unwrap(),
            &history,
            &make_roster(),
        );

        assert!(!verdict.hallucination);
    }

    #[test]
    fn test_no_claims_is_never_hallucination() {
        let judge = make_judge();
        let set = blue_ledger();
        let history = ChatHistory::new();

        for role in [Role::Crewmate, Role::Impostor] {
            let speaker = if role.is_impostor() {
                PlayerId(0)
            } else {
                PlayerId(1)
            };
            let verdict = judge.classify(
                "I think we should be careful this round.",
                speaker,
                role,
                set.get(speaker).unwrap(),
                &history,
                &make_roster(),
            );
            assert!(!verdict.hallucination);
        }
    }

    #[test]
    fn test_claim_extraction() {
        let judge = make_judge();
        let claims =
            judge.extract_claims("I was in admin, and when I was in storage I saw green leave.");

        assert!(claims.contains(&Claim::Location {
            room: "admin".to_string()
        }));
        assert!(claims.contains(&Claim::Observation {
            room: "storage".to_string()
        }));
    }
}
