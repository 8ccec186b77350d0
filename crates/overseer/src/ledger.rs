//! Ground-Truth Ledgers
//!
//! Per-agent line-of-sight records rebuilt from the authoritative game log.
//! A ledger holds only what its owner could physically know: rooms they
//! stood in, players they saw there, and crimes they witnessed first-hand.
//! Impostors additionally carry a deception ledger tracking the gap between
//! their claimed alibi and their true kill facts.
//!
//! Ledgers are rebuilt once per timestep before any agent cycle runs and
//! are read-only for the remainder of that timestep.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use deduction_events::{EventKind, GameEvent, PlayerId, PresenceRecord, Roster};

/// A crime the owner saw happen with their own eyes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WitnessedCrime {
    pub timestep: u64,
    pub kind: EventKind,
    pub actor: PlayerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub victim: Option<PlayerId>,
    pub room: String,
}

/// One entry of an impostor's fabricated alibi track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FakeAlibiEntry {
    pub timestep: u64,
    pub room: String,
    pub activity: String,
}

/// Claimed-story vs. true-kill bookkeeping, impostors only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeceptionLedger {
    /// Room the impostor publicly claims to have been in.
    pub claimed_alibi: Option<String>,
    /// Where the most recent kill actually happened.
    pub kill_room: Option<String>,
    /// Who the most recent kill victim was.
    pub kill_victim: Option<PlayerId>,
    /// Fabricated turn-by-turn story for meeting use.
    pub fake_track: Vec<FakeAlibiEntry>,
}

impl DeceptionLedger {
    /// Whether any fabricated claim has been recorded yet.
    pub fn has_claims(&self) -> bool {
        self.claimed_alibi.is_some() || self.kill_room.is_some() || !self.fake_track.is_empty()
    }
}

/// One presence entry retained verbatim for alibi construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlibiClaim {
    pub timestep: u64,
    pub room: String,
    pub witnesses: Vec<PlayerId>,
}

/// Outcome of cross-referencing another player's location claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimCheck {
    /// Owner was in the claimed room and saw the claimer there.
    Confirmed,
    /// Owner was in the claimed room and did not see the claimer.
    Refuted,
}

/// Line-of-sight facts for a single agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundTruthLedger {
    owner: PlayerId,
    rooms_visited: BTreeSet<String>,
    /// room -> players ever sighted there, with the timestep of each sighting
    co_occupants: BTreeMap<String, BTreeMap<PlayerId, Vec<u64>>>,
    /// timestep -> room the owner stood in
    room_at: BTreeMap<u64, String>,
    /// co-located timestep counts per other player
    co_sightings: BTreeMap<PlayerId, u64>,
    /// presence entries kept in arrival order for alibi construction
    presence_log: Vec<AlibiClaim>,
    witnessed_crimes: Vec<WitnessedCrime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deception: Option<DeceptionLedger>,
}

impl GroundTruthLedger {
    /// Creates an empty ledger. Impostors get a deception ledger.
    pub fn new(owner: PlayerId, is_impostor: bool) -> Self {
        Self {
            owner,
            rooms_visited: BTreeSet::new(),
            co_occupants: BTreeMap::new(),
            room_at: BTreeMap::new(),
            co_sightings: BTreeMap::new(),
            presence_log: Vec::new(),
            witnessed_crimes: Vec::new(),
            deception: is_impostor.then(DeceptionLedger::default),
        }
    }

    /// The agent this ledger belongs to.
    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Rooms the owner has physically stood in.
    pub fn rooms_visited(&self) -> &BTreeSet<String> {
        &self.rooms_visited
    }

    /// Whether the owner has ever been in the given room.
    pub fn visited(&self, room: &str) -> bool {
        self.rooms_visited.contains(room)
    }

    /// The room the owner was in at the given timestep, if recorded.
    pub fn room_at(&self, timestep: u64) -> Option<&str> {
        self.room_at.get(&timestep).map(String::as_str)
    }

    /// The owner's most recent presence entry.
    pub fn last_presence(&self) -> Option<&AlibiClaim> {
        self.presence_log.last()
    }

    /// Number of presence entries recorded so far.
    pub fn timesteps_recorded(&self) -> u64 {
        self.presence_log.len() as u64
    }

    /// Players the owner has seen in the given room, across all timesteps.
    pub fn players_seen_in(&self, room: &str) -> BTreeSet<PlayerId> {
        self.co_occupants
            .get(room)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    /// How many timesteps the owner has been co-located with the player.
    pub fn co_location_count(&self, other: PlayerId) -> u64 {
        self.co_sightings.get(&other).copied().unwrap_or(0)
    }

    /// Crimes witnessed first-hand, in observation order.
    pub fn witnessed_crimes(&self) -> &[WitnessedCrime] {
        &self.witnessed_crimes
    }

    /// Whether the owner has witnessed any kill or vent.
    pub fn has_witnessed_crime(&self) -> bool {
        !self.witnessed_crimes.is_empty()
    }

    /// Whether the owner has witnessed a kill.
    pub fn saw_kill(&self) -> bool {
        self.witnessed_crimes
            .iter()
            .any(|c| c.kind == EventKind::Kill)
    }

    /// Whether the owner has witnessed a vent.
    pub fn saw_vent(&self) -> bool {
        self.witnessed_crimes
            .iter()
            .any(|c| c.kind == EventKind::Vent)
    }

    /// Whether the owner holds any location data at all.
    pub fn has_location_data(&self) -> bool {
        !self.rooms_visited.is_empty()
    }

    /// The deception ledger, present for impostors only.
    pub fn deception(&self) -> Option<&DeceptionLedger> {
        self.deception.as_ref()
    }

    /// The last `max_entries` presence entries as structured alibi claims.
    pub fn alibi(&self, max_entries: usize) -> Vec<AlibiClaim> {
        let skip = self.presence_log.len().saturating_sub(max_entries);
        self.presence_log[skip..].to_vec()
    }

    /// Cross-references another player's location claim against own memory.
    ///
    /// Returns `None` when the owner has no information for that timestep
    /// or was elsewhere at the time.
    pub fn cross_reference(
        &self,
        claimer: PlayerId,
        claimed_room: &str,
        timestep: u64,
    ) -> Option<ClaimCheck> {
        let my_room = self.room_at.get(&timestep)?;
        if my_room != claimed_room {
            return None;
        }
        let seen = self
            .co_occupants
            .get(claimed_room)
            .and_then(|m| m.get(&claimer))
            .is_some_and(|ts| ts.contains(&timestep));
        Some(if seen {
            ClaimCheck::Confirmed
        } else {
            ClaimCheck::Refuted
        })
    }

    fn record_presence(&mut self, record: &PresenceRecord) {
        self.rooms_visited.insert(record.room.clone());
        self.room_at.insert(record.timestep, record.room.clone());
        let room_entry = self.co_occupants.entry(record.room.clone()).or_default();
        for &other in &record.others_seen {
            room_entry.entry(other).or_default().push(record.timestep);
            *self.co_sightings.entry(other).or_insert(0) += 1;
        }
        self.presence_log.push(AlibiClaim {
            timestep: record.timestep,
            room: record.room.clone(),
            witnesses: record.others_seen.clone(),
        });
    }

    fn record_witnessed_crime(&mut self, event: &GameEvent) {
        self.witnessed_crimes.push(WitnessedCrime {
            timestep: event.timestep,
            kind: event.kind,
            actor: event.actor,
            victim: event.target,
            room: event.room.clone(),
        });
    }
}

/// A data-integrity rejection raised while rebuilding ledgers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerWarning {
    pub timestep: u64,
    pub detail: String,
}

/// Arena of per-agent ledgers indexed by player id.
///
/// Rebuilt incrementally each timestep from the engine's event and
/// presence records; all other components read it immutably.
#[derive(Debug, Clone)]
pub struct LedgerSet {
    ledgers: Vec<GroundTruthLedger>,
    known_rooms: BTreeSet<String>,
    roster_len: usize,
}

impl LedgerSet {
    /// Creates one empty ledger per roster entry.
    pub fn new<R, I>(roster: &Roster, known_rooms: I) -> Self
    where
        R: Into<String>,
        I: IntoIterator<Item = R>,
    {
        let ledgers = roster
            .iter()
            .map(|p| GroundTruthLedger::new(p.id, p.role.is_impostor()))
            .collect();
        Self {
            ledgers,
            known_rooms: known_rooms.into_iter().map(Into::into).collect(),
            roster_len: roster.len(),
        }
    }

    /// The ledger for one agent.
    pub fn get(&self, id: PlayerId) -> Option<&GroundTruthLedger> {
        self.ledgers.get(id.index())
    }

    /// Ingests one timestep of presence and event records.
    ///
    /// Records referencing unknown players or rooms are rejected without
    /// mutating any ledger; each rejection is returned and logged as a
    /// data-integrity warning.
    pub fn ingest_timestep(
        &mut self,
        presence: &[PresenceRecord],
        events: &[GameEvent],
    ) -> Vec<LedgerWarning> {
        let mut warnings = Vec::new();

        for record in presence {
            if let Some(detail) = self.validate_presence(record) {
                tracing::warn!(timestep = record.timestep, %detail, "rejected presence record");
                warnings.push(LedgerWarning {
                    timestep: record.timestep,
                    detail,
                });
                continue;
            }
            self.ledgers[record.player.index()].record_presence(record);
        }

        for event in events {
            if let Some(detail) = self.validate_event(event) {
                tracing::warn!(timestep = event.timestep, %detail, "rejected game event");
                warnings.push(LedgerWarning {
                    timestep: event.timestep,
                    detail,
                });
                continue;
            }
            if event.kind.is_crime() {
                for &witness in &event.witnesses {
                    if witness != event.actor {
                        self.ledgers[witness.index()].record_witnessed_crime(event);
                    }
                }
            }
            // A kill updates the actor's own deception ledger.
            if event.kind == EventKind::Kill {
                if let Some(deception) = self.ledgers[event.actor.index()].deception.as_mut() {
                    deception.kill_room = Some(event.room.clone());
                    deception.kill_victim = event.target;
                }
            }
        }

        warnings
    }

    /// Records the alibi room an impostor has committed to claiming.
    ///
    /// Ignored for crewmates, who have no deception ledger.
    pub fn set_claimed_alibi(&mut self, agent: PlayerId, room: impl Into<String>) {
        if let Some(ledger) = self.ledgers.get_mut(agent.index()) {
            if let Some(deception) = ledger.deception.as_mut() {
                deception.claimed_alibi = Some(room.into());
            }
        }
    }

    /// Appends an entry to an impostor's fabricated alibi track.
    pub fn record_fake_alibi(&mut self, agent: PlayerId, entry: FakeAlibiEntry) {
        if let Some(ledger) = self.ledgers.get_mut(agent.index()) {
            if let Some(deception) = ledger.deception.as_mut() {
                deception.fake_track.push(entry);
            }
        }
    }

    fn known_player(&self, id: PlayerId) -> bool {
        id.index() < self.roster_len
    }

    fn validate_presence(&self, record: &PresenceRecord) -> Option<String> {
        if !self.known_player(record.player) {
            return Some(format!("unknown player {}", record.player));
        }
        if !self.known_rooms.contains(&record.room) {
            return Some(format!("unknown room '{}'", record.room));
        }
        for &other in &record.others_seen {
            if !self.known_player(other) {
                return Some(format!("unknown sighted player {}", other));
            }
        }
        None
    }

    fn validate_event(&self, event: &GameEvent) -> Option<String> {
        if !self.known_player(event.actor) {
            return Some(format!("unknown actor {}", event.actor));
        }
        if !self.known_rooms.contains(&event.room) {
            return Some(format!("unknown room '{}'", event.room));
        }
        if let Some(target) = event.target {
            if !self.known_player(target) {
                return Some(format!("unknown target {}", target));
            }
        }
        for &witness in &event.witnesses {
            if !self.known_player(witness) {
                return Some(format!("unknown witness {}", witness));
            }
        }
        None
    }
}
