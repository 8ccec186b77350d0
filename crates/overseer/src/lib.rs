//! Decision-support and evaluation layer for a five-agent social-deduction
//! game.
//!
//! The overseer sits between the game-state engine and a language-model
//! action generator. It watches the authoritative event log and per-turn
//! snapshots, then supplies the generator with role-specific context and
//! holds its output to account: belief maintenance, state-value
//! estimation, speech validation, hallucination judging, kill-risk
//! ranking, reward computation, and discussion-role assignment.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  events + snapshots  ┌──────────┐  context / verdicts
//! │ game engine │ ───────────────────▶ │ overseer │ ◀──────────────────▶ generator
//! └─────────────┘                      └──────────┘      rewards.jsonl
//! ```
//!
//! # Modules
//!
//! - [`ledger`]: per-agent line-of-sight ground truth
//! - [`belief`]: suspicion / threat matrices
//! - [`critic`]: team win-probability estimation
//! - [`reward`]: priority-ordered turn rewards
//! - [`reward_log`]: append-only JSONL reward records
//! - [`speech`]: pre-commit speech scoring gate
//! - [`judge`]: post-commit hallucination classification
//! - [`risk`]: kill-target risk ranking
//! - [`roles`]: per-round discussion role assignment
//! - [`context`]: composed generator context
//! - [`config`]: TOML-backed settings

pub mod belief;
pub mod config;
pub mod context;
pub mod critic;
pub mod judge;
pub mod ledger;
pub mod reward;
pub mod reward_log;
pub mod risk;
pub mod roles;
pub mod speech;

// Re-export belief types
pub use belief::{clamp_unit, update_rules, BeliefError, BeliefMatrix, BeliefModel, BeliefUpdate};

// Re-export config types
pub use config::{default_config_toml, ConfigError, GeneralConfig, OverseerConfig, TomlSerializeError};

// Re-export context types
pub use context::{danger_score, danger_weights, AgentContext};

// Re-export critic types
pub use critic::{value_weights, HeuristicCritic, TeamValue, ValueEstimator};

// Re-export judge types
pub use judge::{Claim, Judge, JudgeError, JudgeVerdict};

// Re-export ledger types
pub use ledger::{
    AlibiClaim, ClaimCheck, DeceptionLedger, FakeAlibiEntry, GroundTruthLedger, LedgerSet,
    LedgerWarning, WitnessedCrime,
};

// Re-export reward types
pub use reward::{
    is_critical_state, reward_table, ActionOutcome, RewardCategory, RewardComponent, RewardEngine,
    TurnOutcome, TurnReward, VoteOutcome,
};
pub use reward_log::{RewardLog, RewardRecord};

// Re-export risk types
pub use risk::{risk_weights, RiskMatrix, TargetRisk};

// Re-export role types
pub use roles::{MeetingRole, RoleAssigner, RoleAssignment, SpeakingStyle};

// Re-export speech types
pub use speech::{
    fallback_statement, RuleMatch, SpeechError, SpeechRule, SpeechValidator, SpeechVerdict,
    SpeechWeights, TruthTable,
};

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use deduction_events::{
    ChatHistory, ChatMessage, EventKind, GameEvent, GameStateSnapshot, PlayerId, PresenceRecord,
    Roster,
};

/// Errors that can occur in Overseer operations.
#[derive(Debug)]
pub enum OverseerError {
    /// Error loading configuration
    Config(ConfigError),
    /// Error building the speech validator
    Speech(SpeechError),
    /// Error building the judge
    Judge(JudgeError),
    /// Referenced player is not on the roster
    UnknownPlayer(PlayerId),
    /// No timestep has been started yet
    NoActiveTimestep,
    /// The current snapshot carries no meeting
    NoMeeting,
    /// Reward log IO failure
    Io(std::io::Error),
}

impl fmt::Display for OverseerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverseerError::Config(e) => write!(f, "Config error: {}", e),
            OverseerError::Speech(e) => write!(f, "Speech validator error: {}", e),
            OverseerError::Judge(e) => write!(f, "Judge error: {}", e),
            OverseerError::UnknownPlayer(id) => write!(f, "Unknown player {}", id),
            OverseerError::NoActiveTimestep => write!(f, "No active timestep"),
            OverseerError::NoMeeting => write!(f, "No meeting in progress"),
            OverseerError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for OverseerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OverseerError::Config(e) => Some(e),
            OverseerError::Speech(e) => Some(e),
            OverseerError::Judge(e) => Some(e),
            OverseerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for OverseerError {
    fn from(e: ConfigError) -> Self {
        OverseerError::Config(e)
    }
}

impl From<SpeechError> for OverseerError {
    fn from(e: SpeechError) -> Self {
        OverseerError::Speech(e)
    }
}

impl From<JudgeError> for OverseerError {
    fn from(e: JudgeError) -> Self {
        OverseerError::Judge(e)
    }
}

impl From<std::io::Error> for OverseerError {
    fn from(e: std::io::Error) -> Self {
        OverseerError::Io(e)
    }
}

/// One turn's worth of generator output, plus the engine-resolved facts
/// the reward tables need.
#[derive(Debug, Clone, Default)]
pub struct GeneratedTurn {
    /// Executed action and its witness count.
    pub action: Option<ActionOutcome>,
    /// Candidate speech, validated before commit.
    pub speech: Option<String>,
    /// Alibi room an impostor commits to claiming this turn.
    pub claimed_alibi: Option<String>,
    /// Vote cast, with the target's confirmed role.
    pub vote: Option<VoteOutcome>,
    /// Impostor survived an ejection vote this turn.
    pub survived_vote: bool,
    /// Impostor lie went unchallenged this turn.
    pub lie_success: bool,
    /// Impostor lie was refuted this turn.
    pub lie_refuted: bool,
}

/// The external action-generation layer.
///
/// The overseer never builds prompts or parses model output; it hands the
/// generator a composed context and receives well-formed turns back.
pub trait ActionGenerator {
    /// Produces a candidate turn for the agent.
    fn propose(&mut self, ctx: &AgentContext) -> GeneratedTurn;

    /// Produces a replacement draft after a rejection, or `None` to give
    /// up early. `attempt` counts retries starting at 1.
    fn revise_speech(
        &mut self,
        ctx: &AgentContext,
        rejected: &SpeechVerdict,
        attempt: u32,
    ) -> Option<String>;
}

/// Everything the overseer concluded about one agent turn.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub agent: PlayerId,
    pub timestep: u64,
    /// Statement that entered the game, if the agent spoke.
    pub committed_speech: Option<String>,
    /// Verdict on the committed statement.
    pub speech_verdict: Option<SpeechVerdict>,
    /// Drafts scored, including the first.
    pub speech_attempts: u32,
    /// Whether the retry budget ran out and the safe default was used.
    pub used_fallback: bool,
    pub judge_verdict: Option<JudgeVerdict>,
    pub belief_updates: Vec<BeliefUpdate>,
    pub reward: TurnReward,
}

/// The orchestrator driving one agent-turn cycle at a time.
///
/// Single-threaded and turn-sequential: ledgers rebuild once per timestep
/// before any agent cycle, agents run in ascending id order, and nothing
/// here shares mutable state across agents.
pub struct Overseer {
    config: OverseerConfig,
    roster: Roster,
    ledgers: LedgerSet,
    beliefs: Vec<BeliefModel>,
    critic: Box<dyn ValueEstimator>,
    engine: RewardEngine,
    validator: SpeechValidator,
    judge: Judge,
    risk: RiskMatrix,
    assigner: RoleAssigner,
    chat: ChatHistory,
    reward_log: RewardLog,
    alive: Vec<bool>,
    ejected: Vec<bool>,
    snapshot: Option<GameStateSnapshot>,
    events: Vec<GameEvent>,
    current_assignments: BTreeMap<PlayerId, RoleAssignment>,
}

impl Overseer {
    /// Creates an overseer for the given roster. Rewards are discarded
    /// until [`Overseer::with_reward_log`] attaches a file.
    pub fn new(config: OverseerConfig, roster: Roster) -> Result<Self, OverseerError> {
        let validator = SpeechValidator::new(config.speech.clone(), &config.rooms, &roster)?;
        let judge = Judge::new(&config.rooms)?;
        let ledgers = LedgerSet::new(&roster, config.rooms.iter().cloned());
        let beliefs = roster
            .iter()
            .map(|p| BeliefModel::new(p.id, p.role, &roster))
            .collect();
        let assigner = RoleAssigner::with_seed(config.general.rng_seed);
        let player_count = roster.len();

        Ok(Self {
            config,
            roster,
            ledgers,
            beliefs,
            critic: Box::new(HeuristicCritic::new()),
            engine: RewardEngine::new(),
            validator,
            judge,
            risk: RiskMatrix::new(),
            assigner,
            chat: ChatHistory::new(),
            reward_log: RewardLog::null(),
            alive: vec![true; player_count],
            ejected: vec![false; player_count],
            snapshot: None,
            events: Vec::new(),
            current_assignments: BTreeMap::new(),
        })
    }

    /// Attaches a JSONL reward log.
    pub fn with_reward_log(mut self, path: impl AsRef<Path>) -> Result<Self, OverseerError> {
        self.reward_log = RewardLog::new(path)?;
        Ok(self)
    }

    /// Swaps the value estimator.
    pub fn with_critic(mut self, critic: Box<dyn ValueEstimator>) -> Self {
        self.critic = critic;
        self
    }

    /// Ingests one timestep of engine output, rebuilding ledgers and
    /// aliveness before any agent cycle runs.
    pub fn begin_timestep(
        &mut self,
        snapshot: GameStateSnapshot,
        presence: &[PresenceRecord],
        events: &[GameEvent],
    ) -> Vec<LedgerWarning> {
        let warnings = self.ledgers.ingest_timestep(presence, events);

        for event in events {
            match event.kind {
                EventKind::Kill => {
                    if let Some(target) = event.target {
                        if let Some(flag) = self.alive.get_mut(target.index()) {
                            *flag = false;
                        }
                    }
                }
                EventKind::Die => {
                    if let Some(flag) = self.alive.get_mut(event.actor.index()) {
                        *flag = false;
                    }
                }
                _ => {}
            }
        }

        if snapshot.meeting.is_none() {
            self.current_assignments.clear();
        }
        self.snapshot = Some(snapshot);
        self.events = events.to_vec();
        warnings
    }

    /// Marks a player as voted out.
    pub fn record_ejection(&mut self, agent: PlayerId) {
        if let Some(flag) = self.alive.get_mut(agent.index()) {
            *flag = false;
        }
        if let Some(flag) = self.ejected.get_mut(agent.index()) {
            *flag = true;
        }
    }

    /// Whether the player is still alive.
    pub fn is_alive(&self, agent: PlayerId) -> bool {
        self.alive.get(agent.index()).copied().unwrap_or(false)
    }

    /// Living players in ascending id order.
    pub fn living_players(&self) -> Vec<PlayerId> {
        self.roster
            .ids()
            .filter(|id| self.is_alive(*id))
            .collect()
    }

    /// Players still in the game (alive or ghosting, not ejected), in
    /// cycle order.
    pub fn active_players(&self) -> Vec<PlayerId> {
        self.roster
            .ids()
            .filter(|id| !self.ejected.get(id.index()).copied().unwrap_or(true))
            .collect()
    }

    /// The belief matrix of one agent, for logging and visualization.
    pub fn belief_matrix(&self, agent: PlayerId) -> Option<&BeliefMatrix> {
        self.beliefs.get(agent.index()).map(|m| m.matrix())
    }

    /// One agent's ground-truth ledger.
    pub fn ledger(&self, agent: PlayerId) -> Option<&GroundTruthLedger> {
        self.ledgers.get(agent)
    }

    /// The committed chat transcript.
    pub fn chat(&self) -> &ChatHistory {
        &self.chat
    }

    /// The reward log session id.
    pub fn reward_session(&self) -> uuid::Uuid {
        self.reward_log.session()
    }

    /// Composes the role-specific overlay context for one agent.
    pub fn compose_context(&self, agent: PlayerId) -> Result<AgentContext, OverseerError> {
        let info = self
            .roster
            .get(agent)
            .ok_or(OverseerError::UnknownPlayer(agent))?;
        let snapshot = self.snapshot.as_ref().ok_or(OverseerError::NoActiveTimestep)?;
        let team_value = self.critic.value(snapshot).for_role(info.role);

        if !self.is_alive(agent) {
            return Ok(AgentContext::for_dead(agent, info.role, team_value));
        }

        let ledger = self
            .ledgers
            .get(agent)
            .ok_or(OverseerError::UnknownPlayer(agent))?;
        let belief = self.beliefs[agent.index()].matrix().clone();

        let kill_risk = if info.role.is_impostor() {
            self.kill_risk_for(agent, ledger)
        } else {
            None
        };

        let danger = if info.role.is_impostor() {
            None
        } else {
            let body_in_room = self.events.iter().any(|e| {
                e.kind == EventKind::Kill && ledger.room_at(e.timestep) == Some(e.room.as_str())
            });
            Some(context::danger_score(
                info.role,
                true,
                snapshot,
                ledger,
                &belief,
                body_in_room,
            ))
        };

        let meeting = if snapshot.meeting.is_some() {
            self.current_assignments.get(&agent).copied()
        } else {
            None
        };

        Ok(AgentContext {
            agent,
            role: info.role,
            alive: true,
            team_value,
            belief: Some(belief),
            kill_risk,
            meeting,
            danger_score: danger,
            alibi: ledger.alibi(self.config.general.alibi_entries),
            movement_unrestricted: false,
        })
    }

    fn kill_risk_for(&self, agent: PlayerId, ledger: &GroundTruthLedger) -> Option<Vec<TargetRisk>> {
        let presence = ledger.last_presence()?;
        let candidates: Vec<PlayerId> = presence
            .witnesses
            .iter()
            .copied()
            .filter(|&other| {
                self.is_alive(other)
                    && self
                        .roster
                        .role_of(other)
                        .map(|r| !r.is_impostor())
                        .unwrap_or(false)
                    && other != agent
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let vent_reachable = self.config.has_vent(&presence.room);
        Some(self.risk.rank(&candidates, vent_reachable, ledger))
    }

    /// Assigns roles and styles to every living agent for the current
    /// meeting stage. Call once at the start of each stage.
    pub fn assign_meeting_roles(
        &mut self,
    ) -> Result<BTreeMap<PlayerId, RoleAssignment>, OverseerError> {
        let snapshot = self.snapshot.as_ref().ok_or(OverseerError::NoActiveTimestep)?;
        let meeting = snapshot.meeting.clone().ok_or(OverseerError::NoMeeting)?;
        let living = self.living_players();

        let assignments = self
            .assigner
            .assign_round(&self.roster, &living, &meeting, &self.ledgers);
        self.current_assignments = assignments.clone();
        Ok(assignments)
    }

    /// Runs one full agent-turn cycle: context, generation, speech
    /// validation, judging, belief updates, and reward resolution.
    pub fn agent_cycle(
        &mut self,
        agent: PlayerId,
        generator: &mut dyn ActionGenerator,
    ) -> Result<TurnReport, OverseerError> {
        let info = self
            .roster
            .get(agent)
            .cloned()
            .ok_or(OverseerError::UnknownPlayer(agent))?;
        let snapshot = self
            .snapshot
            .clone()
            .ok_or(OverseerError::NoActiveTimestep)?;
        let alive = self.is_alive(agent);

        let ctx = self.compose_context(agent)?;
        let mut generated = generator.propose(&ctx);

        if let Some(room) = generated.claimed_alibi.take() {
            self.ledgers.set_claimed_alibi(agent, room);
        }

        // Speech gate: score, regenerate on rejection, fall back when the
        // retry budget runs out. Dead agents do not speak.
        let mut committed_speech = None;
        let mut speech_verdict = None;
        let mut speech_attempts = 0;
        let mut used_fallback = false;

        if alive {
            if let Some(draft) = generated.speech.take() {
                let (speech, verdict, attempts, fallback) =
                    self.gate_speech(agent, &info, &ctx, draft, generator)?;
                committed_speech = Some(speech);
                speech_verdict = Some(verdict);
                speech_attempts = attempts;
                used_fallback = fallback;
            }
        }

        // Judge the finalized statement once; verdicts are never retried.
        let judge_verdict = match &committed_speech {
            Some(statement) => {
                let ledger = self
                    .ledgers
                    .get(agent)
                    .ok_or(OverseerError::UnknownPlayer(agent))?;
                Some(self.judge.classify(
                    statement,
                    agent,
                    info.role,
                    ledger,
                    &self.chat,
                    &self.roster,
                ))
            }
            None => None,
        };

        if let Some(statement) = &committed_speech {
            let round = snapshot.meeting.as_ref().map(|m| m.round).unwrap_or(0);
            self.chat.push(ChatMessage::new(
                snapshot.timestep,
                round,
                agent,
                statement.clone(),
            ));
        }

        // Belief refresh over this timestep's witnessed events.
        let mut belief_updates = Vec::new();
        {
            let ledger = self
                .ledgers
                .get(agent)
                .ok_or(OverseerError::UnknownPlayer(agent))?;
            let model = self
                .beliefs
                .get_mut(agent.index())
                .ok_or(OverseerError::UnknownPlayer(agent))?;
            for event in &self.events {
                match model.observe(event, ledger) {
                    Ok(mut updates) => belief_updates.append(&mut updates),
                    Err(e) => {
                        tracing::warn!(agent = %agent, error = %e, "belief update rejected");
                    }
                }
            }
        }

        let outcome = TurnOutcome {
            action: generated.action,
            hallucination: judge_verdict
                .as_ref()
                .map(|v| v.hallucination)
                .unwrap_or(false),
            lie_success: generated.lie_success,
            lie_refuted: generated.lie_refuted,
            vote: generated.vote,
            survived_vote: generated.survived_vote,
        };
        let reward = self.engine.resolve(info.role, alive, &snapshot, &outcome);
        self.reward_log
            .append_turn(agent, snapshot.timestep, &reward)?;

        Ok(TurnReport {
            agent,
            timestep: snapshot.timestep,
            committed_speech,
            speech_verdict,
            speech_attempts,
            used_fallback,
            judge_verdict,
            belief_updates,
            reward,
        })
    }

    /// Runs the agent cycle for every non-ejected player in id order.
    pub fn run_cycles(
        &mut self,
        generator: &mut dyn ActionGenerator,
    ) -> Result<Vec<TurnReport>, OverseerError> {
        let mut reports = Vec::new();
        for agent in self.active_players() {
            reports.push(self.agent_cycle(agent, generator)?);
        }
        Ok(reports)
    }

    fn gate_speech(
        &self,
        agent: PlayerId,
        info: &deduction_events::PlayerInfo,
        ctx: &AgentContext,
        draft: String,
        generator: &mut dyn ActionGenerator,
    ) -> Result<(String, SpeechVerdict, u32, bool), OverseerError> {
        let ledger = self
            .ledgers
            .get(agent)
            .ok_or(OverseerError::UnknownPlayer(agent))?;
        let truths = TruthTable::build(ledger, &self.roster);
        let budget = self.config.general.speech_retry_budget;

        let mut best_speech = draft;
        let mut best = self.validator.validate(&best_speech, &truths);
        let mut last = best.clone();
        let mut attempts = 1;

        let mut retry = 1;
        while !best.accepted && retry <= budget {
            let Some(revised) = generator.revise_speech(ctx, &last, retry) else {
                break;
            };
            let verdict = self.validator.validate(&revised, &truths);
            attempts += 1;
            retry += 1;
            if verdict.score > best.score {
                best = verdict.clone();
                best_speech = revised;
            }
            let accepted = verdict.accepted;
            last = verdict;
            if accepted {
                break;
            }
        }

        if best.accepted {
            return Ok((best_speech, best, attempts, false));
        }

        // Budget exhausted: commit the pre-scored safe default instead of
        // an unscored statement.
        tracing::warn!(agent = %agent, score = best.score, "speech retries exhausted, using fallback");
        let fallback = fallback_statement(info.role.is_impostor());
        let verdict = self.validator.validate(fallback, &truths);
        Ok((fallback.to_string(), verdict, attempts, true))
    }
}
