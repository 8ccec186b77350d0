//! Scripted Demo Scenario
//!
//! A fixed five-player game driven entirely from canned data: one impostor
//! kill, a three-stage meeting, a deliberately hallucinated draft that the
//! validator has to bounce, and an ejection vote. Stands in for both the
//! game engine and the language-model layer.

use std::collections::HashMap;

use deduction_events::{
    rooms, EventKind, GameEvent, GameStateSnapshot, MeetingSnapshot, MeetingStage, PlayerId,
    PresenceRecord, Role, Roster,
};
use overseer::{ActionGenerator, AgentContext, GeneratedTurn, SpeechVerdict, VoteOutcome};
use overseer::reward::ActionOutcome;

pub const RED: PlayerId = PlayerId(0);
pub const BLUE: PlayerId = PlayerId(1);
pub const GREEN: PlayerId = PlayerId(2);
pub const YELLOW: PlayerId = PlayerId(3);
pub const PURPLE: PlayerId = PlayerId(4);

/// The demo roster: Red is the impostor.
pub fn roster() -> Roster {
    Roster::from_names([
        ("Red", Role::Impostor),
        ("Blue", Role::Crewmate),
        ("Green", Role::Crewmate),
        ("Yellow", Role::Crewmate),
        ("Purple", Role::Crewmate),
    ])
}

/// One engine timestep of the scripted game.
pub struct TimestepScript {
    pub snapshot: GameStateSnapshot,
    pub presence: Vec<PresenceRecord>,
    pub events: Vec<GameEvent>,
    /// Assign meeting roles before the agent cycles.
    pub assign_roles: bool,
    /// Player ejected after the cycles complete.
    pub eject_after: Option<PlayerId>,
    /// Cycle every roster member, ejected included (terminal payout).
    pub cycle_everyone: bool,
}

impl TimestepScript {
    fn new(snapshot: GameStateSnapshot) -> Self {
        Self {
            snapshot,
            presence: Vec::new(),
            events: Vec::new(),
            assign_roles: false,
            eject_after: None,
            cycle_everyone: false,
        }
    }
}

/// Replays canned turns keyed by (timestep, agent).
pub struct ScriptedGenerator {
    turns: HashMap<(u64, PlayerId), GeneratedTurn>,
    revisions: HashMap<(u64, PlayerId), Vec<String>>,
    cursors: HashMap<(u64, PlayerId), usize>,
    timestep: u64,
}

impl ScriptedGenerator {
    fn new() -> Self {
        Self {
            turns: HashMap::new(),
            revisions: HashMap::new(),
            cursors: HashMap::new(),
            timestep: 0,
        }
    }

    /// Points the generator at the timestep about to run.
    pub fn set_timestep(&mut self, timestep: u64) {
        self.timestep = timestep;
    }

    fn turn(&mut self, timestep: u64, agent: PlayerId, turn: GeneratedTurn) {
        self.turns.insert((timestep, agent), turn);
    }

    fn revision(&mut self, timestep: u64, agent: PlayerId, drafts: &[&str]) {
        self.revisions.insert(
            (timestep, agent),
            drafts.iter().map(|s| s.to_string()).collect(),
        );
    }
}

impl ActionGenerator for ScriptedGenerator {
    fn propose(&mut self, ctx: &AgentContext) -> GeneratedTurn {
        self.turns
            .get(&(self.timestep, ctx.agent))
            .cloned()
            .unwrap_or_default()
    }

    fn revise_speech(
        &mut self,
        ctx: &AgentContext,
        _rejected: &SpeechVerdict,
        _attempt: u32,
    ) -> Option<String> {
        let key = (self.timestep, ctx.agent);
        let cursor = self.cursors.entry(key).or_insert(0);
        let next = self.revisions.get(&key)?.get(*cursor).cloned();
        *cursor += 1;
        next
    }
}

fn speak(text: &str) -> GeneratedTurn {
    GeneratedTurn {
        speech: Some(text.to_string()),
        ..GeneratedTurn::default()
    }
}

fn act(kind: EventKind, witnesses: u32) -> GeneratedTurn {
    GeneratedTurn {
        action: Some(ActionOutcome::new(kind, witnesses)),
        ..GeneratedTurn::default()
    }
}

fn everyone_in(timestep: u64, room: &str, players: &[PlayerId]) -> Vec<PresenceRecord> {
    players
        .iter()
        .map(|&p| {
            let others = players.iter().copied().filter(|&o| o != p).collect();
            PresenceRecord::new(timestep, p, room).with_others(others)
        })
        .collect()
}

/// Builds the full scripted game and its generator.
pub fn build() -> (Vec<TimestepScript>, ScriptedGenerator) {
    let mut steps = Vec::new();
    let mut gen = ScriptedGenerator::new();

    // T1: everyone in the cafeteria. Yellow knocks out a task; Red fakes
    // one in plain sight.
    let mut t1 = TimestepScript::new(GameStateSnapshot::new(1, 4, 1).with_tasks(10.0));
    t1.presence = everyone_in(1, rooms::CAFETERIA, &[RED, BLUE, GREEN, YELLOW, PURPLE]);
    t1.events = vec![
        GameEvent::new("evt_000001", 1, EventKind::CompleteTask, YELLOW, rooms::CAFETERIA)
            .with_witnesses(vec![RED, BLUE, GREEN, PURPLE]),
        GameEvent::new("evt_000002", 1, EventKind::FakeTask, RED, rooms::CAFETERIA)
            .with_witnesses(vec![BLUE, GREEN, YELLOW, PURPLE]),
    ];
    gen.turn(1, YELLOW, act(EventKind::CompleteTask, 4));
    gen.turn(1, RED, act(EventKind::FakeTask, 4));
    gen.turn(1, BLUE, act(EventKind::Move, 0));
    gen.turn(1, GREEN, act(EventKind::Move, 0));
    gen.turn(1, PURPLE, act(EventKind::Move, 0));
    steps.push(t1);

    // T2: the group splits. Blue does the admin wires; Yellow works
    // storage; Green follows Red toward the reactor.
    let mut t2 = TimestepScript::new(GameStateSnapshot::new(2, 4, 1).with_tasks(25.0));
    t2.presence = vec![
        PresenceRecord::new(2, RED, rooms::REACTOR).with_others(vec![GREEN]),
        PresenceRecord::new(2, GREEN, rooms::REACTOR).with_others(vec![RED]),
        PresenceRecord::new(2, BLUE, rooms::ADMIN),
        PresenceRecord::new(2, YELLOW, rooms::STORAGE),
        PresenceRecord::new(2, PURPLE, rooms::CAFETERIA),
    ];
    t2.events = vec![
        GameEvent::new("evt_000003", 2, EventKind::VisualTask, BLUE, rooms::ADMIN),
        GameEvent::new("evt_000004", 2, EventKind::CompleteTask, YELLOW, rooms::STORAGE),
    ];
    gen.turn(2, BLUE, act(EventKind::CompleteTask, 0));
    gen.turn(2, YELLOW, act(EventKind::CompleteTask, 0));
    gen.turn(2, RED, act(EventKind::Move, 0));
    gen.turn(2, GREEN, act(EventKind::Move, 0));
    gen.turn(2, PURPLE, act(EventKind::Move, 0));
    steps.push(t2);

    // T3: Red kills Green alone in the reactor and commits to a medbay
    // alibi. The game drops into Critical State.
    let mut t3 = TimestepScript::new(GameStateSnapshot::new(3, 3, 1).with_tasks(40.0));
    t3.presence = vec![
        PresenceRecord::new(3, RED, rooms::REACTOR).with_others(vec![GREEN]),
        PresenceRecord::new(3, GREEN, rooms::REACTOR).with_others(vec![RED]),
        PresenceRecord::new(3, BLUE, rooms::ADMIN),
        PresenceRecord::new(3, YELLOW, rooms::STORAGE),
        PresenceRecord::new(3, PURPLE, rooms::CAFETERIA),
    ];
    t3.events = vec![GameEvent::new(
        "evt_000005",
        3,
        EventKind::Kill,
        RED,
        rooms::REACTOR,
    )
    .with_target(GREEN)];
    gen.turn(
        3,
        RED,
        GeneratedTurn {
            action: Some(ActionOutcome::new(EventKind::Kill, 0)),
            claimed_alibi: Some(rooms::MEDBAY.to_string()),
            ..GeneratedTurn::default()
        },
    );
    gen.turn(3, GREEN, act(EventKind::Die, 0));
    gen.turn(3, BLUE, act(EventKind::CompleteTask, 0));
    gen.turn(3, YELLOW, act(EventKind::Move, 0));
    gen.turn(3, PURPLE, act(EventKind::Move, 0));
    steps.push(t3);

    // T4: Yellow finds the body and reports. Testimony round: Blue's
    // first draft claims sight of an unvisited room and gets bounced.
    let mut t4 = TimestepScript::new(
        GameStateSnapshot::new(4, 3, 1)
            .with_tasks(40.0)
            .with_meeting(MeetingSnapshot::new(0, MeetingStage::Testimony)),
    );
    t4.presence = vec![
        PresenceRecord::new(4, RED, rooms::CAFETERIA).with_others(vec![BLUE, PURPLE]),
        PresenceRecord::new(4, BLUE, rooms::CAFETERIA).with_others(vec![RED, PURPLE]),
        PresenceRecord::new(4, YELLOW, rooms::REACTOR),
        PresenceRecord::new(4, PURPLE, rooms::CAFETERIA).with_others(vec![RED, BLUE]),
    ];
    t4.events = vec![GameEvent::new(
        "evt_000006",
        4,
        EventKind::ReportBody,
        YELLOW,
        rooms::REACTOR,
    )];
    t4.assign_roles = true;
    gen.turn(
        4,
        RED,
        GeneratedTurn {
            speech: Some("I was in medbay doing my scan.".to_string()),
            lie_success: true,
            ..GeneratedTurn::default()
        },
    );
    gen.turn(4, BLUE, speak("I saw someone in electrical earlier."));
    gen.revision(4, BLUE, &["I was in admin doing the wires task."]);
    gen.turn(
        4,
        YELLOW,
        GeneratedTurn {
            action: Some(ActionOutcome::new(EventKind::ReportBody, 0)),
            speech: Some("I found the body in reactor, it was still warm.".to_string()),
            ..GeneratedTurn::default()
        },
    );
    gen.turn(4, PURPLE, speak("I have no information to share yet."));
    steps.push(t4);

    // T5: accusation round. Blue challenges the medbay story; Red is now
    // the accused and has to defend.
    let mut meeting5 = MeetingSnapshot::new(1, MeetingStage::Accusation);
    meeting5.accuse(RED);
    let mut t5 = TimestepScript::new(
        GameStateSnapshot::new(5, 3, 1)
            .with_tasks(40.0)
            .with_meeting(meeting5),
    );
    t5.presence = everyone_in(5, rooms::CAFETERIA, &[RED, BLUE, YELLOW, PURPLE]);
    t5.assign_roles = true;
    gen.turn(
        5,
        RED,
        speak("I was in medbay the whole time, ask anyone."),
    );
    gen.turn(
        5,
        BLUE,
        speak("How did you get from medbay to reactor so fast, Red? Did you vent?"),
    );
    gen.turn(5, YELLOW, speak("I saw Red heading toward the reactor side earlier."));
    gen.turn(5, PURPLE, speak("I agree with Blue, something is off."));
    steps.push(t5);

    // T6: final arguments and the vote. Red throws a frame vote at
    // Yellow; the crew converges on Red.
    let mut meeting6 = MeetingSnapshot::new(2, MeetingStage::FinalArguments);
    meeting6.accuse(RED);
    let mut t6 = TimestepScript::new(
        GameStateSnapshot::new(6, 3, 1)
            .with_tasks(40.0)
            .with_meeting(meeting6),
    );
    t6.presence = everyone_in(6, rooms::CAFETERIA, &[RED, BLUE, YELLOW, PURPLE]);
    t6.assign_roles = true;
    t6.eject_after = Some(RED);
    gen.turn(
        6,
        RED,
        GeneratedTurn {
            speech: Some("I'll say it again, I was in medbay.".to_string()),
            vote: Some(VoteOutcome {
                target: YELLOW,
                target_role: Role::Crewmate,
            }),
            lie_refuted: true,
            ..GeneratedTurn::default()
        },
    );
    gen.turn(
        6,
        BLUE,
        GeneratedTurn {
            speech: Some("I'm voting Red, the medbay story does not add up.".to_string()),
            vote: Some(VoteOutcome {
                target: RED,
                target_role: Role::Impostor,
            }),
            ..GeneratedTurn::default()
        },
    );
    gen.turn(
        6,
        YELLOW,
        GeneratedTurn {
            speech: Some("Voting Red as well.".to_string()),
            vote: Some(VoteOutcome {
                target: RED,
                target_role: Role::Impostor,
            }),
            ..GeneratedTurn::default()
        },
    );
    gen.turn(
        6,
        PURPLE,
        GeneratedTurn {
            speech: Some("Red it is.".to_string()),
            vote: Some(VoteOutcome {
                target: RED,
                target_role: Role::Impostor,
            }),
            ..GeneratedTurn::default()
        },
    );
    steps.push(t6);

    // T7: the impostor is gone; terminal payout for everyone.
    let mut t7 =
        TimestepScript::new(GameStateSnapshot::new(7, 3, 0).with_tasks(40.0).with_winner(Role::Crewmate));
    t7.cycle_everyone = true;
    steps.push(t7);

    (steps, gen)
}
