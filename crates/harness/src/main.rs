//! Overseer demo harness
//!
//! Drives a fully scripted five-agent game through the overseer with a
//! canned stand-in for the action-generation layer, then prints reward
//! totals, belief matrices, and the committed transcript.
//!
//! Run with: cargo run -p harness
//!
//! Examples:
//!   cargo run -p harness -- --seed 7
//!   cargo run -p harness -- --output-dir /tmp/demo

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;

use deduction_events::PlayerId;
use overseer::{Overseer, OverseerConfig, TurnReport};

mod scenario;

/// Scripted demo of the deduction overseer
#[derive(Parser, Debug)]
#[command(name = "overseer-demo")]
#[command(about = "Runs a scripted five-agent game through the overseer")]
struct Args {
    /// Seed for the role assigner's rng
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Directory for the reward log
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Optional TOML config path
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => OverseerConfig::from_file(path)?,
        None => OverseerConfig::default(),
    };
    config.general.rng_seed = args.seed;

    std::fs::create_dir_all(&args.output_dir)?;
    let reward_path = args.output_dir.join("rewards.jsonl");

    let roster = scenario::roster();
    let mut overseer = Overseer::new(config, roster.clone())?.with_reward_log(&reward_path)?;

    let (steps, mut generator) = scenario::build();
    let mut totals: BTreeMap<PlayerId, f32> = BTreeMap::new();

    for step in steps {
        let timestep = step.snapshot.timestep;
        generator.set_timestep(timestep);

        let warnings = overseer.begin_timestep(step.snapshot.clone(), &step.presence, &step.events);
        for warning in &warnings {
            tracing::warn!(timestep, detail = %warning.detail, "data integrity warning");
        }

        if step.assign_roles {
            let assignments = overseer.assign_meeting_roles()?;
            for (agent, assignment) in &assignments {
                let name = roster.name_of(*agent).unwrap_or("?");
                tracing::info!(
                    timestep,
                    agent = name,
                    role = ?assignment.role,
                    style = ?assignment.style,
                    "meeting role assigned"
                );
            }
        }

        let reports = if step.cycle_everyone {
            let mut all = Vec::new();
            for agent in roster.ids() {
                all.push(overseer.agent_cycle(agent, &mut generator)?);
            }
            all
        } else {
            overseer.run_cycles(&mut generator)?
        };

        for report in &reports {
            print_report(&roster, report);
            *totals.entry(report.agent).or_insert(0.0) += report.reward.total;
        }

        if let Some(ejected) = step.eject_after {
            tracing::info!(timestep, agent = roster.name_of(ejected).unwrap_or("?"), "ejected");
            overseer.record_ejection(ejected);
        }
    }

    println!("\n=== Reward totals (session {}) ===", overseer.reward_session());
    for (agent, total) in &totals {
        println!("  {:<8} {:+8.1}", roster.name_of(*agent).unwrap_or("?"), total);
    }

    println!("\n=== Final belief matrices ===");
    for info in roster.iter() {
        if let Some(matrix) = overseer.belief_matrix(info.id) {
            let entries: Vec<String> = matrix
                .iter()
                .map(|(id, v)| format!("{}={:.2}", roster.name_of(id).unwrap_or("?"), v))
                .collect();
            println!("  {:<8} {}", info.name, entries.join("  "));
        }
    }

    println!("\n=== Transcript ===");
    for message in overseer.chat().messages() {
        println!(
            "  [T{} r{}] {}: {}",
            message.timestep,
            message.round,
            roster.name_of(message.speaker).unwrap_or("?"),
            message.text
        );
    }

    // Dump the final belief matrices for offline inspection.
    let beliefs: BTreeMap<String, &overseer::BeliefMatrix> = roster
        .iter()
        .filter_map(|info| {
            overseer
                .belief_matrix(info.id)
                .map(|m| (info.name.clone(), m))
        })
        .collect();
    let belief_path = args.output_dir.join("beliefs.json");
    std::fs::write(&belief_path, serde_json::to_string_pretty(&beliefs)?)?;

    println!(
        "\nReward log written to {}; beliefs to {}",
        reward_path.display(),
        belief_path.display()
    );
    Ok(())
}

fn print_report(roster: &deduction_events::Roster, report: &TurnReport) {
    let name = roster.name_of(report.agent).unwrap_or("?");
    let speech_note = match (&report.committed_speech, report.used_fallback) {
        (Some(_), true) => " [speech: fallback]",
        (Some(_), false) if report.speech_attempts > 1 => " [speech: regenerated]",
        _ => "",
    };
    let judge_note = report
        .judge_verdict
        .as_ref()
        .filter(|v| v.hallucination)
        .map(|_| " [HALLUCINATION]")
        .unwrap_or("");
    println!(
        "T{} {:<8} reward {:+6.1} ({}){}{}",
        report.timestep, name, report.reward.total, report.reward.category, speech_note, judge_note
    );
}
