//! Reward Log
//!
//! Append-only JSONL log of reward components, one line per contribution,
//! tagged with the contributing category for auditability. Records are
//! never mutated after write.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use deduction_events::PlayerId;

use crate::reward::{RewardCategory, TurnReward};

/// One persisted reward contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardRecord {
    pub session: Uuid,
    pub agent: PlayerId,
    pub timestep: u64,
    pub category: RewardCategory,
    pub label: String,
    pub value: f32,
}

/// Buffered JSONL writer for reward records.
pub struct RewardLog {
    writer: Option<BufWriter<File>>,
    session: Uuid,
    record_count: u64,
}

impl RewardLog {
    /// Creates a log writing to the given path, truncating any old file.
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            session: Uuid::new_v4(),
            record_count: 0,
        })
    }

    /// Creates a log that discards records (for testing).
    pub fn null() -> Self {
        Self {
            writer: None,
            session: Uuid::new_v4(),
            record_count: 0,
        }
    }

    /// The session id stamped on every record.
    pub fn session(&self) -> Uuid {
        self.session
    }

    /// Number of records written so far.
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Appends every component of a resolved turn reward.
    pub fn append_turn(
        &mut self,
        agent: PlayerId,
        timestep: u64,
        reward: &TurnReward,
    ) -> std::io::Result<()> {
        for component in &reward.components {
            let record = RewardRecord {
                session: self.session,
                agent,
                timestep,
                category: component.category,
                label: component.label.clone(),
                value: component.value,
            };
            self.log(&record)?;
        }
        Ok(())
    }

    /// Appends a single record.
    pub fn log(&mut self, record: &RewardRecord) -> std::io::Result<()> {
        self.record_count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    /// Flushes buffered records to disk.
    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for RewardLog {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("Warning: Failed to flush reward log: {}", e);
        }
    }
}
