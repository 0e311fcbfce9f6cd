use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Launch-time switches the host passes into every level attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimFlags {
    /// Run levels without their chaser even when the level defines one.
    pub disable_chaser: bool,
    /// Treat every level as unlocked in [`Progress::is_unlocked`].
    pub unlock_all_levels: bool,
}

/// Level completion and unlock record.
///
/// The simulation only reports completion; the host owns this value and
/// decides where it is persisted. Level 1 is always unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub completed: BTreeMap<u8, bool>,
    pub unlocked: BTreeMap<u8, bool>,
}

impl Default for Progress {
    fn default() -> Self {
        let mut unlocked = BTreeMap::new();
        unlocked.insert(1, true);
        Self {
            completed: BTreeMap::new(),
            unlocked,
        }
    }
}

impl Progress {
    pub fn is_completed(&self, level: u8) -> bool {
        self.completed.get(&level).copied().unwrap_or(false)
    }

    pub fn is_unlocked(&self, level: u8, flags: &SimFlags) -> bool {
        level == 1 || flags.unlock_all_levels || self.unlocked.get(&level).copied().unwrap_or(false)
    }

    /// Record a completed level and unlock the one after it.
    pub fn mark_completed(&mut self, level: u8) {
        self.completed.insert(level, true);
        self.unlocked.insert(level, true);
        if let Some(next) = level.checked_add(1) {
            self.unlocked.insert(next, true);
        }
    }

    /// Highest completed level, if any.
    pub fn last_completed(&self) -> Option<u8> {
        self.completed
            .iter()
            .filter(|(_, done)| **done)
            .map(|(level, _)| *level)
            .next_back()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a saved record. Level 1 is re-unlocked regardless of what was stored.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut progress: Progress = serde_json::from_str(json)?;
        progress.unlocked.insert(1, true);
        Ok(progress)
    }
}
