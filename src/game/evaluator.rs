use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::classify::{Category, ClassificationTable};
use super::levels::{builtin_levels, Level};
use super::session::SessionState;

pub type Color = [f32; 4];

pub const GREEN: Color = [0.0, 1.0, 0.0, 1.0];
pub const RED: Color = [1.0, 0.0, 0.0, 1.0];
pub const ORANGE: Color = [1.0, 0.5, 0.0, 1.0];

const FREE_ROAM_POINTS: u64 = 50;
const LEVEL_BONUS_PER_LEVEL: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    FreeRoam,
    Mission,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMode::FreeRoam => f.write_str("free-roam"),
            GameMode::Mission => f.write_str("mission"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeKind {
    Correct,
    Wrong,
    AlreadyProcessed,
    LevelComplete,
    AllLevelsComplete,
    LevelFailed,
}

impl OutcomeKind {
    pub fn stops_capture(&self) -> bool {
        matches!(self, OutcomeKind::AllLevelsComplete | OutcomeKind::LevelFailed)
    }

    /// Terminal messages stay on screen until the next outcome.
    pub fn is_sticky(&self) -> bool {
        self.stops_capture()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub message: String,
    pub color: Color,
}

impl Outcome {
    fn new(kind: OutcomeKind, message: impl Into<String>, color: Color) -> Self {
        Self {
            kind,
            message: message.into(),
            color,
        }
    }

    fn wrong(label: &str, truth: Option<Category>) -> Self {
        let truth = truth.map(|c| c.as_str()).unwrap_or("unknown");
        Self::new(OutcomeKind::Wrong, format!("Wrong! {label} is {truth}"), RED)
    }

    pub fn level_failed() -> Self {
        Self::new(OutcomeKind::LevelFailed, "Level Failed", RED)
    }
}

/// Per-mode policy consulted by the detection loop.
pub trait Rules: Send {
    /// Whether a detected label may be promoted to the tracked object.
    fn accepts(&self, label: &str, session: &SessionState) -> bool;

    fn evaluate(&mut self, label: &str, choice: Category, session: &mut SessionState) -> Outcome;

    /// Countdown length for the current level, if the mode is timed.
    fn time_limit(&self, _session: &SessionState) -> Option<u32> {
        None
    }
}

pub struct FreeRoam {
    table: ClassificationTable,
    recent: HashSet<String>,
}

impl FreeRoam {
    pub fn new(table: ClassificationTable) -> Self {
        Self {
            table,
            recent: HashSet::new(),
        }
    }

    pub fn clear_recent(&mut self) {
        tracing::debug!(items = self.recent.len(), "clearing recent items");
        self.recent.clear();
    }

    pub fn recent_count(&self) -> usize {
        self.recent.len()
    }
}

impl Default for FreeRoam {
    fn default() -> Self {
        Self::new(ClassificationTable::free_roam())
    }
}

impl Rules for FreeRoam {
    fn accepts(&self, label: &str, _session: &SessionState) -> bool {
        self.table.contains(label)
    }

    fn evaluate(&mut self, label: &str, choice: Category, session: &mut SessionState) -> Outcome {
        let label = label.to_lowercase();

        if !self.recent.insert(label.clone()) {
            return Outcome::new(
                OutcomeKind::AlreadyProcessed,
                "Item already processed!",
                ORANGE,
            );
        }

        let truth = self.table.lookup(&label);
        if truth == Some(choice) {
            session.score += FREE_ROAM_POINTS;
            Outcome::new(
                OutcomeKind::Correct,
                format!("Correct! +{FREE_ROAM_POINTS} points"),
                GREEN,
            )
        } else {
            Outcome::wrong(&label, truth)
        }
    }
}

pub struct Mission {
    table: ClassificationTable,
    levels: Vec<Level>,
}

impl Mission {
    pub fn new(table: ClassificationTable, levels: Vec<Level>) -> Self {
        Self { table, levels }
    }

    /// Level for the session, clamped into the known range.
    pub fn level(&self, session: &SessionState) -> &Level {
        let idx = (session.level.max(1) as usize - 1).min(self.levels.len() - 1);
        &self.levels[idx]
    }

    pub fn current_target<'a>(&'a self, session: &SessionState) -> &'a str {
        self.level(session).current_target(session.targets_completed)
    }

    fn advance(&self, session: &mut SessionState, reward: u64) -> Outcome {
        let level = self.level(session);
        if (session.targets_completed as usize) < level.targets.len() {
            return Outcome::new(
                OutcomeKind::Correct,
                format!("Correct! +{reward} coins"),
                GREEN,
            );
        }

        if (level.number as usize) < self.levels.len() {
            session.level = level.number + 1;
            session.targets_completed = 0;
            let bonus = session.level as u64 * LEVEL_BONUS_PER_LEVEL;
            session.coins += bonus;

            tracing::info!(level = session.level, bonus, "level complete");
            Outcome::new(
                OutcomeKind::LevelComplete,
                format!("Correct! +{reward} coins"),
                GREEN,
            )
        } else {
            tracing::info!(level = level.number, "all levels complete");
            session.targets_completed = 0;
            Outcome::new(
                OutcomeKind::AllLevelsComplete,
                "Congratulations! You completed all levels!",
                GREEN,
            )
        }
    }
}

impl Default for Mission {
    fn default() -> Self {
        Self::new(ClassificationTable::mission(), builtin_levels())
    }
}

impl Rules for Mission {
    fn accepts(&self, label: &str, session: &SessionState) -> bool {
        self.level(session).has_target(label) && self.table.contains(label)
    }

    fn evaluate(&mut self, label: &str, choice: Category, session: &mut SessionState) -> Outcome {
        let label = label.to_lowercase();
        let truth = self.table.lookup(&label);

        if truth != Some(choice) {
            return Outcome::wrong(&label, truth);
        }

        let reward = self.level(session).reward;
        session.coins += reward;
        session.targets_completed += 1;
        self.advance(session, reward)
    }

    fn time_limit(&self, session: &SessionState) -> Option<u32> {
        Some(self.level(session).time_limit_secs)
    }
}
