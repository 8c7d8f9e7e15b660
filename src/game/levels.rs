use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Level {
    pub number: u32,
    pub targets: Vec<String>,
    pub time_limit_secs: u32,
    pub reward: u64,
}

const LEVELS: [(&[&str], u32, u64); 10] = [
    (&["clear plastic bottle", "glass bottle"], 60, 10),
    (&["drink can", "food can"], 55, 15),
    (&["paper", "cardboard"], 50, 20),
    (&["plastic film", "plastic utensils"], 45, 25),
    (&["glass jar", "metal lid"], 40, 30),
    (&["crisp packet", "wrapper"], 35, 35),
    (&["foam cup", "styrofoam piece"], 30, 40),
    (&["battery", "electronic waste"], 25, 45),
    (&["food waste", "biodegradable"], 20, 50),
    (&["mixed waste", "unlabeled litter"], 15, 100),
];

pub fn builtin_levels() -> Vec<Level> {
    LEVELS
        .iter()
        .zip(1..)
        .map(|((targets, time_limit_secs, reward), number)| Level {
            number,
            targets: targets.iter().map(|t| t.to_string()).collect(),
            time_limit_secs: *time_limit_secs,
            reward: *reward,
        })
        .collect()
}

impl Level {
    pub fn has_target(&self, label: &str) -> bool {
        self.targets.iter().any(|t| t.eq_ignore_ascii_case(label))
    }

    /// Target shown to the player after `completed` correct answers.
    pub fn current_target(&self, completed: u32) -> &str {
        let idx = (completed as usize).min(self.targets.len().saturating_sub(1));
        self.targets.get(idx).map(String::as_str).unwrap_or("")
    }
}
