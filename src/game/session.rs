use serde::Serialize;

/// Counters shared by both modes, persisted at session boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Free-roam points.
    pub score: u64,
    pub coins: u64,
    pub level: u32,
    pub targets_completed: u32,
    pub timer_remaining: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            score: 0,
            coins: 0,
            level: 1,
            targets_completed: 0,
            timer_remaining: 0,
        }
    }
}
