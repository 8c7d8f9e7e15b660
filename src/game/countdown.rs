use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    Idle,
    Ticked(u32),
    Expired,
}

/// Whole-second countdown driven by wall-clock instants rather than frames.
#[derive(Debug, Default)]
pub struct Countdown {
    remaining: u32,
    next_tick: Option<Instant>,
}

impl Countdown {
    pub fn start(&mut self, secs: u32, now: Instant) {
        self.remaining = secs;
        self.next_tick = Some(now + TICK);
    }

    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    #[cfg(test)]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Applies every second boundary crossed since the last call.
    pub fn advance(&mut self, now: Instant) -> CountdownEvent {
        let Some(mut next) = self.next_tick else {
            return CountdownEvent::Idle;
        };

        if now < next {
            return CountdownEvent::Idle;
        }

        while now >= next && self.remaining > 0 {
            self.remaining -= 1;
            next += TICK;
        }

        if self.remaining == 0 {
            self.next_tick = None;
            return CountdownEvent::Expired;
        }

        self.next_tick = Some(next);
        CountdownEvent::Ticked(self.remaining)
    }
}
