use std::time::{Duration, Instant};

use serde::Serialize;

use super::classify::Category;
use super::countdown::{Countdown, CountdownEvent};
use super::evaluator::{Color, FreeRoam, GameMode, Mission, Outcome, OutcomeKind, Rules};
use super::session::SessionState;
use crate::detect::Detector;
use crate::frame::{BoundingBox, Frame};
use crate::tracking::{Tracker, TrackerFactory};

pub const IDLE_TEXT: &str = "Press START to begin detection";
const SCANNING_TEXT: &str = "Detecting...";
const STOPPED_TEXT: &str = "Camera stopped";
const TIME_UP_TEXT: &str = "Time's up!";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    #[default]
    Idle,
    /// A label is locked and a tracker follows it. Tracking without a
    /// pending choice only exists inside a single tick.
    AwaitingChoice,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackedObject {
    pub label: String,
    pub bbox: BoundingBox,
    #[serde(skip)]
    pub acquired_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub message: String,
    pub color: Color,
}

struct ShownFeedback {
    feedback: Feedback,
    shown_at: Instant,
    sticky: bool,
}

struct Active {
    tracker: Box<dyn Tracker>,
    object: TrackedObject,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub detection_attempted: bool,
    pub locked: Option<String>,
    pub lost: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    pub cooldown: Duration,
    pub feedback_ttl: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(2),
            feedback_ttl: Duration::from_secs(2),
        }
    }
}

/// Per-frame detect/track/answer state machine shared by both game modes.
///
/// While an object is tracked no detector call is made; detection resumes
/// only after the tracker loses the object or an answer resolves it, and in
/// the latter case only once the cooldown has elapsed.
pub struct DetectionLoop {
    detector: Box<dyn Detector>,
    trackers: Box<dyn TrackerFactory>,
    free_roam: FreeRoam,
    mission: Mission,
    mode: GameMode,
    settings: LoopSettings,
    active: Option<Active>,
    last_resolved: Option<Instant>,
    countdown: Countdown,
    feedback: Option<ShownFeedback>,
    status: String,
}

impl DetectionLoop {
    pub fn new(
        detector: Box<dyn Detector>,
        trackers: Box<dyn TrackerFactory>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            detector,
            trackers,
            free_roam: FreeRoam::default(),
            mission: Mission::default(),
            mode: GameMode::FreeRoam,
            settings,
            active: None,
            last_resolved: None,
            countdown: Countdown::default(),
            feedback: None,
            status: IDLE_TEXT.to_string(),
        }
    }

    fn rules(&self) -> &dyn Rules {
        match self.mode {
            GameMode::FreeRoam => &self.free_roam,
            GameMode::Mission => &self.mission,
        }
    }

    fn rules_mut(&mut self) -> &mut dyn Rules {
        match self.mode {
            GameMode::FreeRoam => &mut self.free_roam,
            GameMode::Mission => &mut self.mission,
        }
    }

    #[cfg(test)]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GameMode) {
        self.reset();
        self.countdown.stop();
        self.feedback = None;
        self.mode = mode;
        self.status = IDLE_TEXT.to_string();
        tracing::info!(mode = %mode, "mode selected");
    }

    pub fn free_roam(&self) -> &FreeRoam {
        &self.free_roam
    }

    pub fn free_roam_mut(&mut self) -> &mut FreeRoam {
        &mut self.free_roam
    }

    pub fn mission(&self) -> &Mission {
        &self.mission
    }

    pub fn state(&self) -> LoopState {
        if self.active.is_some() {
            LoopState::AwaitingChoice
        } else {
            LoopState::Idle
        }
    }

    pub fn tracked(&self) -> Option<&TrackedObject> {
        self.active.as_ref().map(|a| &a.object)
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref().map(|f| &f.feedback)
    }

    #[cfg(test)]
    pub fn last_resolved(&self) -> Option<Instant> {
        self.last_resolved
    }

    /// Capture started: scanning resumes and timed modes restart their clock.
    pub fn begin(&mut self, now: Instant, session: &mut SessionState) {
        self.status = SCANNING_TEXT.to_string();
        if let Some(limit) = self.rules().time_limit(session) {
            self.countdown.start(limit, now);
            session.timer_remaining = limit;
        }
    }

    pub fn halt(&mut self) {
        self.reset();
        self.countdown.stop();
        self.status = STOPPED_TEXT.to_string();
    }

    /// Drops the tracked object, if any, without touching the score.
    pub fn reset(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::debug!(label = %active.object.label, "tracking reset");
        }
        self.status = SCANNING_TEXT.to_string();
    }

    pub fn tick(&mut self, frame: &Frame, now: Instant, session: &SessionState) -> TickReport {
        let mut report = TickReport::default();

        let lost = match self.active.as_mut() {
            Some(active) => match active.tracker.update(frame) {
                Some(bbox) => {
                    active.object.bbox = bbox;
                    false
                }
                None => true,
            },
            None => false,
        };

        if lost {
            tracing::debug!("tracker lost object");
            self.reset();
            report.lost = true;
        } else if let (Some(active), GameMode::FreeRoam) = (&self.active, self.mode) {
            self.status = format!("Tracking: {}", active.object.label);
        }

        if self.active.is_none() && self.cooldown_elapsed(now) {
            report.detection_attempted = true;
            report.locked = self.acquire(frame, now, session);
        }

        self.expire_feedback(now);
        report
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        self.last_resolved
            .map_or(true, |t| now.saturating_duration_since(t) >= self.settings.cooldown)
    }

    fn acquire(&mut self, frame: &Frame, now: Instant, session: &SessionState) -> Option<String> {
        let detections = match self.detector.detect(frame) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "detection failed");
                return None;
            }
        };

        let rules = self.rules();
        let detection = detections
            .into_iter()
            .find(|d| rules.accepts(&d.label, session))?;

        let mut tracker = match self.trackers.create() {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "failed to create tracker");
                return None;
            }
        };

        if !tracker.init(frame, detection.bbox) {
            tracing::debug!(label = %detection.label, "tracker init failed");
            return None;
        }

        let label = detection.label.to_lowercase();
        tracing::info!(
            mode = %self.mode,
            label = %label,
            confidence = format!("{:.2}", detection.confidence),
            "target locked"
        );

        self.status = format!("Detected: {label}");
        self.active = Some(Active {
            tracker,
            object: TrackedObject {
                label: label.clone(),
                bbox: detection.bbox,
                acquired_at: now,
            },
        });

        Some(label)
    }

    /// Scores the tracked object once. Returns `None` when nothing is
    /// awaiting a choice. An answer arriving after the level deadline is not
    /// scored; the failed level is reported instead.
    pub fn submit(
        &mut self,
        choice: Category,
        now: Instant,
        session: &mut SessionState,
    ) -> Option<Outcome> {
        self.active.as_ref()?;
        if let Some(failed) = self.advance_clock(now, session) {
            return Some(failed);
        }

        let object = &self.active.as_ref()?.object;
        let label = object.label.clone();
        let held = now.saturating_duration_since(object.acquired_at);

        let outcome = self.rules_mut().evaluate(&label, choice, session);
        tracing::info!(
            mode = %self.mode,
            label = %label,
            choice = %choice,
            outcome = ?outcome.kind,
            held_ms = held.as_millis() as u64,
            "answer evaluated"
        );

        self.reset();
        self.last_resolved = Some(now);

        match outcome.kind {
            OutcomeKind::LevelComplete => {
                if let Some(limit) = self.rules().time_limit(session) {
                    self.countdown.start(limit, now);
                    session.timer_remaining = limit;
                }
            }
            OutcomeKind::AllLevelsComplete => {
                self.countdown.stop();
                self.status = STOPPED_TEXT.to_string();
            }
            _ => {}
        }

        self.show(&outcome, now);
        Some(outcome)
    }

    /// Advances the level countdown; runs whether or not frames arrive.
    pub fn advance_clock(&mut self, now: Instant, session: &mut SessionState) -> Option<Outcome> {
        self.expire_feedback(now);

        match self.countdown.advance(now) {
            CountdownEvent::Idle => None,
            CountdownEvent::Ticked(remaining) => {
                session.timer_remaining = remaining;
                None
            }
            CountdownEvent::Expired => {
                session.timer_remaining = 0;
                self.reset();
                self.status = TIME_UP_TEXT.to_string();

                tracing::warn!(level = session.level, "level timer expired");
                let outcome = Outcome::level_failed();
                self.show(&outcome, now);
                Some(outcome)
            }
        }
    }

    fn show(&mut self, outcome: &Outcome, now: Instant) {
        self.feedback = Some(ShownFeedback {
            feedback: Feedback {
                message: outcome.message.clone(),
                color: outcome.color,
            },
            shown_at: now,
            sticky: outcome.kind.is_sticky(),
        });
    }

    fn expire_feedback(&mut self, now: Instant) {
        let expired = self.feedback.as_ref().is_some_and(|f| {
            !f.sticky && now.saturating_duration_since(f.shown_at) >= self.settings.feedback_ttl
        });
        if expired {
            self.feedback = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{DetectError, Detection};
    use crate::game::evaluator::{GREEN, RED};
    use crate::tracking::TrackError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    type Script<T> = Arc<Mutex<VecDeque<T>>>;

    struct FakeDetector {
        calls: Arc<AtomicUsize>,
        responses: Script<Result<Vec<Detection>, DetectError>>,
    }

    impl Detector for FakeDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, DetectError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    struct FakeTracker {
        init_ok: bool,
        updates: Script<Option<BoundingBox>>,
        last: BoundingBox,
    }

    impl Tracker for FakeTracker {
        fn init(&mut self, _frame: &Frame, bbox: BoundingBox) -> bool {
            self.last = bbox;
            self.init_ok
        }

        fn update(&mut self, _frame: &Frame) -> Option<BoundingBox> {
            match self.updates.lock().unwrap().pop_front() {
                Some(next) => next,
                None => Some(self.last),
            }
        }
    }

    struct FakeTrackers {
        created: Arc<AtomicUsize>,
        init_ok: Script<bool>,
        updates: Script<Option<BoundingBox>>,
    }

    impl TrackerFactory for FakeTrackers {
        fn create(&self) -> Result<Box<dyn Tracker>, TrackError> {
            self.created.fetch_add(1, Ordering::SeqCst);
            let init_ok = self.init_ok.lock().unwrap().pop_front().unwrap_or(true);
            Ok(Box::new(FakeTracker {
                init_ok,
                updates: Arc::clone(&self.updates),
                last: BoundingBox::new(0.0, 0.0, 0.0, 0.0),
            }))
        }
    }

    struct Harness {
        game: DetectionLoop,
        session: SessionState,
        detect_calls: Arc<AtomicUsize>,
        trackers_created: Arc<AtomicUsize>,
        responses: Script<Result<Vec<Detection>, DetectError>>,
        init_ok: Script<bool>,
        updates: Script<Option<BoundingBox>>,
        t0: Instant,
        frame: Frame,
    }

    impl Harness {
        fn new(mode: GameMode) -> Self {
            let detect_calls = Arc::new(AtomicUsize::new(0));
            let trackers_created = Arc::new(AtomicUsize::new(0));
            let responses: Script<_> = Arc::default();
            let init_ok: Script<_> = Arc::default();
            let updates: Script<_> = Arc::default();

            let detector = FakeDetector {
                calls: Arc::clone(&detect_calls),
                responses: Arc::clone(&responses),
            };
            let trackers = FakeTrackers {
                created: Arc::clone(&trackers_created),
                init_ok: Arc::clone(&init_ok),
                updates: Arc::clone(&updates),
            };

            let mut game = DetectionLoop::new(
                Box::new(detector),
                Box::new(trackers),
                LoopSettings::default(),
            );
            game.set_mode(mode);

            Self {
                game,
                session: SessionState::default(),
                detect_calls,
                trackers_created,
                responses,
                init_ok,
                updates,
                t0: Instant::now(),
                frame: Frame::new(4, 4, vec![0; 48]),
            }
        }

        fn at(&self, millis: u64) -> Instant {
            self.t0 + Duration::from_millis(millis)
        }

        fn respond(&self, labels: &[&str]) {
            let detections = labels
                .iter()
                .map(|label| Detection {
                    label: label.to_string(),
                    confidence: 0.9,
                    bbox: BoundingBox::new(10.0, 10.0, 20.0, 20.0),
                })
                .collect();
            self.responses.lock().unwrap().push_back(Ok(detections));
        }

        fn tick(&mut self, millis: u64) -> TickReport {
            let now = self.at(millis);
            self.game.tick(&self.frame, now, &self.session)
        }

        fn submit(&mut self, choice: Category, millis: u64) -> Option<Outcome> {
            let now = self.at(millis);
            self.game.submit(choice, now, &mut self.session)
        }

        fn calls(&self) -> usize {
            self.detect_calls.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_locks_first_accepted_prediction() {
        let mut h = Harness::new(GameMode::FreeRoam);
        h.respond(&["spaceship", "drink can", "battery"]);

        let report = h.tick(0);
        assert!(report.detection_attempted);
        assert_eq!(report.locked.as_deref(), Some("drink can"));
        assert_eq!(h.game.state(), LoopState::AwaitingChoice);
        assert_eq!(h.game.tracked().unwrap().label, "drink can");
        assert_eq!(h.game.status(), "Detected: drink can");
        assert_eq!(h.trackers_created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_detection_while_awaiting_choice() {
        let mut h = Harness::new(GameMode::FreeRoam);
        h.respond(&["drink can"]);
        h.tick(0);
        assert_eq!(h.calls(), 1);

        for i in 1..100 {
            h.respond(&["battery"]);
            let report = h.tick(i * 33);
            assert!(!report.detection_attempted);
            assert_eq!(h.game.state(), LoopState::AwaitingChoice);
            assert_eq!(h.game.tracked().unwrap().label, "drink can");
        }
        assert_eq!(h.calls(), 1);
        assert_eq!(h.trackers_created.load(Ordering::SeqCst), 1);
        assert_eq!(h.game.status(), "Tracking: drink can");
    }

    #[test]
    fn test_tracker_update_refreshes_box() {
        let mut h = Harness::new(GameMode::FreeRoam);
        h.respond(&["glass"]);
        h.tick(0);

        let moved = BoundingBox::new(12.0, 14.0, 20.0, 20.0);
        h.updates.lock().unwrap().push_back(Some(moved));
        h.tick(33);
        assert_eq!(h.game.tracked().unwrap().bbox, moved);
    }

    #[test]
    fn test_correct_answer_scores_and_resets() {
        let mut h = Harness::new(GameMode::FreeRoam);
        h.respond(&["drink can"]);
        h.tick(0);

        let outcome = h.submit(Category::Recyclable, 500).unwrap();
        assert_eq!(outcome.message, "Correct! +50 points");
        assert_eq!(h.session.score, 50);
        assert_eq!(h.game.state(), LoopState::Idle);
        assert!(h.game.tracked().is_none());
        assert_eq!(h.game.last_resolved(), Some(h.at(500)));
        assert_eq!(h.game.feedback().unwrap().color, GREEN);
    }

    #[test]
    fn test_cooldown_blocks_detection_after_answer() {
        let mut h = Harness::new(GameMode::FreeRoam);
        h.respond(&["drink can"]);
        h.tick(0);
        h.submit(Category::Recyclable, 1000);

        let report = h.tick(1033);
        assert!(!report.detection_attempted);
        let report = h.tick(2999);
        assert!(!report.detection_attempted);
        assert_eq!(h.calls(), 1);

        let report = h.tick(3000);
        assert!(report.detection_attempted);
        assert_eq!(h.calls(), 2);
    }

    #[test]
    fn test_answer_without_tracked_object_dropped() {
        let mut h = Harness::new(GameMode::FreeRoam);
        h.tick(0);
        assert!(h.submit(Category::Recyclable, 10).is_none());
        assert_eq!(h.session.score, 0);
        assert!(h.game.feedback().is_none());
        assert!(h.game.last_resolved().is_none());
    }

    #[test]
    fn test_repeat_label_scores_once() {
        let mut h = Harness::new(GameMode::FreeRoam);
        h.respond(&["drink can"]);
        h.tick(0);
        h.submit(Category::Recyclable, 100);

        h.respond(&["drink can"]);
        h.tick(2100);
        assert_eq!(h.game.state(), LoopState::AwaitingChoice);
        let outcome = h.submit(Category::Recyclable, 2200).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::AlreadyProcessed);
        assert_eq!(outcome.message, "Item already processed!");
        assert_eq!(h.session.score, 50);
        assert_eq!(h.game.state(), LoopState::Idle);
    }

    #[test]
    fn test_tracker_failure_resets_without_score() {
        let mut h = Harness::new(GameMode::FreeRoam);
        h.respond(&["drink can"]);
        h.tick(0);

        h.updates.lock().unwrap().push_back(None);
        let report = h.tick(33);
        assert!(report.lost);
        assert_eq!(h.game.state(), LoopState::Idle);
        assert!(h.game.tracked().is_none());
        assert_eq!(h.session.score, 0);
        assert!(h.submit(Category::Recyclable, 40).is_none());
        // no answer was resolved, so scanning resumes in the same tick
        assert!(report.detection_attempted);
    }

    #[test]
    fn test_detector_failure_treated_as_empty() {
        let mut h = Harness::new(GameMode::FreeRoam);
        h.responses
            .lock()
            .unwrap()
            .push_back(Err(DetectError::Inference("timeout".to_string())));

        let report = h.tick(0);
        assert!(report.detection_attempted);
        assert!(report.locked.is_none());
        assert_eq!(h.game.state(), LoopState::Idle);

        h.respond(&["paper"]);
        assert_eq!(h.tick(33).locked.as_deref(), Some("paper"));
    }

    #[test]
    fn test_unmapped_labels_ignored() {
        let mut h = Harness::new(GameMode::FreeRoam);
        h.respond(&["spaceship", "unicorn"]);
        let report = h.tick(0);
        assert!(report.locked.is_none());
        assert_eq!(h.trackers_created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_tracker_init_failure_stays_idle() {
        let mut h = Harness::new(GameMode::FreeRoam);
        h.init_ok.lock().unwrap().push_back(false);
        h.respond(&["drink can", "paper"]);

        let report = h.tick(0);
        assert!(report.locked.is_none());
        assert_eq!(h.game.state(), LoopState::Idle);
        assert_eq!(h.trackers_created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_at_most_one_tracked_object() {
        let mut h = Harness::new(GameMode::FreeRoam);
        let labels = ["drink can", "paper", "battery", "glass", "shoe"];
        let mut locks = 0;
        let mut answers = 0;

        for i in 0..600u64 {
            h.respond(&labels);
            if i % 7 == 3 {
                h.updates.lock().unwrap().push_back(None);
            }
            let report = h.tick(i * 33);
            if report.locked.is_some() {
                locks += 1;
                assert!(h.game.tracked().is_some());
            }
            if i % 11 == 5 && h.submit(Category::Recyclable, i * 33 + 1).is_some() {
                answers += 1;
            }
            let created = h.trackers_created.load(Ordering::SeqCst);
            assert_eq!(created, locks);
        }

        assert!(locks > 1);
        assert!(answers > 0);
    }

    #[test]
    fn test_mission_wrong_answer_battery() {
        let mut h = Harness::new(GameMode::Mission);
        h.session.level = 8;
        h.session.coins = 12;
        h.game.begin(h.t0, &mut h.session);
        assert_eq!(h.session.timer_remaining, 25);

        h.respond(&["battery"]);
        h.tick(0);
        let outcome = h.submit(Category::Recyclable, 100).unwrap();
        assert_eq!(outcome.message, "Wrong! battery is hazardous");
        assert_eq!(outcome.color, RED);
        assert_eq!(h.session.coins, 12);
    }

    #[test]
    fn test_mission_ignores_other_level_targets() {
        let mut h = Harness::new(GameMode::Mission);
        h.game.begin(h.t0, &mut h.session);
        h.respond(&["battery", "drink can"]);
        assert!(h.tick(0).locked.is_none());
        h.respond(&["battery", "glass bottle"]);
        assert_eq!(h.tick(33).locked.as_deref(), Some("glass bottle"));
    }

    #[test]
    fn test_mission_level_complete_awards_bonus_and_restarts_timer() {
        let mut h = Harness::new(GameMode::Mission);
        h.game.begin(h.t0, &mut h.session);
        assert_eq!(h.session.timer_remaining, 60);

        h.respond(&["clear plastic bottle"]);
        h.tick(0);
        h.submit(Category::Recyclable, 100);
        assert_eq!(h.session.coins, 10);

        h.respond(&["glass bottle"]);
        h.tick(2100);
        let outcome = h.submit(Category::Recyclable, 2200).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::LevelComplete);
        assert_eq!(h.session.level, 2);
        assert_eq!(h.session.targets_completed, 0);
        assert_eq!(h.session.coins, 10 + 10 + 2 * 20);
        assert_eq!(h.session.timer_remaining, 55);

        h.game.advance_clock(h.at(3200), &mut h.session);
        assert_eq!(h.session.timer_remaining, 54);
    }

    #[test]
    fn test_mission_timer_expiry_fails_level() {
        let mut h = Harness::new(GameMode::Mission);
        h.session.level = 10;
        h.game.begin(h.t0, &mut h.session);
        assert_eq!(h.session.timer_remaining, 15);

        h.respond(&["mixed waste"]);
        h.tick(0);
        assert_eq!(h.game.state(), LoopState::AwaitingChoice);

        assert!(h.game.advance_clock(h.at(14_000), &mut h.session).is_none());
        assert_eq!(h.session.timer_remaining, 1);

        let outcome = h.game.advance_clock(h.at(15_000), &mut h.session).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::LevelFailed);
        assert!(outcome.kind.stops_capture());
        assert_eq!(outcome.message, "Level Failed");
        assert_eq!(h.session.timer_remaining, 0);
        assert_eq!(h.session.coins, 0);
        assert_eq!(h.game.state(), LoopState::Idle);
        assert_eq!(h.game.status(), "Time's up!");
        assert!(h.submit(Category::NonRecyclable, 15_100).is_none());
        assert_eq!(h.session.coins, 0);

        // failure message outlives the normal feedback window
        h.game.advance_clock(h.at(30_000), &mut h.session);
        assert_eq!(h.game.feedback().unwrap().message, "Level Failed");
    }

    #[test]
    fn test_answer_after_deadline_fails_level() {
        let mut h = Harness::new(GameMode::Mission);
        h.session.level = 10;
        h.game.begin(h.t0, &mut h.session);

        h.respond(&["mixed waste"]);
        h.tick(0);
        assert_eq!(h.game.state(), LoopState::AwaitingChoice);

        let outcome = h.submit(Category::NonRecyclable, 15_020).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::LevelFailed);
        assert_eq!(h.session.coins, 0);
        assert_eq!(h.session.targets_completed, 0);
        assert_eq!(h.session.timer_remaining, 0);
        assert_eq!(h.game.state(), LoopState::Idle);
        assert_eq!(h.game.status(), "Time's up!");
        assert!(h.game.advance_clock(h.at(16_000), &mut h.session).is_none());
    }

    #[test]
    fn test_answer_before_deadline_still_scores() {
        let mut h = Harness::new(GameMode::Mission);
        h.session.level = 10;
        h.game.begin(h.t0, &mut h.session);

        h.respond(&["mixed waste"]);
        h.tick(0);

        let outcome = h.submit(Category::NonRecyclable, 14_900).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Correct);
        assert_eq!(h.session.coins, 100);
        assert_eq!(h.session.timer_remaining, 1);
    }

    #[test]
    fn test_all_levels_complete_reports_stopped() {
        let mut h = Harness::new(GameMode::Mission);
        h.session.level = 10;
        h.session.targets_completed = 1;
        h.game.begin(h.t0, &mut h.session);

        h.respond(&["unlabeled litter"]);
        h.tick(0);
        let outcome = h.submit(Category::NonRecyclable, 500).unwrap();
        assert_eq!(outcome.kind, OutcomeKind::AllLevelsComplete);
        assert_eq!(h.game.status(), "Camera stopped");
        assert!(h.game.advance_clock(h.at(60_000), &mut h.session).is_none());
        assert_eq!(
            h.game.feedback().unwrap().message,
            "Congratulations! You completed all levels!"
        );
    }

    #[test]
    fn test_feedback_expires() {
        let mut h = Harness::new(GameMode::FreeRoam);
        h.respond(&["drink can"]);
        h.tick(0);
        h.submit(Category::NonRecyclable, 100);
        assert_eq!(
            h.game.feedback().unwrap().message,
            "Wrong! drink can is recyclable"
        );

        h.tick(1000);
        assert!(h.game.feedback().is_some());
        h.tick(2100);
        assert!(h.game.feedback().is_none());
    }

    #[test]
    fn test_set_mode_drops_tracked_object() {
        let mut h = Harness::new(GameMode::FreeRoam);
        h.respond(&["drink can"]);
        h.tick(0);
        h.game.set_mode(GameMode::Mission);
        assert_eq!(h.game.state(), LoopState::Idle);
        assert_eq!(h.game.mode(), GameMode::Mission);
        assert_eq!(h.game.status(), IDLE_TEXT);
    }

    #[test]
    fn test_halt_stops_countdown() {
        let mut h = Harness::new(GameMode::Mission);
        h.game.begin(h.t0, &mut h.session);
        h.game.halt();
        assert_eq!(h.game.status(), "Camera stopped");
        assert!(h.game.advance_clock(h.at(120_000), &mut h.session).is_none());
        assert_eq!(h.session.timer_remaining, 60);
    }
}
