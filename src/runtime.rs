use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::oneshot;

use crate::camera::{render_preview, CameraError, FrameSource, OpenCvCamera};
use crate::config::Config;
use crate::detect::{self, Detector};
use crate::game::{
    Category, DetectionLoop, Feedback, GameMode, LoopSettings, LoopState, Outcome, OutcomeKind,
    SessionState, TrackedObject,
};
use crate::garden::{self, Garden};
use crate::storage::SaveStore;
use crate::tracking::{KcfTrackerFactory, TrackerFactory};

const CAMERA_ERROR_TEXT: &str = "Error: Unable to access camera";
const GROWTH_CHECK_INTERVAL: Duration = Duration::from_secs(1);

pub type CameraOpener = Box<dyn Fn(i32) -> Result<Box<dyn FrameSource>, CameraError> + Send>;

#[derive(Debug, Clone, Copy)]
pub enum GardenAction {
    Plant,
    Switch,
    Reset,
}

pub enum Command {
    EnterMode(GameMode),
    LeaveMode,
    StartCamera,
    StopCamera,
    SwitchCamera,
    Answer(Category, oneshot::Sender<Option<Outcome>>),
    ClearRecent,
    BuyTree(String, oneshot::Sender<GardenView>),
    Garden(GardenAction, oneshot::Sender<GardenView>),
    Shutdown,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GardenView {
    pub coins: u64,
    pub owned: Vec<String>,
    pub tree_type: String,
    pub status: String,
    pub image: String,
    pub can_plant: bool,
    pub trees_planted: u32,
    pub message: String,
}

impl GardenView {
    fn new(garden: &Garden, coins: u64) -> Self {
        Self {
            coins,
            owned: garden.owned().iter().map(|t| t.to_string()).collect(),
            tree_type: garden.tree_type.clone(),
            status: garden.status().to_string(),
            image: garden.image().to_string(),
            can_plant: garden.can_plant,
            trees_planted: garden.trees_planted,
            message: garden.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GameSnapshot {
    pub mode: Option<GameMode>,
    pub running: bool,
    pub camera_index: i32,
    pub state: LoopState,
    pub detected_text: String,
    pub tracked: Option<TrackedObject>,
    pub feedback: Option<Feedback>,
    pub session: SessionState,
    pub current_target: Option<String>,
    pub level_targets: Vec<String>,
    pub recent_items: usize,
    pub garden: GardenView,
}

/// State published by the game thread after every tick or command.
#[derive(Clone, Default)]
pub struct Shared {
    snapshot: Arc<RwLock<GameSnapshot>>,
    preview: Arc<RwLock<Option<Vec<u8>>>>,
}

/// Cloneable access to the game thread for the HTTP layer.
#[derive(Clone)]
pub struct GameHandle {
    commands: Sender<Command>,
    shared: Shared,
}

impl GameHandle {
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn snapshot(&self) -> Option<GameSnapshot> {
        self.shared.snapshot.read().ok().map(|s| s.clone())
    }

    pub fn preview(&self) -> Option<Vec<u8>> {
        self.shared.preview.read().ok().and_then(|p| p.clone())
    }
}

/// Owns every piece of mutable game state. All mutation happens on the
/// single thread running [`Game::run`].
pub struct Game {
    detection: DetectionLoop,
    session: SessionState,
    garden: Garden,
    store: SaveStore,
    open_camera: CameraOpener,
    camera: Option<Box<dyn FrameSource>>,
    camera_index: i32,
    camera_error: bool,
    mode: Option<GameMode>,
    frame_interval: Duration,
    last_growth_check: Option<Instant>,
    shared: Shared,
}

impl Game {
    pub fn new(
        config: &Config,
        detector: Box<dyn Detector>,
        trackers: Box<dyn TrackerFactory>,
        store: SaveStore,
        open_camera: CameraOpener,
        shared: Shared,
    ) -> Self {
        let settings = LoopSettings {
            cooldown: Duration::from_secs(config.game.cooldown_secs),
            feedback_ttl: Duration::from_secs(config.game.feedback_secs),
        };
        let (session, garden) = store.load();

        Self {
            detection: DetectionLoop::new(detector, trackers, settings),
            session,
            garden,
            store,
            open_camera,
            camera: None,
            camera_index: config.camera.index,
            camera_error: false,
            mode: None,
            frame_interval: Duration::from_secs_f64(1.0 / config.camera.fps.max(1) as f64),
            last_growth_check: None,
            shared,
        }
    }

    pub fn run(mut self, commands: Receiver<Command>) {
        tracing::info!(camera = self.camera_index, "game loop started");
        self.publish();

        let mut next_tick = Instant::now();
        loop {
            let timeout = next_tick.saturating_duration_since(Instant::now());
            match commands.recv_timeout(timeout) {
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(command) => {
                    self.handle(command, Instant::now());
                    self.publish();
                    continue;
                }
                Err(RecvTimeoutError::Timeout) => {}
            }

            let now = Instant::now();
            self.step(now);
            self.publish();
            next_tick = now + self.frame_interval;
        }

        self.close_camera();
        self.persist();
        tracing::info!("game loop stopped");
    }

    fn step(&mut self, now: Instant) {
        if let Some(camera) = self.camera.as_mut() {
            if let Some(frame) = camera.read() {
                let report = self.detection.tick(&frame, now, &self.session);
                tracing::trace!(
                    detected = report.detection_attempted,
                    lost = report.lost,
                    "tick"
                );
                if let Some(label) = &report.locked {
                    tracing::debug!(label = %label, "awaiting classification");
                }

                let tracked = self
                    .detection
                    .tracked()
                    .map(|t| (t.label.as_str(), t.bbox));
                if let Some(jpeg) = render_preview(&frame, tracked) {
                    if let Ok(mut preview) = self.shared.preview.write() {
                        *preview = Some(jpeg);
                    }
                }
            }
        }

        if let Some(outcome) = self.detection.advance_clock(now, &mut self.session) {
            self.apply_outcome(&outcome);
        }

        let growth_due = self
            .last_growth_check
            .map_or(true, |t| now.saturating_duration_since(t) >= GROWTH_CHECK_INTERVAL);
        if growth_due {
            self.last_growth_check = Some(now);
            if self.garden.grow(self.session.score) {
                self.persist();
            }
        }
    }

    fn handle(&mut self, command: Command, now: Instant) {
        match command {
            Command::EnterMode(mode) => {
                self.leave_mode();
                self.detection.set_mode(mode);
                self.mode = Some(mode);
            }
            Command::LeaveMode => self.leave_mode(),
            Command::StartCamera => self.start_camera(now),
            Command::StopCamera => {
                self.close_camera();
                self.detection.halt();
            }
            Command::SwitchCamera => self.switch_camera(),
            Command::Answer(choice, reply) => {
                let outcome = self.detection.submit(choice, now, &mut self.session);
                if let Some(outcome) = &outcome {
                    self.apply_outcome(outcome);
                }
                let _ = reply.send(outcome);
            }
            Command::ClearRecent => self.detection.free_roam_mut().clear_recent(),
            Command::BuyTree(tree, reply) => {
                if garden::buy(&mut self.garden, &mut self.session.coins, &tree) {
                    self.persist();
                }
                let _ = reply.send(self.garden_view());
            }
            Command::Garden(action, reply) => {
                match action {
                    GardenAction::Plant => {
                        self.garden.plant(&mut self.session.coins);
                    }
                    GardenAction::Switch => self.garden.switch_tree(),
                    GardenAction::Reset => self.garden.reset(),
                }
                self.persist();
                let _ = reply.send(self.garden_view());
            }
            Command::Shutdown => {}
        }
    }

    fn apply_outcome(&mut self, outcome: &Outcome) {
        match outcome.kind {
            kind if kind.stops_capture() => {
                tracing::info!(outcome = ?kind, "stopping capture");
                self.close_camera();
                self.persist();
            }
            OutcomeKind::LevelComplete => self.persist(),
            _ => {}
        }
    }

    fn leave_mode(&mut self) {
        if let Some(mode) = self.mode.take() {
            self.close_camera();
            self.detection.halt();
            self.persist();
            tracing::info!(mode = %mode, "left mode");
        }
    }

    fn start_camera(&mut self, now: Instant) {
        if self.mode.is_none() {
            tracing::warn!("camera start ignored outside a game mode");
            return;
        }
        if self.camera.is_some() {
            return;
        }

        if self.open() {
            self.detection.begin(now, &mut self.session);
        }
    }

    fn switch_camera(&mut self) {
        let was_running = self.camera.is_some();
        self.close_camera();
        self.camera_index = 1 - self.camera_index;
        tracing::info!(camera = self.camera_index, "switching camera");

        if was_running {
            self.detection.reset();
            if !self.open() {
                self.detection.halt();
            }
        }
    }

    fn open(&mut self) -> bool {
        match (self.open_camera)(self.camera_index) {
            Ok(camera) => {
                self.camera = Some(camera);
                self.camera_error = false;
                true
            }
            Err(e) => {
                tracing::error!(camera = self.camera_index, error = %e, "camera unavailable");
                self.camera_error = true;
                false
            }
        }
    }

    fn close_camera(&mut self) {
        if let Some(camera) = self.camera.take() {
            tracing::debug!(camera = camera.index(), "capture stopped");
        }
        if let Ok(mut preview) = self.shared.preview.write() {
            *preview = None;
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.session, &self.garden) {
            tracing::error!(error = %e, "failed to save game data");
        }
    }

    fn garden_view(&self) -> GardenView {
        GardenView::new(&self.garden, self.session.coins)
    }

    fn snapshot(&self) -> GameSnapshot {
        let mission = self.detection.mission();
        let (current_target, level_targets) = match self.mode {
            Some(GameMode::Mission) => (
                Some(mission.current_target(&self.session).to_string()),
                mission.level(&self.session).targets.clone(),
            ),
            _ => (None, Vec::new()),
        };

        let detected_text = if self.camera_error {
            CAMERA_ERROR_TEXT.to_string()
        } else {
            self.detection.status().to_string()
        };

        GameSnapshot {
            mode: self.mode,
            running: self.camera.is_some(),
            camera_index: self.camera_index,
            state: self.detection.state(),
            detected_text,
            tracked: self.detection.tracked().cloned(),
            feedback: self.detection.feedback().cloned(),
            session: self.session.clone(),
            current_target,
            level_targets,
            recent_items: self.detection.free_roam().recent_count(),
            garden: self.garden_view(),
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        match self.shared.snapshot.write() {
            Ok(mut shared) => *shared = snapshot,
            Err(_) => tracing::error!("snapshot lock poisoned"),
        }
    }
}

pub fn spawn_game(config: Config, store: SaveStore) -> (GameHandle, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel();
    let shared = Shared::default();
    let handle = GameHandle {
        commands: tx,
        shared: shared.clone(),
    };

    let join = tokio::task::spawn_blocking(move || {
        let detector = match detect::from_config(&config.detector) {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(error = %e, "failed to create detector");
                return;
            }
        };

        let open_camera: CameraOpener = Box::new(|index| {
            OpenCvCamera::open(index).map(|c| Box::new(c) as Box<dyn FrameSource>)
        });

        Game::new(
            &config,
            detector,
            Box::new(KcfTrackerFactory),
            store,
            open_camera,
            shared,
        )
        .run(rx);
    });

    (handle, join)
}
