use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

use crate::game::{Category, GameMode, Outcome};
use crate::runtime::{Command, GameHandle, GardenAction, GardenView};

#[derive(Embed)]
#[folder = "src/assets/"]
struct Assets;

#[derive(Clone)]
pub struct AppState {
    pub game: GameHandle,
}

impl AppState {
    pub fn new(game: GameHandle) -> Self {
        Self { game }
    }
}

#[derive(Deserialize)]
struct AnswerRequest {
    category: String,
}

#[derive(Serialize)]
struct AnswerResponse {
    accepted: bool,
    outcome: Option<Outcome>,
}

#[derive(Deserialize)]
struct BuyRequest {
    tree: String,
}

pub async fn start_server(state: AppState, port: u16) -> Result<(), std::io::Error> {
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/assets/{*path}", get(static_handler))
        .route("/api/state", get(state_handler))
        .route("/api/frame.jpg", get(frame_handler))
        .route("/api/garden", get(garden_handler))
        .route("/api/mode/{mode}", post(mode_handler))
        .route("/api/leave", post(leave_handler))
        .route("/api/camera/{action}", post(camera_handler))
        .route("/api/answer", post(answer_handler))
        .route("/api/recent/clear", post(clear_recent_handler))
        .route("/api/shop/buy", post(buy_handler))
        .route("/api/garden/{action}", post(garden_action_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

fn game_unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "game loop not running").into_response()
}

fn dispatch(state: &AppState, command: Command) -> Response {
    if state.game.send(command) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        game_unavailable()
    }
}

async fn index_handler() -> impl IntoResponse {
    match Assets::get("index.html") {
        Some(content) => Html(content.data.to_vec()).into_response(),
        None => (StatusCode::NOT_FOUND, "index.html not found").into_response(),
    }
}

async fn static_handler(Path(path): Path<String>) -> impl IntoResponse {
    match Assets::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref())],
                content.data.to_vec(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

async fn state_handler(State(state): State<AppState>) -> Response {
    match state.game.snapshot() {
        Some(snapshot) => Json(snapshot).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "snapshot lock error").into_response(),
    }
}

async fn frame_handler(State(state): State<AppState>) -> Response {
    match state.game.preview() {
        Some(jpeg) => (
            [
                (header::CONTENT_TYPE, "image/jpeg"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            jpeg,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "no frame available").into_response(),
    }
}

async fn garden_handler(State(state): State<AppState>) -> Response {
    match state.game.snapshot() {
        Some(snapshot) => Json(snapshot.garden).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "snapshot lock error").into_response(),
    }
}

async fn mode_handler(State(state): State<AppState>, Path(mode): Path<String>) -> Response {
    let mode = match mode.as_str() {
        "free-roam" => GameMode::FreeRoam,
        "mission" => GameMode::Mission,
        _ => return (StatusCode::BAD_REQUEST, "unknown mode").into_response(),
    };
    dispatch(&state, Command::EnterMode(mode))
}

async fn leave_handler(State(state): State<AppState>) -> Response {
    dispatch(&state, Command::LeaveMode)
}

async fn camera_handler(State(state): State<AppState>, Path(action): Path<String>) -> Response {
    let command = match action.as_str() {
        "start" => Command::StartCamera,
        "stop" => Command::StopCamera,
        "switch" => Command::SwitchCamera,
        _ => return (StatusCode::BAD_REQUEST, "unknown camera action").into_response(),
    };
    dispatch(&state, command)
}

async fn answer_handler(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Response {
    let category: Category = match request.category.parse() {
        Ok(c) => c,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("{}", e)).into_response(),
    };

    let (tx, rx) = oneshot::channel();
    if !state.game.send(Command::Answer(category, tx)) {
        return game_unavailable();
    }

    match rx.await {
        Ok(outcome) => Json(AnswerResponse {
            accepted: outcome.is_some(),
            outcome,
        })
        .into_response(),
        Err(_) => game_unavailable(),
    }
}

async fn clear_recent_handler(State(state): State<AppState>) -> Response {
    dispatch(&state, Command::ClearRecent)
}

async fn garden_reply(rx: oneshot::Receiver<GardenView>) -> Response {
    match rx.await {
        Ok(view) => Json(view).into_response(),
        Err(_) => game_unavailable(),
    }
}

async fn buy_handler(State(state): State<AppState>, Json(request): Json<BuyRequest>) -> Response {
    let (tx, rx) = oneshot::channel();
    if !state.game.send(Command::BuyTree(request.tree, tx)) {
        return game_unavailable();
    }
    garden_reply(rx).await
}

async fn garden_action_handler(
    State(state): State<AppState>,
    Path(action): Path<String>,
) -> Response {
    let action = match action.as_str() {
        "plant" => GardenAction::Plant,
        "switch" => GardenAction::Switch,
        "reset" => GardenAction::Reset,
        _ => return (StatusCode::BAD_REQUEST, "unknown garden action").into_response(),
    };

    let (tx, rx) = oneshot::channel();
    if !state.game.send(Command::Garden(action, tx)) {
        return game_unavailable();
    }
    garden_reply(rx).await
}
