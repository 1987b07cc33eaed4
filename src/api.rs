//! HTTP API endpoints for game sessions.
//!
//! Every handler is a thin wrapper around one [`AppState`] operation; errors
//! are rendered by `GameError`'s `IntoResponse`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::error::GameResult;
use crate::protocol::*;
use crate::state::AppState;
use crate::types::{GameSnapshot, TimerInfo};
use crate::ws;

/// All routes, without middleware layers
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/games", post(create_game))
        .route("/api/games/{code}", get(get_game).delete(delete_game))
        .route("/api/games/{code}/set-secret", post(set_secret))
        .route("/api/games/{code}/start-guessing", post(start_guessing))
        .route("/api/games/{code}/guess", post(submit_guess))
        .route("/api/games/{code}/hint", post(request_hint))
        .route("/api/games/{code}/reset", post(reset_game))
        .route("/api/games/{code}/timer", get(get_timer))
        .route("/ws/{code}", get(ws::ws_handler))
        .with_state(state)
}

/// Health check.
///
/// GET /
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Code Breaker API is running".to_string(),
    })
}

/// Create a new game.
///
/// POST /api/games
pub async fn create_game(
    State(state): State<Arc<AppState>>,
) -> Json<CreateGameResponse> {
    let game_code = state.create_game().await;
    Json(CreateGameResponse {
        game_code,
        message: "Game created successfully. Share this code with the other player.".to_string(),
    })
}

/// Current game state. The secret is only included once the game is over.
///
/// GET /api/games/{code}
pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> GameResult<Json<GameSnapshot>> {
    Ok(Json(state.get_game(&code).await?))
}

/// POST /api/games/{code}/set-secret
pub async fn set_secret(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    body: Result<Json<SetSecretRequest>, JsonRejection>,
) -> GameResult<Json<PhaseResponse>> {
    let Json(req) = body?;
    let game_phase = state.set_secret(&code, &req.secret_code).await?;
    Ok(Json(PhaseResponse {
        message: "Secret code set successfully".to_string(),
        game_phase,
    }))
}

/// POST /api/games/{code}/start-guessing
pub async fn start_guessing(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> GameResult<Json<PhaseResponse>> {
    let game_phase = state.start_guessing(&code).await?;
    Ok(Json(PhaseResponse {
        message: "Guessing phase started".to_string(),
        game_phase,
    }))
}

/// POST /api/games/{code}/guess
pub async fn submit_guess(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    body: Result<Json<SubmitGuessRequest>, JsonRejection>,
) -> GameResult<Json<SubmitGuessResponse>> {
    let Json(req) = body?;
    let outcome = state.submit_guess(&code, &req.guess).await?;
    Ok(Json(SubmitGuessResponse {
        guess: outcome.guess,
        game_phase: outcome.phase,
        is_victory: outcome.is_victory,
    }))
}

/// POST /api/games/{code}/hint
pub async fn request_hint(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> GameResult<Json<HintResponse>> {
    let hint = state.request_hint(&code).await?;
    Ok(Json(HintResponse {
        message: "Hint revealed".to_string(),
        hint,
    }))
}

/// Reset to SETUP, keeping the game code.
///
/// POST /api/games/{code}/reset
pub async fn reset_game(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> GameResult<Json<PhaseResponse>> {
    let game_phase = state.reset_game(&code).await?;
    Ok(Json(PhaseResponse {
        message: "Game reset successfully".to_string(),
        game_phase,
    }))
}

/// GET /api/games/{code}/timer
pub async fn get_timer(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> GameResult<Json<TimerInfo>> {
    Ok(Json(state.timer(&code).await?))
}

/// DELETE /api/games/{code}
pub async fn delete_game(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> GameResult<Json<MessageResponse>> {
    state.delete_game(&code).await?;
    Ok(Json(MessageResponse {
        message: "Game deleted successfully".to_string(),
    }))
}
