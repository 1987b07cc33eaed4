//! Wire contract shared by the server and the client synchronizer.

use crate::types::*;
use serde::{Deserialize, Serialize};

/// Events on a session's stream, tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Full current state, sent first on every (re)attach
    Connected(GameSnapshot),
    SecretCodeSet {
        game_phase: GamePhase,
    },
    GuessingStarted {
        game_phase: GamePhase,
    },
    GuessSubmitted {
        guess: Guess,
        game_phase: GamePhase,
        is_victory: Option<bool>,
    },
    HintUsed {
        hint: HintReveal,
    },
    GameReset {
        game_phase: GamePhase,
    },
}

impl ServerMessage {
    /// Wire name of the event, as found in the `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Connected(_) => "connected",
            ServerMessage::SecretCodeSet { .. } => "secret_code_set",
            ServerMessage::GuessingStarted { .. } => "guessing_started",
            ServerMessage::GuessSubmitted { .. } => "guess_submitted",
            ServerMessage::HintUsed { .. } => "hint_used",
            ServerMessage::GameReset { .. } => "game_reset",
        }
    }
}

/// Messages a client may send on the event stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for a fresh `connected` snapshot
    Resync,
}

// ========== REST bodies ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSecretRequest {
    pub secret_code: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitGuessRequest {
    pub guess: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameResponse {
    pub game_code: GameCode,
    pub message: String,
}

/// Reply to phase-changing requests without a payload of their own
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseResponse {
    pub message: String,
    pub game_phase: GamePhase,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitGuessResponse {
    pub guess: Guess,
    pub game_phase: GamePhase,
    pub is_victory: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintResponse {
    pub message: String,
    #[serde(flatten)]
    pub hint: HintReveal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}
