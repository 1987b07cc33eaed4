use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GameError;

/// Opaque session identifier shared between the two players
pub type GameCode = String;

/// Number of digits in a secret code or a guess
pub const CODE_LENGTH: usize = 4;

/// Smallest allowed digit
pub const MIN_DIGIT: u8 = 1;

/// Largest allowed digit
pub const MAX_DIGIT: u8 = 9;

/// Guesses allowed before the game is lost
pub const MAX_ATTEMPTS: usize = 10;

/// Hint budget granted to a fresh session
pub const DEFAULT_MAX_HINTS: u8 = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Setup,
    Transition,
    Guessing,
    GameOver,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GamePhase::Setup => "SETUP",
            GamePhase::Transition => "TRANSITION",
            GamePhase::Guessing => "GUESSING",
            GamePhase::GameOver => "GAME_OVER",
        };
        f.write_str(name)
    }
}

/// A validated 4-digit sequence with every digit in `1..=9`.
///
/// Used both for the secret and for guesses. Serializes as a plain JSON
/// array of integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<i64>")]
pub struct Code([u8; CODE_LENGTH]);

impl Code {
    /// Validate raw digits as received from a client
    pub fn parse(raw: &[i64]) -> Result<Self, GameError> {
        if raw.len() != CODE_LENGTH {
            return Err(GameError::Validation(format!(
                "Code must be exactly {} digits, got {}",
                CODE_LENGTH,
                raw.len()
            )));
        }

        let mut digits = [0u8; CODE_LENGTH];
        for (slot, &value) in digits.iter_mut().zip(raw) {
            if value < MIN_DIGIT as i64 || value > MAX_DIGIT as i64 {
                return Err(GameError::Validation(format!(
                    "Each digit must be an integer between {} and {}, got {}",
                    MIN_DIGIT, MAX_DIGIT, value
                )));
            }
            *slot = value as u8;
        }

        Ok(Self(digits))
    }

    pub fn digits(&self) -> &[u8; CODE_LENGTH] {
        &self.0
    }

    pub fn digit(&self, position: usize) -> Option<u8> {
        self.0.get(position).copied()
    }
}

impl TryFrom<Vec<i64>> for Code {
    type Error = GameError;

    fn try_from(raw: Vec<i64>) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<Code> for Vec<i64> {
    fn from(code: Code) -> Self {
        code.0.iter().map(|&d| d as i64).collect()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.0 {
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

/// Per-session settings fixed at creation time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    pub max_hints: u8,
    /// Guessing time limit in seconds (None = unlimited)
    pub time_limit: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_hints: DEFAULT_MAX_HINTS,
            time_limit: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Guess {
    /// 1-based, assigned in submission order
    pub id: u32,
    #[serde(rename = "guess")]
    pub digits: Code,
    pub well_placed: u8,
    pub misplaced: u8,
}

/// A revealed `(position, digit)` pair of the secret
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hint {
    pub position: usize,
    pub digit: u8,
}

/// A hint as announced to players, with the budget left after granting it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HintReveal {
    pub position: usize,
    pub digit: u8,
    pub hints_remaining: u8,
}

impl From<HintReveal> for Hint {
    fn from(h: HintReveal) -> Self {
        Self {
            position: h.position,
            digit: h.digit,
        }
    }
}

/// Full session state as shown to players.
///
/// `secret_code` is only populated once the game is over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub game_code: GameCode,
    pub game_phase: GamePhase,
    pub guesses: Vec<Guess>,
    pub max_attempts: usize,
    pub is_victory: Option<bool>,
    pub max_hints: u8,
    pub hints_remaining: u8,
    pub revealed_hints: Vec<Hint>,
    pub time_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_code: Option<Code>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerInfo {
    pub elapsed_time: Option<f64>,
    pub time_limit: Option<u64>,
    pub is_expired: bool,
    pub time_remaining: Option<f64>,
}
