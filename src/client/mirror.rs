use crate::protocol::ServerMessage;
use crate::types::*;

/// Local copy of a session, rebuilt from a snapshot and kept current by
/// applying events in order.
///
/// Events are idempotent against the state they were emitted from: a guess id
/// or hint position the mirror already holds is not added twice.
#[derive(Debug, Clone, PartialEq)]
pub struct GameMirror {
    pub game_code: GameCode,
    pub game_phase: GamePhase,
    pub guesses: Vec<Guess>,
    pub max_attempts: usize,
    pub is_victory: Option<bool>,
    pub max_hints: u8,
    pub hints_remaining: u8,
    pub revealed_hints: Vec<Hint>,
    pub time_limit: Option<u64>,
    pub secret_code: Option<Code>,
    /// Whether a snapshot has been received since the mirror was created
    pub synced: bool,
}

impl GameMirror {
    pub fn new(game_code: impl Into<GameCode>) -> Self {
        Self {
            game_code: game_code.into(),
            game_phase: GamePhase::Setup,
            guesses: Vec::new(),
            max_attempts: MAX_ATTEMPTS,
            is_victory: None,
            max_hints: DEFAULT_MAX_HINTS,
            hints_remaining: DEFAULT_MAX_HINTS,
            revealed_hints: Vec::new(),
            time_limit: None,
            secret_code: None,
            synced: false,
        }
    }

    pub fn from_snapshot(snapshot: &GameSnapshot) -> Self {
        Self {
            game_code: snapshot.game_code.clone(),
            game_phase: snapshot.game_phase,
            guesses: snapshot.guesses.clone(),
            max_attempts: snapshot.max_attempts,
            is_victory: snapshot.is_victory,
            max_hints: snapshot.max_hints,
            hints_remaining: snapshot.hints_remaining,
            revealed_hints: snapshot.revealed_hints.clone(),
            time_limit: snapshot.time_limit,
            secret_code: snapshot.secret_code,
            synced: true,
        }
    }

    pub fn apply(&mut self, msg: &ServerMessage) {
        match msg {
            ServerMessage::Connected(snapshot) => *self = Self::from_snapshot(snapshot),
            ServerMessage::SecretCodeSet { game_phase }
            | ServerMessage::GuessingStarted { game_phase } => {
                self.game_phase = *game_phase;
            }
            ServerMessage::GuessSubmitted {
                guess,
                game_phase,
                is_victory,
            } => {
                if !self.guesses.iter().any(|g| g.id == guess.id) {
                    self.guesses.push(guess.clone());
                }
                self.game_phase = *game_phase;
                self.is_victory = *is_victory;
            }
            ServerMessage::HintUsed { hint } => {
                if !self
                    .revealed_hints
                    .iter()
                    .any(|h| h.position == hint.position)
                {
                    self.revealed_hints.push(Hint::from(*hint));
                }
                self.hints_remaining = hint.hints_remaining;
            }
            ServerMessage::GameReset { game_phase } => {
                self.game_phase = *game_phase;
                self.guesses.clear();
                self.is_victory = None;
                self.hints_remaining = self.max_hints;
                self.revealed_hints.clear();
                self.secret_code = None;
            }
        }
    }

    pub fn attempts_left(&self) -> usize {
        self.max_attempts.saturating_sub(self.guesses.len())
    }
}
