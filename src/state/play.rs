use super::AppState;
use crate::error::GameResult;
use crate::game::GuessOutcome;
use crate::protocol::ServerMessage;
use crate::types::*;

impl AppState {
    /// Store the secret code (SETUP → TRANSITION)
    pub async fn set_secret(&self, code: &str, digits: &[i64]) -> GameResult<GamePhase> {
        let session = self.session(code).await?;
        let mut game = session.game.lock().await;

        game.set_secret(digits)?;
        let phase = game.phase();
        session
            .events
            .emit(ServerMessage::SecretCodeSet { game_phase: phase });

        tracing::info!(game_code = code, phase = %phase, "Secret code set");
        Ok(phase)
    }

    /// TRANSITION → GUESSING, starting the clock
    pub async fn start_guessing(&self, code: &str) -> GameResult<GamePhase> {
        let session = self.session(code).await?;
        let mut game = session.game.lock().await;

        game.start_guessing(chrono::Utc::now())?;
        let phase = game.phase();
        session
            .events
            .emit(ServerMessage::GuessingStarted { game_phase: phase });

        tracing::info!(game_code = code, "Guessing started");
        Ok(phase)
    }

    /// Score and record a guess
    pub async fn submit_guess(&self, code: &str, digits: &[i64]) -> GameResult<GuessOutcome> {
        let session = self.session(code).await?;
        let mut game = session.game.lock().await;

        let outcome = game.submit_guess(digits, chrono::Utc::now())?;
        session.events.emit(ServerMessage::GuessSubmitted {
            guess: outcome.guess.clone(),
            game_phase: outcome.phase,
            is_victory: outcome.is_victory,
        });

        tracing::info!(
            game_code = code,
            guess_id = outcome.guess.id,
            well_placed = outcome.guess.well_placed,
            misplaced = outcome.guess.misplaced,
            phase = %outcome.phase,
            "Guess submitted"
        );
        Ok(outcome)
    }

    /// Reveal one digit of the secret
    pub async fn request_hint(&self, code: &str) -> GameResult<HintReveal> {
        let session = self.session(code).await?;
        let mut game = session.game.lock().await;

        let hint = game.request_hint(&mut rand::rng())?;
        session.events.emit(ServerMessage::HintUsed { hint });

        tracing::info!(
            game_code = code,
            position = hint.position,
            hints_remaining = hint.hints_remaining,
            "Hint revealed"
        );
        Ok(hint)
    }

    /// Back to SETUP from any phase
    pub async fn reset_game(&self, code: &str) -> GameResult<GamePhase> {
        let session = self.session(code).await?;
        let mut game = session.game.lock().await;

        let previous = game.phase();
        game.reset();
        let phase = game.phase();
        session
            .events
            .emit(ServerMessage::GameReset { game_phase: phase });

        tracing::info!(game_code = code, from = %previous, "Game reset");
        Ok(phase)
    }

    pub async fn timer(&self, code: &str) -> GameResult<TimerInfo> {
        let session = self.session(code).await?;
        let game = session.game.lock().await;
        Ok(game.timer(chrono::Utc::now()))
    }
}
