use super::{AppState, Session};
use crate::broadcast::SessionChannel;
use crate::error::{GameError, GameResult};
use crate::game::Game;
use crate::types::*;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;

const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const GAME_CODE_LENGTH: usize = 6;

/// Generate a random game code (6 uppercase letters/digits)
fn generate_game_code() -> String {
    let mut rng = rand::rng();
    (0..GAME_CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

impl AppState {
    /// Create a new session in SETUP and return its code
    pub async fn create_game(&self) -> GameCode {
        let mut sessions = self.sessions.write().await;

        // Re-draw on collision with a live session
        let code = loop {
            let code = generate_game_code();
            if !sessions.contains_key(&code) {
                break code;
            }
        };

        let session = Session {
            game: Mutex::new(Game::new(code.clone(), self.config.clone())),
            events: SessionChannel::new(self.event_buffer),
        };
        sessions.insert(code.clone(), Arc::new(session));

        tracing::info!(game_code = %code, live_games = sessions.len(), "Game created");
        code
    }

    /// Look up a live session
    pub(crate) async fn session(&self, code: &str) -> GameResult<Arc<Session>> {
        self.sessions
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or(GameError::NotFound)
    }

    /// Current state as players may see it
    pub async fn get_game(&self, code: &str) -> GameResult<GameSnapshot> {
        let session = self.session(code).await?;
        let game = session.game.lock().await;
        Ok(game.snapshot())
    }

    pub async fn game_exists(&self, code: &str) -> bool {
        self.sessions.read().await.contains_key(code)
    }

    pub async fn game_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop a session; attached observers see their stream end
    pub async fn delete_game(&self, code: &str) -> GameResult<()> {
        let removed = self.sessions.write().await.remove(code);
        match removed {
            Some(_) => {
                tracing::info!(game_code = code, "Game deleted");
                Ok(())
            }
            None => Err(GameError::NotFound),
        }
    }
}
