mod play;
mod session;

use crate::broadcast::SessionChannel;
use crate::game::Game;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Default per-session event buffer before slow observers start lagging
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// One live session: its state behind a single-writer lock, and its event channel.
///
/// Events are emitted while `game` is locked, so every observer sees them in
/// the order the transitions were applied.
pub struct Session {
    pub(crate) game: Mutex<Game>,
    pub(crate) events: SessionChannel,
}

/// Shared application state: the registry of live sessions
#[derive(Clone)]
pub struct AppState {
    sessions: Arc<RwLock<HashMap<GameCode, Arc<Session>>>>,
    /// Settings applied to newly created sessions
    pub config: GameConfig,
    event_buffer: usize,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(GameConfig::default(), DEFAULT_EVENT_BUFFER)
    }

    pub fn with_config(config: GameConfig, event_buffer: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
            event_buffer: event_buffer.max(1),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
