//! Server configuration from environment variables

use std::net::SocketAddr;
use std::str::FromStr;

use crate::state::DEFAULT_EVENT_BUFFER;
use crate::types::{GameConfig, CODE_LENGTH, DEFAULT_MAX_HINTS};

pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Applied to every newly created game
    pub game: GameConfig,
    /// Per-game broadcast buffer size
    pub event_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            game: GameConfig::default(),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

/// Parse an env var, warning and falling back to `None` on garbage
fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var = name, value = raw, "Ignoring invalid value");
            None
        }
    }
}

impl ServerConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind = parse_var("CODEBREAKER_BIND").unwrap_or(defaults.bind);

        let max_hints = match parse_var::<u8>("CODEBREAKER_MAX_HINTS") {
            Some(n) if n as usize <= CODE_LENGTH => n,
            Some(n) => {
                tracing::warn!(
                    max_hints = n,
                    "CODEBREAKER_MAX_HINTS must be at most {}, using default {}",
                    CODE_LENGTH,
                    DEFAULT_MAX_HINTS
                );
                DEFAULT_MAX_HINTS
            }
            None => DEFAULT_MAX_HINTS,
        };

        let time_limit = parse_var::<u64>("CODEBREAKER_TIME_LIMIT_SECS").filter(|&s| s > 0);

        let event_buffer = parse_var::<usize>("CODEBREAKER_EVENT_BUFFER")
            .filter(|&n| n > 0)
            .unwrap_or(defaults.event_buffer);

        tracing::info!(
            %bind,
            max_hints,
            time_limit = ?time_limit,
            event_buffer,
            "Config loaded"
        );

        Self {
            bind,
            game: GameConfig {
                max_hints,
                time_limit,
            },
            event_buffer,
        }
    }
}
