//! Per-session event fan-out.
//!
//! Each session owns one broadcast channel. Observers attach by subscribing
//! to it; the subscription is taken under the session lock together with a
//! snapshot, so the observer starts from a `connected` message and then sees
//! every later event exactly once and in emission order.

use crate::error::GameResult;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::RecvError;

/// Sending half of a session's event stream
pub struct SessionChannel {
    tx: broadcast::Sender<ServerMessage>,
}

impl SessionChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Deliver to every attached observer
    pub fn emit(&self, msg: ServerMessage) {
        // No observers attached is fine
        let delivered = self.tx.send(msg).unwrap_or(0);
        tracing::trace!(observers = delivered, "Event emitted");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.tx.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// One observer's view of a session: the snapshot, then live events
pub struct Subscription {
    snapshot: Option<ServerMessage>,
    rx: broadcast::Receiver<ServerMessage>,
}

impl Subscription {
    /// Next message for this observer.
    ///
    /// Yields the `connected` snapshot first. `RecvError::Lagged` means the
    /// observer fell behind and should be resynchronised from a fresh
    /// snapshot; `RecvError::Closed` means the session is gone.
    pub async fn next(&mut self) -> Result<ServerMessage, RecvError> {
        if let Some(snapshot) = self.snapshot.take() {
            return Ok(snapshot);
        }
        self.rx.recv().await
    }
}

impl AppState {
    /// Attach an observer to a session
    pub async fn attach(&self, code: &str) -> GameResult<Subscription> {
        let session = self.session(code).await?;
        let game = session.game.lock().await;

        let rx = session.events.subscribe();
        let snapshot = ServerMessage::Connected(game.snapshot());

        tracing::debug!(
            game_code = code,
            observers = session.events.observer_count(),
            "Observer attached"
        );
        Ok(Subscription {
            snapshot: Some(snapshot),
            rx,
        })
    }

    /// A fresh `connected` message for an observer that needs to resync
    pub async fn snapshot_message(&self, code: &str) -> GameResult<ServerMessage> {
        Ok(ServerMessage::Connected(self.get_game(code).await?))
    }

    pub async fn observer_count(&self, code: &str) -> GameResult<usize> {
        Ok(self.session(code).await?.events.observer_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GamePhase, Hint};

    #[tokio::test]
    async fn test_attach_sends_snapshot_first() {
        let state = AppState::new();
        let code = state.create_game().await;

        let mut sub = state.attach(&code).await.unwrap();
        match sub.next().await.unwrap() {
            ServerMessage::Connected(snapshot) => {
                assert_eq!(snapshot.game_code, code);
                assert_eq!(snapshot.game_phase, GamePhase::Setup);
            }
            other => panic!("Expected connected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_late_joiner_gets_history_in_snapshot() {
        let state = AppState::new();
        let code = state.create_game().await;
        state.set_secret(&code, &[1, 2, 3, 4]).await.unwrap();
        state.start_guessing(&code).await.unwrap();
        for guess in [[5, 6, 7, 8], [4, 3, 2, 1], [1, 2, 4, 3]] {
            state.submit_guess(&code, &guess).await.unwrap();
        }
        let hint = state.request_hint(&code).await.unwrap();

        let mut sub = state.attach(&code).await.unwrap();
        let ServerMessage::Connected(snapshot) = sub.next().await.unwrap() else {
            panic!("Expected connected");
        };

        assert_eq!(snapshot.game_phase, GamePhase::Guessing);
        let ids: Vec<u32> = snapshot.guesses.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(snapshot.guesses[2].well_placed, 2);
        assert_eq!(snapshot.guesses[2].misplaced, 2);
        assert_eq!(snapshot.revealed_hints, vec![Hint::from(hint)]);
        assert_eq!(snapshot.hints_remaining, 1);
    }

    #[tokio::test]
    async fn test_all_observers_see_same_order() {
        let state = AppState::new();
        let code = state.create_game().await;
        let mut a = state.attach(&code).await.unwrap();
        let mut b = state.attach(&code).await.unwrap();
        assert_eq!(state.observer_count(&code).await.unwrap(), 2);

        state.set_secret(&code, &[1, 2, 3, 4]).await.unwrap();
        state.start_guessing(&code).await.unwrap();
        state.submit_guess(&code, &[1, 1, 1, 1]).await.unwrap();

        let mut seen_a = Vec::new();
        let mut seen_b = Vec::new();
        for _ in 0..4 {
            seen_a.push(a.next().await.unwrap());
            seen_b.push(b.next().await.unwrap());
        }
        assert_eq!(seen_a, seen_b);
    }

    #[tokio::test]
    async fn test_detached_observer_is_dropped_silently() {
        let state = AppState::new();
        let code = state.create_game().await;
        let mut stay = state.attach(&code).await.unwrap();
        let leave = state.attach(&code).await.unwrap();
        drop(leave);
        assert_eq!(state.observer_count(&code).await.unwrap(), 1);

        state.set_secret(&code, &[1, 2, 3, 4]).await.unwrap();
        let _ = stay.next().await.unwrap();
        assert!(matches!(
            stay.next().await.unwrap(),
            ServerMessage::SecretCodeSet { .. }
        ));
    }

    #[tokio::test]
    async fn test_stream_closes_when_game_deleted() {
        let state = AppState::new();
        let code = state.create_game().await;
        let mut sub = state.attach(&code).await.unwrap();
        let _ = sub.next().await.unwrap();

        state.delete_game(&code).await.unwrap();
        assert!(matches!(sub.next().await, Err(RecvError::Closed)));
    }

    #[tokio::test]
    async fn test_slow_observer_lags() {
        let state = AppState::with_config(Default::default(), 2);
        let code = state.create_game().await;
        let mut sub = state.attach(&code).await.unwrap();
        let _ = sub.next().await.unwrap();

        state.set_secret(&code, &[1, 2, 3, 4]).await.unwrap();
        state.start_guessing(&code).await.unwrap();
        for _ in 0..3 {
            state.submit_guess(&code, &[9, 9, 9, 9]).await.unwrap();
        }

        assert!(matches!(sub.next().await, Err(RecvError::Lagged(_))));
        let fresh = state.snapshot_message(&code).await.unwrap();
        let ServerMessage::Connected(snapshot) = fresh else {
            panic!("Expected connected");
        };
        assert_eq!(snapshot.guesses.len(), 3);
    }
}
