//! Keeps a [`GameMirror`] in step with a session's event stream.
//!
//! A background task owns the connection. On every (re)connect the server
//! sends a fresh snapshot, so nothing is replayed locally. When the stream
//! drops the task retries with [`ReconnectPolicy`] backoff, one attempt at a
//! time, and gives up with a single `ConnectionLost` once the cap is passed.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch, RwLock};
use tokio::task::JoinHandle;

use super::{ClientError, ClientResult, GameMirror, LinkState, ReconnectPolicy, SyncEvent};
use crate::broadcast::{RecvError, Subscription};
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::GameCode;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Opens event streams for a game code
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, game_code: &str) -> ClientResult<Box<dyn EventStream>>;
}

/// One live connection to a session's events
#[async_trait]
pub trait EventStream: Send {
    /// Next message; `None` once the server has closed the stream
    async fn recv(&mut self) -> Option<ClientResult<ServerMessage>>;
}

/// Connects straight to an in-process [`AppState`]
#[derive(Clone)]
pub struct LocalConnector {
    state: Arc<AppState>,
}

impl LocalConnector {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn connect(&self, game_code: &str) -> ClientResult<Box<dyn EventStream>> {
        let subscription = self
            .state
            .attach(game_code)
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))?;
        Ok(Box::new(subscription))
    }
}

#[async_trait]
impl EventStream for Subscription {
    async fn recv(&mut self) -> Option<ClientResult<ServerMessage>> {
        match self.next().await {
            Ok(msg) => Some(Ok(msg)),
            // Reconnecting yields a fresh snapshot
            Err(RecvError::Lagged(skipped)) => Some(Err(ClientError::Lagged(skipped))),
            Err(RecvError::Closed) => None,
        }
    }
}

/// Handle to a running synchronizer task
pub struct Synchronizer {
    game_code: GameCode,
    mirror: Arc<RwLock<GameMirror>>,
    link: watch::Receiver<LinkState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<ClientResult<()>>>,
}

impl Synchronizer {
    /// Spawn the task and start connecting.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<C: Connector>(
        connector: C,
        game_code: impl Into<GameCode>,
        policy: ReconnectPolicy,
    ) -> (Self, mpsc::Receiver<SyncEvent>) {
        let game_code = game_code.into();
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (link_tx, link_rx) = watch::channel(LinkState::Connecting);
        let mirror = Arc::new(RwLock::new(GameMirror::new(game_code.clone())));

        let worker = Worker {
            connector,
            game_code: game_code.clone(),
            policy,
            mirror: mirror.clone(),
            link: link_tx,
            events: event_tx,
        };
        let task = tokio::spawn(worker.run(shutdown_rx));

        (
            Self {
                game_code,
                mirror,
                link: link_rx,
                shutdown_tx: Some(shutdown_tx),
                task: Some(task),
            },
            event_rx,
        )
    }

    pub fn game_code(&self) -> &str {
        &self.game_code
    }

    /// Copy of the mirror as of now
    pub async fn mirror(&self) -> GameMirror {
        self.mirror.read().await.clone()
    }

    pub fn link_state(&self) -> LinkState {
        *self.link.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.link_state() == LinkState::Connected
    }

    /// Stop the task and close the connection. Calling it again is a no-op.
    pub async fn disconnect(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut task).await.is_err() {
                tracing::warn!(
                    game_code = %self.game_code,
                    "Synchronizer did not stop in time, aborting"
                );
                task.abort();
            }
        }
    }

    /// Wait for the task to end on its own.
    ///
    /// Returns `ClientError::ConnectionLost` when it gave up reconnecting.
    pub async fn closed(&mut self) -> ClientResult<()> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        match task.await {
            Ok(result) => result,
            Err(e) => Err(ClientError::Connect(format!("synchronizer task failed: {e}"))),
        }
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

enum StreamEnd {
    Shutdown,
    Lost(String),
}

struct Worker<C> {
    connector: C,
    game_code: GameCode,
    policy: ReconnectPolicy,
    mirror: Arc<RwLock<GameMirror>>,
    link: watch::Sender<LinkState>,
    events: mpsc::Sender<SyncEvent>,
}

impl<C: Connector> Worker<C> {
    async fn run(self, mut shutdown: oneshot::Receiver<()>) -> ClientResult<()> {
        let mut attempt: u32 = 0;

        loop {
            let connected = tokio::select! {
                _ = &mut shutdown => {
                    self.close();
                    return Ok(());
                }
                result = self.connector.connect(&self.game_code) => result,
            };

            match connected {
                Ok(mut stream) => {
                    attempt = 0;
                    self.link.send_replace(LinkState::Connected);
                    tracing::info!(game_code = %self.game_code, "Synchronizer connected");
                    self.emit_status(SyncEvent::Connected).await;

                    match self.pump(stream.as_mut(), &mut shutdown).await {
                        StreamEnd::Shutdown => {
                            self.close();
                            return Ok(());
                        }
                        StreamEnd::Lost(reason) => {
                            tracing::warn!(game_code = %self.game_code, %reason, "Event stream lost");
                            self.emit_status(SyncEvent::Disconnected { reason }).await;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(game_code = %self.game_code, attempt, error = %e, "Connect failed");
                }
            }

            attempt += 1;
            if self.policy.exhausted(attempt) {
                let attempts = self.policy.max_attempts;
                self.link.send_replace(LinkState::Failed);
                tracing::error!(game_code = %self.game_code, attempts, "Giving up reconnecting");
                self.emit_status(SyncEvent::ConnectionLost { attempts }).await;
                return Err(ClientError::ConnectionLost { attempts });
            }

            let delay = self.policy.delay_for(attempt);
            self.link.send_replace(LinkState::Reconnecting { attempt });
            tracing::debug!(game_code = %self.game_code, attempt, ?delay, "Reconnecting");
            self.emit_status(SyncEvent::Reconnecting { attempt, delay }).await;

            tokio::select! {
                _ = &mut shutdown => {
                    self.close();
                    return Ok(());
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn pump(
        &self,
        stream: &mut dyn EventStream,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> StreamEnd {
        loop {
            tokio::select! {
                _ = &mut *shutdown => return StreamEnd::Shutdown,
                next = stream.recv() => match next {
                    Some(Ok(msg)) => {
                        self.mirror.write().await.apply(&msg);
                        self.emit(SyncEvent::Applied(msg));
                    }
                    Some(Err(e)) => return StreamEnd::Lost(e.to_string()),
                    None => return StreamEnd::Lost("stream closed by server".to_string()),
                },
            }
        }
    }

    fn close(&self) {
        self.link.send_replace(LinkState::Closed);
        tracing::debug!(game_code = %self.game_code, "Synchronizer stopped");
    }

    /// State updates may be dropped under backpressure; the mirror stays current
    fn emit(&self, event: SyncEvent) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.events.try_send(event) {
            tracing::warn!(game_code = %self.game_code, "Sync event channel full, dropping update");
        }
    }

    /// Connectivity changes are always delivered
    async fn emit_status(&self, event: SyncEvent) {
        let _ = self.events.send(event).await;
    }
}
