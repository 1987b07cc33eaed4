use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::{IntoResponse, Response},
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use std::sync::Arc;

use crate::broadcast::{RecvError, Subscription};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;

/// WebSocket upgrade handler for `/ws/{game_code}`.
///
/// The observer is attached before the upgrade so no event emitted in
/// between is lost; unknown codes are rejected with 404.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(game_code): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let subscription = match state.attach(&game_code).await {
        Ok(sub) => sub,
        Err(e) => {
            tracing::info!(game_code = %game_code, "WebSocket rejected: {}", e);
            return e.into_response();
        }
    };

    tracing::info!(game_code = %game_code, "WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, game_code, subscription, state))
}

async fn send_json(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await,
        Err(e) => {
            tracing::error!("Failed to serialize {}: {}", msg.kind(), e);
            Ok(())
        }
    }
}

/// Pump session events to one socket until either side goes away
async fn handle_socket(
    socket: WebSocket,
    game_code: String,
    mut subscription: Subscription,
    state: Arc<AppState>,
) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = subscription.next() => {
                match event {
                    Ok(msg) => {
                        if send_json(&mut sender, &msg).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Start over from a fresh snapshot rather than replay a gap
                        tracing::warn!(game_code = %game_code, skipped, "Observer lagged, resyncing");
                        match state.attach(&game_code).await {
                            Ok(fresh) => subscription = fresh,
                            Err(_) => break,
                        }
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!(game_code = %game_code, "Game closed, ending stream");
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    }
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Resync) => {
                                match state.attach(&game_code).await {
                                    Ok(fresh) => subscription = fresh,
                                    Err(_) => break,
                                }
                            }
                            Err(e) => {
                                tracing::debug!(game_code = %game_code, "Ignoring client message: {}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(game_code = %game_code, "WebSocket error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    tracing::info!(game_code = %game_code, "WebSocket connection closed");
}
