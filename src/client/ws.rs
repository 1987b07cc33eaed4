use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};

use super::sync::{Connector, EventStream};
use super::{ClientError, ClientResult};
use crate::protocol::ServerMessage;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to a server's `/ws/{code}` event stream
#[derive(Debug, Clone)]
pub struct WsConnector {
    base_url: String,
}

impl WsConnector {
    /// `base_url` is the server root; `http(s)://` is rewritten to `ws(s)://`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = match base_url.strip_prefix("http") {
            Some(rest) => format!("ws{}", rest),
            None => base_url,
        };
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, game_code: &str) -> String {
        format!("{}/ws/{}", self.base_url, game_code)
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, game_code: &str) -> ClientResult<Box<dyn EventStream>> {
        let url = self.url_for(game_code);
        let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))?;

        tracing::debug!(%url, "Event stream opened");
        Ok(Box::new(WsStream { socket }))
    }
}

/// Server events read off one WebSocket
struct WsStream {
    socket: Socket,
}

#[async_trait]
impl EventStream for WsStream {
    async fn recv(&mut self) -> Option<ClientResult<ServerMessage>> {
        loop {
            match self.socket.next().await? {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(msg) => return Some(Ok(msg)),
                    Err(e) => {
                        tracing::warn!("Ignoring undecodable frame: {}", e);
                    }
                },
                Ok(Message::Close(_)) => return None,
                // Pings are answered by tungstenite itself
                Ok(_) => {}
                Err(e) => return Some(Err(ClientError::Connect(e.to_string()))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_base_becomes_ws() {
        let connector = WsConnector::new("http://127.0.0.1:8000/");
        assert_eq!(connector.url_for("AB12CD"), "ws://127.0.0.1:8000/ws/AB12CD");

        let connector = WsConnector::new("https://codes.example");
        assert_eq!(connector.url_for("AB12CD"), "wss://codes.example/ws/AB12CD");

        let connector = WsConnector::new("ws://localhost:9000");
        assert_eq!(connector.url_for("X"), "ws://localhost:9000/ws/X");
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let connector = WsConnector::new(format!("ws://{}", addr));
        assert!(matches!(
            connector.connect("AB12CD").await,
            Err(ClientError::Connect(_))
        ));
    }
}
