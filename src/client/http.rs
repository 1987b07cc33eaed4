use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{ClientError, ClientResult};
use crate::error::ErrorBody;
use crate::protocol::*;
use crate::types::{GameSnapshot, TimerInfo};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Typed wrapper around the REST endpoints
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8000`
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
    }

    fn game_path(code: &str, action: &str) -> String {
        if action.is_empty() {
            format!("/api/games/{}", code)
        } else {
            format!("/api/games/{}/{}", code, action)
        }
    }

    /// Turn a response into `T`, or into `ClientError::Api` with the server's detail
    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.detail)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                });
            return Err(ClientError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    pub async fn health(&self) -> ClientResult<HealthResponse> {
        Self::decode(self.request(Method::GET, "/").send().await?).await
    }

    pub async fn create_game(&self) -> ClientResult<CreateGameResponse> {
        Self::decode(self.request(Method::POST, "/api/games").send().await?).await
    }

    pub async fn get_game(&self, code: &str) -> ClientResult<GameSnapshot> {
        let path = Self::game_path(code, "");
        Self::decode(self.request(Method::GET, &path).send().await?).await
    }

    pub async fn set_secret(&self, code: &str, secret_code: &[i64]) -> ClientResult<PhaseResponse> {
        let body = SetSecretRequest {
            secret_code: secret_code.to_vec(),
        };
        let path = Self::game_path(code, "set-secret");
        Self::decode(self.request(Method::POST, &path).json(&body).send().await?).await
    }

    pub async fn start_guessing(&self, code: &str) -> ClientResult<PhaseResponse> {
        let path = Self::game_path(code, "start-guessing");
        Self::decode(self.request(Method::POST, &path).send().await?).await
    }

    pub async fn submit_guess(&self, code: &str, guess: &[i64]) -> ClientResult<SubmitGuessResponse> {
        let body = SubmitGuessRequest {
            guess: guess.to_vec(),
        };
        let path = Self::game_path(code, "guess");
        Self::decode(self.request(Method::POST, &path).json(&body).send().await?).await
    }

    pub async fn request_hint(&self, code: &str) -> ClientResult<HintResponse> {
        let path = Self::game_path(code, "hint");
        Self::decode(self.request(Method::POST, &path).send().await?).await
    }

    pub async fn reset_game(&self, code: &str) -> ClientResult<PhaseResponse> {
        let path = Self::game_path(code, "reset");
        Self::decode(self.request(Method::POST, &path).send().await?).await
    }

    pub async fn timer(&self, code: &str) -> ClientResult<TimerInfo> {
        let path = Self::game_path(code, "timer");
        Self::decode(self.request(Method::GET, &path).send().await?).await
    }

    pub async fn delete_game(&self, code: &str) -> ClientResult<MessageResponse> {
        let path = Self::game_path(code, "");
        Self::decode(self.request(Method::DELETE, &path).send().await?).await
    }
}
