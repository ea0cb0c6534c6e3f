//! HTTP client for the order-management backend
//!
//! The backend is a single script endpoint: every action is a POST of a JSON
//! body (sent as `text/plain`) that carries an `action` discriminator and the
//! device token, and every answer is a flat `{"status": ...}` envelope.

use crate::submitter::{OrderSubmitter, SubmitOutcome};
use crate::sync::ReachabilityProbe;
use crate::{ClientConfig, ClientError, ClientResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use shared::order::{ACTION_FETCH_DAILY_DATA, ACTION_SAVE_DAILY_MENU};
use shared::{BackendResponse, DailyData, OrderPayload};
use std::sync::Arc;
use std::time::Duration;

type JsonMap = serde_json::Map<String, serde_json::Value>;

const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for the backend endpoint
///
/// Clones share the device token, so a token set by the operator is picked
/// up by the sync engine's copy as well.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    endpoint: String,
    token: Arc<RwLock<Option<String>>>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint_url.clone(),
            token: Arc::new(RwLock::new(config.token.clone())),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Set the device token
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    /// Get the current token
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// POST an action and decode the envelope
    async fn post_action<T: DeserializeOwned>(
        &self,
        payload: &OrderPayload,
    ) -> ClientResult<BackendResponse<T>> {
        let token = self.token().ok_or(ClientError::Unauthorized)?;
        tracing::debug!(action = payload.action_name().unwrap_or_default(), "POST action");
        let body = serde_json::to_vec(&payload.with_token(&token))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    // ========== Daily Data API ==========

    /// Fetch catalog, today's menu and known delivery destinations
    pub async fn fetch_daily_data(&self) -> ClientResult<DailyData> {
        let response = self
            .post_action::<DailyData>(&OrderPayload::action(ACTION_FETCH_DAILY_DATA))
            .await?;

        if !response.is_success() {
            return Err(ClientError::Rejected(response.failure_message()));
        }
        Ok(response.data)
    }

    /// Replace today's menu with the given dish names
    pub async fn save_daily_menu(&self, dishes: &[String]) -> ClientResult<()> {
        let payload = OrderPayload::action(ACTION_SAVE_DAILY_MENU).with_field("menus", dishes);
        let response = self.post_action::<JsonMap>(&payload).await?;

        if !response.is_success() {
            return Err(ClientError::Rejected(response.failure_message()));
        }
        Ok(())
    }

    /// Whether the endpoint answers at all (any HTTP status counts)
    pub async fn ping(&self) -> bool {
        self.client
            .get(&self.endpoint)
            .timeout(PING_TIMEOUT)
            .send()
            .await
            .is_ok()
    }
}

#[async_trait]
impl OrderSubmitter for HttpClient {
    async fn submit(&self, payload: &OrderPayload) -> ClientResult<SubmitOutcome> {
        let response = self.post_action::<JsonMap>(payload).await?;

        if response.is_success() {
            Ok(SubmitOutcome::Accepted)
        } else {
            Ok(SubmitOutcome::Rejected {
                message: response.failure_message(),
            })
        }
    }
}

#[async_trait]
impl ReachabilityProbe for HttpClient {
    async fn is_reachable(&self) -> bool {
        self.ping().await
    }
}
