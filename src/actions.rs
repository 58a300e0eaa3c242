//! Remote Action Dispatcher
//!
//! Best-effort authenticated POSTs used for background acknowledgements. Nothing is
//! retried; the caller learns whether the action landed and nothing more.

use crate::error::{AccessError, StorageError};
use crate::host::HostMetadata;
use crate::token::TokenService;
use crate::transport::{HttpRequest, HttpTransport, Method, ACTION_TIMEOUT};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const REJECT_CALL_ENDPOINT: &str = "calls/reject";

pub fn acknowledge_message_endpoint(message_id: &str) -> String {
    format!("whisper-messages/{}/received", message_id)
}

/// Result of one remote action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// 2xx response
    Delivered { status: u16 },
    /// Non-2xx response
    Rejected { status: u16 },
    TransportFailed(String),
    /// Nothing was sent: no container, no token, or no base address
    Unavailable(String),
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Delivered { .. })
    }

    fn from_status(status: u16) -> Self {
        if (200..300).contains(&status) {
            ActionOutcome::Delivered { status }
        } else {
            ActionOutcome::Rejected { status }
        }
    }
}

pub struct RemoteActionDispatcher {
    host: Arc<dyn HostMetadata>,
    tokens: Arc<TokenService>,
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl RemoteActionDispatcher {
    pub fn new(
        host: Arc<dyn HostMetadata>,
        tokens: Arc<TokenService>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            host,
            tokens,
            transport,
            timeout: ACTION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the authenticated request for `endpoint`, failing closed when the base
    /// address or the token is unavailable.
    pub fn build_request(
        &self,
        endpoint: &str,
        parameters: &Map<String, Value>,
        host_app_id: &str,
    ) -> Result<HttpRequest, AccessError> {
        let base = self.base_url(host_app_id)?;
        let token = self.tokens.try_get_token(host_app_id)?;
        self.authenticated_post(&base, endpoint, parameters, &token)
    }

    pub async fn send_action(
        &self,
        endpoint: &str,
        parameters: &Map<String, Value>,
        host_app_id: &str,
    ) -> ActionOutcome {
        let request = match self.prepare(endpoint, parameters, host_app_id).await {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(host_app_id, endpoint, error = %e, "Remote action not sent");
                return ActionOutcome::Unavailable(e.to_string());
            }
        };

        let outcome = match self.transport.send(request).await {
            Ok(status) => ActionOutcome::from_status(status),
            Err(e) => ActionOutcome::TransportFailed(e.to_string()),
        };
        match &outcome {
            ActionOutcome::Delivered { status } => {
                tracing::debug!(host_app_id, endpoint, status, "Remote action delivered")
            }
            other => tracing::warn!(host_app_id, endpoint, outcome = ?other, "Remote action failed"),
        }
        outcome
    }

    async fn prepare(
        &self,
        endpoint: &str,
        parameters: &Map<String, Value>,
        host_app_id: &str,
    ) -> Result<HttpRequest, AccessError> {
        let base = self.base_url(host_app_id)?;
        let token = self.read_token(host_app_id).await?;
        self.authenticated_post(&base, endpoint, parameters, &token)
    }

    /// Token read on the blocking pool when a tokio runtime is present, so store I/O
    /// never runs on an async worker.
    async fn read_token(&self, host_app_id: &str) -> Result<String, AccessError> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return self.tokens.try_get_token(host_app_id);
        };
        let tokens = Arc::clone(&self.tokens);
        let host_app_id = host_app_id.to_string();
        runtime
            .spawn_blocking(move || tokens.try_get_token(&host_app_id))
            .await
            .map_err(|e| AccessError::EngineOpen(StorageError::from(std::io::Error::from(e))))?
    }

    fn base_url(&self, host_app_id: &str) -> Result<String, AccessError> {
        self.host.api_base_url(host_app_id).ok_or_else(|| {
            AccessError::ConfigurationMissing(format!("API base URL for {}", host_app_id))
        })
    }

    fn authenticated_post(
        &self,
        base: &str,
        endpoint: &str,
        parameters: &Map<String, Value>,
        token: &str,
    ) -> Result<HttpRequest, AccessError> {
        let body = serde_json::to_vec(parameters)
            .map_err(|e| AccessError::ConfigError(format!("Unencodable action body: {}", e)))?;

        Ok(HttpRequest {
            method: Method::Post,
            url: format!("{}{}", base, endpoint),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), format!("Bearer {}", token)),
            ],
            body,
            timeout: self.timeout,
        })
    }

    /// Tell the server a message reached this device.
    pub async fn acknowledge_message(
        &self,
        message_id: &str,
        user_id: &str,
        host_app_id: &str,
    ) -> ActionOutcome {
        let parameters = object(json!({ "userId": user_id }));
        self.send_action(&acknowledge_message_endpoint(message_id), &parameters, host_app_id)
            .await
    }

    pub async fn reject_call(&self, call_id: &str, host_app_id: &str) -> ActionOutcome {
        let parameters = object(json!({ "callId": call_id }));
        self.send_action(REJECT_CALL_ENDPOINT, &parameters, host_app_id)
            .await
    }

    /// Fire-and-forget form: spawn the action on the current tokio runtime and report
    /// success to `on_complete` from whichever worker finishes it.
    ///
    /// Without a runtime nothing is sent and `on_complete(false)` runs immediately.
    pub fn dispatch_with_callback<F>(
        self: &Arc<Self>,
        endpoint: String,
        parameters: Map<String, Value>,
        host_app_id: String,
        on_complete: F,
    ) -> Option<JoinHandle<()>>
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(endpoint = %endpoint, error = %e, "No async runtime for remote action");
                on_complete(false);
                return None;
            }
        };

        let dispatcher = Arc::clone(self);
        Some(runtime.spawn(async move {
            let outcome = dispatcher
                .send_action(&endpoint, &parameters, &host_app_id)
                .await;
            on_complete(outcome.is_success());
        }))
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
