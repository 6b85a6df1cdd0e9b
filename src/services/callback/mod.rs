//! Delivery of callback payloads to the service callback URL.
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

use crate::{
    models::{CallbackHeaders, DeliveryOutcome},
    utils::base64_encode,
};

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DeliveryError {
    #[error("Callback request failed: {0}")]
    RequestFailed(String),

    #[error("Callback returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

#[derive(Serialize)]
struct HeaderLog<'a> {
    headers: &'a CallbackHeaders<'a>,
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait CallbackServiceTrait: Send + Sync {
    /// PUTs `body` to `url` with the leased credential and classifies the
    /// result. Never fails; transport problems become recoverable outcomes.
    async fn dispatch(&self, url: &str, body: &[u8], credential: &str) -> DeliveryOutcome;
}

#[derive(Clone)]
pub struct CallbackService {
    client: reqwest::Client,
    extra_logging: bool,
}

impl CallbackService {
    pub fn new(client: reqwest::Client, extra_logging: bool) -> Self {
        Self {
            client,
            extra_logging,
        }
    }

    async fn put(&self, url: &str, body: &[u8], credential: &str) -> Result<String, DeliveryError> {
        let headers = CallbackHeaders::new(credential);
        if self.extra_logging {
            log_headers(&headers);
        }

        let mut request = self.client.put(url).body(body.to_vec());
        for (name, value) in headers.as_pairs() {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::RequestFailed(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DeliveryError::RequestFailed(e.to_string()))?;

        if status.is_success() {
            Ok(text)
        } else {
            Err(unexpected_status(status, text))
        }
    }
}

fn unexpected_status(status: StatusCode, body: String) -> DeliveryError {
    DeliveryError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    }
}

fn log_headers(headers: &CallbackHeaders<'_>) {
    match serde_json::to_vec(&HeaderLog { headers }) {
        Ok(json) => info!(headers = %base64_encode(&json), "callback request headers"),
        Err(e) => debug!(error = %e, "failed to serialize callback headers for logging"),
    }
}

#[async_trait]
impl CallbackServiceTrait for CallbackService {
    async fn dispatch(&self, url: &str, body: &[u8], credential: &str) -> DeliveryOutcome {
        match self.put(url, body, credential).await {
            Ok(response) => DeliveryOutcome::Success(response),
            Err(e) => DeliveryOutcome::RecoverableFailure(e.to_string()),
        }
    }
}
