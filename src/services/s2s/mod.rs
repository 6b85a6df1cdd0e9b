//! Service-to-service token leasing.
//!
//! Each delivery attempt leases a fresh token from the identity service. The
//! lease request proves possession of the shared secret with a time-based
//! one-time password (RFC 6238, SHA-1, 6 digits, 30 second step).

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use totp_rs::{Algorithm, Secret, TOTP};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::{config::S2sConfig, models::SecretString};

const TOTP_DIGITS: usize = 6;
const TOTP_SKEW: u8 = 1;
const TOTP_STEP_SECONDS: u64 = 30;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AuthError {
    #[error("Invalid S2S secret: {0}")]
    InvalidSecret(String),

    #[error("Clock error: {0}")]
    ClockError(String),

    #[error("Token lease request failed: {0}")]
    HttpError(String),

    #[error("Token lease rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Identity service returned an empty token")]
    EmptyToken,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeaseRequest<'a> {
    microservice: &'a str,
    one_time_password: &'a str,
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait S2sServiceTrait: Send + Sync {
    /// Leases a service-to-service token for one callback request.
    async fn obtain_token(&self) -> Result<String, AuthError>;
}

#[derive(Clone)]
pub struct S2sService {
    config: S2sConfig,
    client: reqwest::Client,
}

impl S2sService {
    pub fn new(config: S2sConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn lease_url(&self) -> String {
        format!("{}/lease", self.config.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl S2sServiceTrait for S2sService {
    async fn obtain_token(&self) -> Result<String, AuthError> {
        let one_time_password = generate_one_time_password(&self.config.secret)?;
        let request = LeaseRequest {
            microservice: &self.config.microservice,
            one_time_password: &one_time_password,
        };

        debug!(microservice = %self.config.microservice, "leasing S2S token");
        let response = self
            .client
            .post(self.lease_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| AuthError::HttpError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::HttpError(e.to_string()))?;

        if !status.is_success() {
            debug!(status = %status, body = %body, "S2S lease rejected");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token = body.trim();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }
        Ok(token.to_string())
    }
}

fn totp_for(secret: &SecretString) -> Result<TOTP, AuthError> {
    let bytes = Secret::Encoded(secret.to_str().trim().to_uppercase())
        .to_bytes()
        .map_err(|e| AuthError::InvalidSecret(format!("{e:?}")))?;
    if bytes.is_empty() {
        return Err(AuthError::InvalidSecret("secret is empty".to_string()));
    }
    // Shared secrets are often shorter than the 128 bits `TOTP::new` demands.
    Ok(TOTP::new_unchecked(
        Algorithm::SHA1,
        TOTP_DIGITS,
        TOTP_SKEW,
        TOTP_STEP_SECONDS,
        bytes,
    ))
}

/// Generates the current one-time password for a base32 encoded secret.
pub fn generate_one_time_password(secret: &SecretString) -> Result<String, AuthError> {
    totp_for(secret)?
        .generate_current()
        .map_err(|e| AuthError::ClockError(e.to_string()))
}

/// Generates the one-time password for a given unix time.
pub fn generate_one_time_password_at(
    secret: &SecretString,
    unix_seconds: u64,
) -> Result<String, AuthError> {
    Ok(totp_for(secret)?.generate(unix_seconds))
}
