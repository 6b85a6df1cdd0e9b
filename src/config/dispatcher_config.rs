//! Dispatcher configuration loaded from the environment.
//!
//! `.env` files are honoured through `dotenvy` by the binary before
//! [`DispatcherConfig::from_env`] is called.
use std::{env, str::FromStr};

use crate::{
    constants::{
        DEFAULT_DEAD_LETTER_SUFFIX, DEFAULT_DELAY_MESSAGE_MINUTES, DEFAULT_PROCESS_MESSAGES_COUNT,
    },
    models::{ConfigError, SecretString},
};

use super::DeadLetterEmailConfig;

/// Queue locations of the callback topic and subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Queue URL prefix, e.g. `https://sqs.eu-west-2.amazonaws.com/123456789012/`.
    pub connection: String,
    pub topic_name: String,
    pub subscription_name: String,
    pub dead_letter_name: String,
    /// Optional endpoint override (LocalStack and similar).
    pub endpoint_url: Option<String>,
}

impl BusConfig {
    fn queue_url(&self, name: &str) -> String {
        if self.connection.ends_with('/') {
            format!("{}{}", self.connection, name)
        } else {
            format!("{}/{}", self.connection, name)
        }
    }

    /// Queue drained on every pass.
    pub fn subscription_queue_url(&self) -> String {
        self.queue_url(&self.subscription_name)
    }

    /// Queue producers publish to. Redelivery clones bypass it.
    pub fn topic_queue_url(&self) -> String {
        self.queue_url(&self.topic_name)
    }

    pub fn dead_letter_queue_url(&self) -> String {
        self.queue_url(&self.dead_letter_name)
    }
}

/// Identity service settings used to lease S2S tokens.
#[derive(Debug, Clone)]
pub struct S2sConfig {
    pub url: String,
    pub secret: SecretString,
    pub microservice: String,
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub bus: BusConfig,
    pub process_messages_count: usize,
    pub delay_message_minutes: i64,
    pub s2s: S2sConfig,
    pub extra_service_logging: bool,
    pub dead_letter_email: DeadLetterEmailConfig,
}

impl DispatcherConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let subscription_name = env_required("SERVICE_CALLBACK_SUBSCRIPTION_NAME")?;
        let dead_letter_name = env_optional("SERVICE_CALLBACK_DEAD_LETTER_NAME")
            .unwrap_or_else(|| format!("{subscription_name}{DEFAULT_DEAD_LETTER_SUFFIX}"));

        let bus = BusConfig {
            connection: env_required("SERVICE_CALLBACK_BUS_CONNECTION")?,
            topic_name: env_required("SERVICE_CALLBACK_TOPIC_NAME")?,
            subscription_name,
            dead_letter_name,
            endpoint_url: env_optional("SQS_ENDPOINT_URL"),
        };

        let process_messages_count =
            env_parse("PROCESS_MESSAGES_COUNT", DEFAULT_PROCESS_MESSAGES_COUNT)?;
        if process_messages_count == 0 {
            return Err(ConfigError::invalid(
                "PROCESS_MESSAGES_COUNT",
                "must be at least 1",
            ));
        }

        let delay_message_minutes =
            env_parse("DELAY_MESSAGE_MINUTES", DEFAULT_DELAY_MESSAGE_MINUTES)?;
        if delay_message_minutes < 0 {
            return Err(ConfigError::invalid(
                "DELAY_MESSAGE_MINUTES",
                "must not be negative",
            ));
        }

        let s2s = S2sConfig {
            url: env_required("S2S_URL")?,
            secret: SecretString::from(env_required("S2S_SECRET")?),
            microservice: env_required("MICROSERVICE_NAME")?,
        };

        Ok(Self {
            bus,
            process_messages_count,
            delay_message_minutes,
            s2s,
            extra_service_logging: env_bool("EXTRA_SERVICE_LOGGING", false)?,
            dead_letter_email: DeadLetterEmailConfig::from_env()?,
        })
    }
}

/// Reads a variable, treating blank values as unset.
pub(crate) fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn env_required(key: &str) -> Result<String, ConfigError> {
    env_optional(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()))
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_optional(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::invalid(key, format!("{raw}: {e}"))),
        None => Ok(default),
    }
}

pub(crate) fn env_bool(key: &str, default: bool) -> Result<bool, ConfigError> {
    match env_optional(key) {
        Some(raw) => parse_bool(&raw).ok_or_else(|| {
            ConfigError::invalid(key, format!("{raw} is not a boolean"))
        }),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
