//! Callback message snapshot as received from the bus.
//!
//! A [`CallbackMessage`] is treated as an immutable snapshot for the duration
//! of a pass. Redelivery never mutates the received message; it builds a clone
//! carrying the next retry count (see [`CallbackMessage::redelivery_clone`]).

use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::Value;

use crate::constants::{PROPERTY_RETRIES, SERVICE_AUTHORIZATION_HEADER};

/// Message properties, opaque apart from the keys in [`crate::constants`].
pub type MessageProperties = BTreeMap<String, Value>;

/// Payload of a callback message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// No body was attached to the message (or it was empty).
    Absent,
    /// The bus delivered a body that could not be decoded.
    Unreadable(String),
    /// Raw payload, delivered verbatim to the callback.
    Payload(Bytes),
}

impl MessageBody {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Self::Absent
        } else {
            Self::Payload(Bytes::from(text))
        }
    }

    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            Self::Payload(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Lossy UTF-8 rendering of the payload for logs and notifications.
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Payload(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Self::Absent | Self::Unreadable(_) => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallbackMessage {
    pub correlation_id: Option<String>,
    pub body: MessageBody,
    pub properties: Option<MessageProperties>,
}

impl CallbackMessage {
    pub fn new(body: MessageBody, properties: Option<MessageProperties>) -> Self {
        Self {
            correlation_id: None,
            body,
            properties,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|props| props.get(key))
    }

    /// Returns a string property, ignoring empty values.
    pub fn property_str(&self, key: &str) -> Option<String> {
        match self.property(key)? {
            Value::String(s) => (!s.is_empty()).then(|| s.clone()),
            Value::Null | Value::Bool(false) => None,
            other => Some(other.to_string()),
        }
    }

    /// Stored redelivery count. Absent or unparsable values count as zero.
    pub fn retries(&self) -> u32 {
        match self.property(PROPERTY_RETRIES) {
            Some(Value::Number(n)) => n
                .as_u64()
                .map(|v| v.min(u32::MAX as u64) as u32)
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse::<u32>().unwrap_or(0),
            _ => 0,
        }
    }

    /// Builds the copy that is scheduled for redelivery. The body and
    /// correlation id are carried over; `retries` is replaced.
    pub fn redelivery_clone(&self, retries: u32) -> Self {
        let mut properties = self.properties.clone().unwrap_or_default();
        properties.insert(PROPERTY_RETRIES.to_string(), Value::from(retries));
        Self {
            correlation_id: self.correlation_id.clone(),
            body: self.body.clone(),
            properties: Some(properties),
        }
    }
}

/// A message held under a bus lock. `receipt` identifies the lock for
/// settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedMessage {
    pub receipt: String,
    pub message: CallbackMessage,
}

impl ReceivedMessage {
    pub fn new(receipt: impl Into<String>, message: CallbackMessage) -> Self {
        Self {
            receipt: receipt.into(),
            message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        self.message.correlation_id.as_deref().unwrap_or_default()
    }
}

/// Canonical view of a message that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMessage {
    pub body: Bytes,
    pub callback_url: String,
    pub service_name: String,
    pub retries: u32,
}

/// Headers attached to the callback request.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CallbackHeaders<'a> {
    #[serde(rename = "ServiceAuthorization")]
    pub service_authorization: &'a str,
    #[serde(rename = "Content-Type")]
    pub content_type: &'a str,
}

impl<'a> CallbackHeaders<'a> {
    pub fn new(credential: &'a str) -> Self {
        Self {
            service_authorization: credential,
            content_type: "application/json",
        }
    }

    pub fn as_pairs(&self) -> [(&'static str, &'a str); 2] {
        [
            (SERVICE_AUTHORIZATION_HEADER, self.service_authorization),
            ("Content-Type", self.content_type),
        ]
    }
}
