//! SQS session: receive and settlement operations for one pass.
//!
//! Message properties travel as SQS message attributes. `Number` attributes
//! become JSON numbers, everything else JSON strings. The correlation id is
//! kept in its own attribute and is not part of the property bag.
//!
//! SQS has no topic fan-out, so redelivery clones go straight back to the
//! subscription queue. SQS caps per-message delays at 15 minutes. Redeliveries
//! further out carry a `target_scheduled_on` attribute and are deferred again,
//! in hops, whenever they are received before that time.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_sqs::types::{Message, MessageAttributeValue};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    constants::{
        ATTRIBUTE_CORRELATION_ID, ATTRIBUTE_DEAD_LETTER_REASON, ATTRIBUTE_TARGET_SCHEDULED_ON,
        SQS_MAX_DELAY_SECONDS, SQS_MAX_RECEIVE_BATCH, SQS_RECEIVE_WAIT_SECONDS,
    },
    models::{CallbackMessage, MessageBody, MessageProperties, ReceivedMessage},
    queues::{QueueBackendError, QueueSession},
};

/// SQS rejects empty bodies; used when dead-lettering a message without one.
const EMPTY_BODY_PLACEHOLDER: &str = "(no body)";

pub struct SqsSession {
    sqs_client: aws_sdk_sqs::Client,
    subscription_url: String,
    dead_letter_url: String,
}

impl SqsSession {
    pub fn new(
        sqs_client: aws_sdk_sqs::Client,
        subscription_url: String,
        dead_letter_url: String,
    ) -> Self {
        Self {
            sqs_client,
            subscription_url,
            dead_letter_url,
        }
    }

    /// Queue that receives redelivery clones and deferral hops. Only the
    /// subscription queue is drained, so both must land there.
    pub fn redelivery_queue_url(&self) -> &str {
        &self.subscription_url
    }

    /// Converts a received SQS message, or defers it when its scheduled time
    /// has not been reached yet. Returns `None` for deferred or unusable
    /// messages.
    async fn accept(&self, message: Message) -> Result<Option<ReceivedMessage>, QueueBackendError> {
        let Some(receipt) = message.receipt_handle().map(str::to_string) else {
            warn!(
                message_id = message.message_id().unwrap_or("unknown"),
                "SQS message without receipt handle skipped"
            );
            return Ok(None);
        };

        if let Some(target) = parse_target_scheduled_on(&message) {
            let remaining = target - Utc::now().timestamp();
            if remaining > 0 {
                self.defer(&message, &receipt, remaining).await?;
                return Ok(None);
            }
        }

        let callback_message = callback_message_from_sqs(message.body(), message.message_attributes());
        Ok(Some(ReceivedMessage::new(receipt, callback_message)))
    }

    async fn defer(
        &self,
        message: &Message,
        receipt: &str,
        remaining_seconds: i64,
    ) -> Result<(), QueueBackendError> {
        let delay = remaining_seconds.min(SQS_MAX_DELAY_SECONDS) as i32;
        self.sqs_client
            .send_message()
            .queue_url(self.redelivery_queue_url())
            .message_body(message.body().unwrap_or(EMPTY_BODY_PLACEHOLDER))
            .delay_seconds(delay)
            .set_message_attributes(message.message_attributes().cloned())
            .send()
            .await
            .map_err(|e| QueueBackendError::SqsError(format!("Failed to defer message: {e}")))?;

        self.delete(receipt).await?;
        debug!(
            remaining_seconds = remaining_seconds,
            delay_seconds = delay,
            "Deferred scheduled SQS message for next delay hop"
        );
        Ok(())
    }

    async fn delete(&self, receipt: &str) -> Result<(), QueueBackendError> {
        self.sqs_client
            .delete_message()
            .queue_url(&self.subscription_url)
            .receipt_handle(receipt)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to delete message from SQS");
                QueueBackendError::SqsError(format!("DeleteMessage failed: {e}"))
            })?;
        Ok(())
    }

    async fn send(
        &self,
        queue_url: &str,
        message: &CallbackMessage,
        extra: Vec<(&str, MessageAttributeValue)>,
        delay_seconds: Option<i32>,
    ) -> Result<(), QueueBackendError> {
        let mut attributes = attributes_from_message(message)?;
        for (name, value) in extra {
            attributes.insert(name.to_string(), value);
        }

        let body = match message.body.to_display_string() {
            body if body.is_empty() => EMPTY_BODY_PLACEHOLDER.to_string(),
            body => body,
        };

        let mut request = self
            .sqs_client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .set_message_attributes(Some(attributes));
        if let Some(delay) = delay_seconds {
            request = request.delay_seconds(delay);
        }

        request.send().await.map_err(|e| {
            error!(error = %e, queue_url = %queue_url, "Failed to send message to SQS");
            QueueBackendError::SqsError(format!("SendMessage failed: {e}"))
        })?;
        Ok(())
    }
}

#[async_trait]
impl QueueSession for SqsSession {
    async fn receive_batch(
        &self,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, QueueBackendError> {
        let mut received = Vec::new();

        // A single ReceiveMessage call returns at most 10 messages. Deferred
        // messages do not count, so the number of calls is bounded separately.
        let max_calls = max_messages.div_ceil(SQS_MAX_RECEIVE_BATCH);
        for _ in 0..max_calls {
            if received.len() >= max_messages {
                break;
            }
            let batch_size = (max_messages - received.len()).min(SQS_MAX_RECEIVE_BATCH) as i32;
            let output = self
                .sqs_client
                .receive_message()
                .queue_url(&self.subscription_url)
                .max_number_of_messages(batch_size)
                .wait_time_seconds(SQS_RECEIVE_WAIT_SECONDS)
                .message_attribute_names("All")
                .send()
                .await
                .map_err(|e| {
                    QueueBackendError::ReceiveError(format!("ReceiveMessage failed: {e}"))
                })?;

            let messages = output.messages.unwrap_or_default();
            if messages.is_empty() {
                break;
            }
            for message in messages {
                match self.accept(message).await {
                    Ok(Some(accepted)) => received.push(accepted),
                    Ok(None) => {}
                    // Left locked; it becomes visible again after the timeout.
                    Err(e) => warn!(error = %e, "Failed to defer scheduled SQS message"),
                }
            }
        }

        debug!(count = received.len(), "Received messages from SQS");
        Ok(received)
    }

    async fn complete(&self, message: &ReceivedMessage) -> Result<(), QueueBackendError> {
        self.delete(&message.receipt).await
    }

    async fn dead_letter(
        &self,
        message: &ReceivedMessage,
        reason: &str,
    ) -> Result<(), QueueBackendError> {
        let reason_attribute = string_attribute(reason)?;
        self.send(
            &self.dead_letter_url,
            &message.message,
            vec![(ATTRIBUTE_DEAD_LETTER_REASON, reason_attribute)],
            None,
        )
        .await
        .map_err(|e| QueueBackendError::SettlementError(format!("Dead-letter failed: {e}")))?;

        self.delete(&message.receipt).await.map_err(|e| {
            QueueBackendError::SettlementError(format!(
                "Dead-lettered but failed to delete original: {e}"
            ))
        })
    }

    async fn schedule_redelivery(
        &self,
        message: &ReceivedMessage,
        clone: &CallbackMessage,
        not_before: DateTime<Utc>,
    ) -> Result<(), QueueBackendError> {
        let remaining = (not_before - Utc::now()).num_seconds().max(0);
        let mut extra = Vec::new();
        if remaining > SQS_MAX_DELAY_SECONDS {
            extra.push((
                ATTRIBUTE_TARGET_SCHEDULED_ON,
                number_attribute(not_before.timestamp())?,
            ));
        }
        let delay = remaining.min(SQS_MAX_DELAY_SECONDS) as i32;

        self.send(self.redelivery_queue_url(), clone, extra, Some(delay))
            .await
            .map_err(|e| QueueBackendError::SettlementError(format!("Redelivery failed: {e}")))?;

        self.delete(&message.receipt).await.map_err(|e| {
            QueueBackendError::SettlementError(format!(
                "Redelivery scheduled but failed to delete original: {e}"
            ))
        })
    }

    async fn close(&self) -> Result<(), QueueBackendError> {
        info!(subscription_url = %self.subscription_url, "SQS session closed");
        Ok(())
    }
}

fn parse_target_scheduled_on(message: &Message) -> Option<i64> {
    message
        .message_attributes()
        .and_then(|attrs| attrs.get(ATTRIBUTE_TARGET_SCHEDULED_ON))
        .and_then(|value| value.string_value())
        .and_then(|value| value.parse::<i64>().ok())
}

/// Maps an SQS message onto the dispatcher's message model.
fn callback_message_from_sqs(
    body: Option<&str>,
    attributes: Option<&HashMap<String, MessageAttributeValue>>,
) -> CallbackMessage {
    let body = body.map(MessageBody::from_text).unwrap_or(MessageBody::Absent);

    let correlation_id = attributes
        .and_then(|attrs| attrs.get(ATTRIBUTE_CORRELATION_ID))
        .and_then(|value| value.string_value())
        .map(str::to_string);

    let properties: Option<MessageProperties> = attributes
        .map(|attrs| {
            attrs
                .iter()
                .filter(|(name, _)| !is_transport_attribute(name))
                .filter_map(|(name, value)| {
                    attribute_to_value(value).map(|json| (name.clone(), json))
                })
                .collect::<MessageProperties>()
        })
        .filter(|props| !props.is_empty());

    CallbackMessage {
        correlation_id,
        body,
        properties,
    }
}

fn is_transport_attribute(name: &str) -> bool {
    matches!(
        name,
        ATTRIBUTE_CORRELATION_ID | ATTRIBUTE_TARGET_SCHEDULED_ON | ATTRIBUTE_DEAD_LETTER_REASON
    )
}

fn attribute_to_value(attribute: &MessageAttributeValue) -> Option<Value> {
    let raw = attribute.string_value()?;
    if attribute.data_type().starts_with("Number") {
        if let Ok(int) = raw.parse::<i64>() {
            return Some(Value::from(int));
        }
        if let Some(number) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
            return Some(Value::Number(number));
        }
    }
    Some(Value::String(raw.to_string()))
}

fn attributes_from_message(
    message: &CallbackMessage,
) -> Result<HashMap<String, MessageAttributeValue>, QueueBackendError> {
    let mut attributes = HashMap::new();
    for (name, value) in message.properties.iter().flatten() {
        let attribute = match value {
            Value::Null => continue,
            Value::Number(number) => build_attribute("Number", number.to_string())?,
            Value::String(text) if text.is_empty() => continue,
            Value::String(text) => string_attribute(text)?,
            other => string_attribute(&other.to_string())?,
        };
        attributes.insert(name.clone(), attribute);
    }
    if let Some(correlation_id) = &message.correlation_id {
        attributes.insert(
            ATTRIBUTE_CORRELATION_ID.to_string(),
            string_attribute(correlation_id)?,
        );
    }
    Ok(attributes)
}

fn string_attribute(value: &str) -> Result<MessageAttributeValue, QueueBackendError> {
    build_attribute("String", value.to_string())
}

fn number_attribute(value: i64) -> Result<MessageAttributeValue, QueueBackendError> {
    build_attribute("Number", value.to_string())
}

fn build_attribute(
    data_type: &str,
    value: String,
) -> Result<MessageAttributeValue, QueueBackendError> {
    MessageAttributeValue::builder()
        .data_type(data_type)
        .string_value(value)
        .build()
        .map_err(|e| {
            QueueBackendError::SerializationError(format!(
                "Failed to build {data_type} attribute: {e}"
            ))
        })
}
