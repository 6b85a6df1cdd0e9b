//! Message validation.
//!
//! Normalizes the property bag into a [`ValidatedMessage`] at the boundary so
//! later stages never look at raw property keys.
use tracing::{debug, info, warn};

use crate::{
    constants::{
        PROPERTY_SERVICE_CALLBACK_URL, PROPERTY_SERVICE_CALLBACK_URL_LOWER, PROPERTY_SERVICE_NAME,
    },
    models::{CallbackMessage, MessageBody, ValidatedMessage, ValidationError},
};

/// Returns the callback URL, preferring the camel-case key.
pub fn callback_url(message: &CallbackMessage) -> Option<String> {
    message
        .property_str(PROPERTY_SERVICE_CALLBACK_URL)
        .or_else(|| message.property_str(PROPERTY_SERVICE_CALLBACK_URL_LOWER))
}

pub fn validated(message: &CallbackMessage) -> Result<ValidatedMessage, ValidationError> {
    let body = match &message.body {
        MessageBody::Payload(bytes) => bytes.clone(),
        MessageBody::Absent => return Err(ValidationError::MissingBody),
        MessageBody::Unreadable(reason) => {
            return Err(ValidationError::UnreadableBody(reason.clone()))
        }
    };

    if message.properties.is_none() {
        return Err(ValidationError::MissingProperties);
    }

    let callback_url = callback_url(message).ok_or(ValidationError::MissingCallbackUrl)?;

    Ok(ValidatedMessage {
        body,
        callback_url,
        service_name: message
            .property_str(PROPERTY_SERVICE_NAME)
            .unwrap_or_default(),
        retries: message.retries(),
    })
}

/// Checks whether a message can be delivered. Does not modify the message.
pub fn validate(message: &CallbackMessage) -> bool {
    match validated(message) {
        Ok(valid) => {
            debug!(
                callback_url = %valid.callback_url,
                service_name = %valid.service_name,
                retries = valid.retries,
                "Message is valid"
            );
            true
        }
        Err(ValidationError::MissingBody) => {
            warn!("No body received");
            false
        }
        Err(e) => {
            info!(reason = %e, "Message is invalid");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageProperties;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn message(body: MessageBody, properties: Value) -> CallbackMessage {
        let properties: Option<MessageProperties> = serde_json::from_value(properties).ok();
        CallbackMessage::new(body, properties)
    }

    #[test]
    fn test_valid_message() {
        let msg = message(
            MessageBody::from_text("{\"amount\":10}"),
            json!({"serviceCallbackUrl": "http://cb/one", "serviceName": "probate", "retries": 2}),
        );

        let valid = validated(&msg).unwrap();
        assert_eq!(valid.callback_url, "http://cb/one");
        assert_eq!(valid.service_name, "probate");
        assert_eq!(valid.retries, 2);
        assert_eq!(&valid.body[..], b"{\"amount\":10}");
        assert!(validate(&msg));
    }

    #[test]
    fn test_lowercase_callback_url_is_accepted() {
        let msg = message(
            MessageBody::from_text("{}"),
            json!({"servicecallbackurl": "http://cb/lower"}),
        );
        let valid = validated(&msg).unwrap();
        assert_eq!(valid.callback_url, "http://cb/lower");
        assert_eq!(valid.service_name, "");
    }

    #[test]
    fn test_camel_case_key_wins() {
        let msg = message(
            MessageBody::from_text("{}"),
            json!({"serviceCallbackUrl": "http://camel", "servicecallbackurl": "http://lower"}),
        );
        assert_eq!(callback_url(&msg).as_deref(), Some("http://camel"));
    }

    #[test]
    fn test_missing_body() {
        let msg = message(MessageBody::Absent, json!({"serviceCallbackUrl": "http://cb"}));
        assert_eq!(validated(&msg), Err(ValidationError::MissingBody));
        assert!(!validate(&msg));
    }

    #[test]
    fn test_unreadable_body() {
        let msg = message(
            MessageBody::Unreadable("bad encoding".to_string()),
            json!({"serviceCallbackUrl": "http://cb"}),
        );
        assert_eq!(
            validated(&msg),
            Err(ValidationError::UnreadableBody("bad encoding".to_string()))
        );
    }

    #[test]
    fn test_missing_properties() {
        let msg = CallbackMessage::new(MessageBody::from_text("{}"), None);
        assert_eq!(validated(&msg), Err(ValidationError::MissingProperties));
    }

    #[test]
    fn test_missing_or_empty_callback_url() {
        let msg = message(MessageBody::from_text("{}"), json!({"serviceName": "x"}));
        assert_eq!(validated(&msg), Err(ValidationError::MissingCallbackUrl));

        let msg = message(MessageBody::from_text("{}"), json!({"serviceCallbackUrl": ""}));
        assert_eq!(validated(&msg), Err(ValidationError::MissingCallbackUrl));
    }

    fn arb_message() -> impl Strategy<Value = CallbackMessage> {
        let body = prop_oneof![
            Just(MessageBody::Absent),
            "[a-z]{0,8}".prop_map(MessageBody::Unreadable),
            "[ -~]{0,32}".prop_map(MessageBody::from_text),
        ];
        let properties = proptest::option::of(proptest::collection::btree_map(
            prop_oneof![
                Just(PROPERTY_SERVICE_CALLBACK_URL.to_string()),
                Just(PROPERTY_SERVICE_CALLBACK_URL_LOWER.to_string()),
                Just(PROPERTY_SERVICE_NAME.to_string()),
                "[a-z]{1,6}",
            ],
            prop_oneof![
                "[ -~]{0,16}".prop_map(Value::from),
                any::<u32>().prop_map(Value::from),
                Just(Value::Null),
            ],
            0..4,
        ));
        (body, properties).prop_map(|(body, properties)| CallbackMessage::new(body, properties))
    }

    proptest! {
        #[test]
        fn prop_validation_is_idempotent(msg in arb_message()) {
            let snapshot = msg.clone();
            let first = validate(&msg);
            let second = validate(&msg);
            prop_assert_eq!(first, second);
            prop_assert_eq!(msg, snapshot);
        }
    }
}
