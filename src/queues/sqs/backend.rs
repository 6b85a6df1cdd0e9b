//! AWS SQS backend implementation.
//!
//! The callback subscription and the dead-letter queue are standard SQS queues
//! under a common URL prefix. Producers publish to the topic queue, which is
//! expected to feed the subscription queue (an SNS subscription or the same
//! queue). AWS credentials and the region are resolved by `aws-config` from the
//! environment.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::BusConfig;

use super::SqsSession;
use crate::queues::{QueueBackend, QueueBackendError};

#[derive(Clone)]
pub struct SqsBackend {
    sqs_client: aws_sdk_sqs::Client,
    subscription_url: String,
    dead_letter_url: String,
}

impl std::fmt::Debug for SqsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqsBackend")
            .field("subscription_url", &self.subscription_url)
            .field("dead_letter_url", &self.dead_letter_url)
            .finish()
    }
}

impl SqsBackend {
    /// Creates a new SQS backend.
    ///
    /// # Environment Variables
    /// - `AWS_REGION` - AWS region (required)
    /// - `SQS_ENDPOINT_URL` - Optional endpoint override, read into [`BusConfig`]
    ///
    /// # Errors
    /// Returns ConfigError if no region can be resolved.
    pub async fn new(config: &BusConfig) -> Result<Self, QueueBackendError> {
        info!("Initializing SQS queue backend");

        let shared_config = aws_config::load_from_env().await;
        let region = shared_config
            .region()
            .ok_or_else(|| {
                QueueBackendError::ConfigError(
                    "AWS_REGION not set. Required for SQS backend.".to_string(),
                )
            })?
            .to_string();

        let mut sqs_config = aws_sdk_sqs::config::Builder::from(&shared_config);
        if let Some(endpoint) = &config.endpoint_url {
            sqs_config = sqs_config.endpoint_url(endpoint);
        }
        let sqs_client = aws_sdk_sqs::Client::from_conf(sqs_config.build());

        let backend = Self::with_client(sqs_client, config);
        info!(
            region = %region,
            subscription_url = %backend.subscription_url,
            topic_url = %config.topic_queue_url(),
            dead_letter_url = %backend.dead_letter_url,
            "Resolved SQS queue URLs"
        );
        Ok(backend)
    }

    pub fn with_client(sqs_client: aws_sdk_sqs::Client, config: &BusConfig) -> Self {
        Self {
            sqs_client,
            subscription_url: config.subscription_queue_url(),
            dead_letter_url: config.dead_letter_queue_url(),
        }
    }
}

#[async_trait]
impl QueueBackend for SqsBackend {
    type Session = SqsSession;

    async fn open_session(&self) -> Result<Self::Session, QueueBackendError> {
        debug!(subscription_url = %self.subscription_url, "opening SQS session");
        Ok(SqsSession::new(
            self.sqs_client.clone(),
            self.subscription_url.clone(),
            self.dead_letter_url.clone(),
        ))
    }
}
