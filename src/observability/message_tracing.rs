use tracing::Span;

/// Creates the span that wraps the processing of one received message.
/// Every event emitted inside it carries the message's correlation id.
///
/// # Example
/// ```ignore
/// let span = message_span(received.correlation_id(), retries);
/// process(received).instrument(span).await;
/// ```
pub fn message_span(correlation_id: &str, retries: u32) -> Span {
    tracing::info_span!("message", correlation_id = %correlation_id, retries = retries)
}
