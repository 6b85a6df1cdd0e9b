//! Property keys carried on callback messages.

/// Canonical property holding the callback URL.
pub const PROPERTY_SERVICE_CALLBACK_URL: &str = "serviceCallbackUrl";

/// Lower-case variant of the callback URL property, accepted on ingestion.
pub const PROPERTY_SERVICE_CALLBACK_URL_LOWER: &str = "servicecallbackurl";

/// Name of the producing service, used for logging and notifications only.
pub const PROPERTY_SERVICE_NAME: &str = "serviceName";

/// Redelivery counter.
pub const PROPERTY_RETRIES: &str = "retries";

/// Header carrying the S2S credential on the callback request.
pub const SERVICE_AUTHORIZATION_HEADER: &str = "ServiceAuthorization";
