/// Default HTTP client connection timeout in seconds.
/// Maximum time to wait for establishing a connection.
pub const DEFAULT_HTTP_CLIENT_CONNECT_TIMEOUT_SECONDS: u64 = 5;

/// Default HTTP client timeout in seconds.
/// Overall timeout for the token lease and callback requests.
pub const DEFAULT_HTTP_CLIENT_TIMEOUT_SECONDS: u64 = 30;

/// Default maximum number of idle connections per host in the connection pool.
pub const DEFAULT_HTTP_CLIENT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Default HTTP client pool idle timeout in seconds.
/// Time after which idle connections are closed.
pub const DEFAULT_HTTP_CLIENT_POOL_IDLE_TIMEOUT_SECONDS: u64 = 30;
