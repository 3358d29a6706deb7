pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 16 * 1024 * 1024; // 16MB
pub const DEFAULT_HEALTH_CHECK_PATH: &str = "/health";
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

pub const HEADER_REQUEST_ID: &str = "x-request-id";
pub const HEADER_RESPONSE_TIME: &str = "x-response-time";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_FORWARDED_FOR: &str = "x-forwarded-for";
pub const HEADER_REAL_IP: &str = "x-real-ip";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Context key under which the request id is stored
pub const CTX_REQUEST_ID: &str = "request_id";
