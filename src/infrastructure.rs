//! Infrastructure layer: HTTP transport, API gateway, session storage,
//! configuration and logging.

pub mod api_client;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod transport;

pub use api_client::{decode_response, ApiClient, INVALID_RESPONSE_MESSAGE};
pub use config::{AppConfig, ConfigError, ConfigManager};
pub use error::{ApiError, ErrorKind};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore, DEFAULT_TOKEN_KEY};
pub use transport::{
    ApiRequest, ApiResponse, HttpClientConfig, HttpTransport, MultipartFile, ReqwestTransport,
    RequestBody, TransportError,
};
