pub mod audit;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod request;
pub mod response;
pub mod server;
pub mod static_files;
pub mod stats;

pub use audit::AuditLog;
pub use config::Config;
pub use dispatch::{Dispatcher, Handler};
pub use error::{Error, HandlerError, Result};
pub use request::{
    decode_path, extract_body, extract_method, extract_path, parse_headers, Headers, Request,
    READ_BUFFER_SIZE,
};
pub use response::{Response, StatusCode, NOT_FOUND_BODY, SERVER_ERROR_BODY};
pub use server::Server;
pub use static_files::{PathPolicy, StaticFiles, MAX_CACHE_ENTRIES};
pub use stats::{ConnectionGuard, ServerStats, StatsSnapshot};
