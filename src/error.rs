use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::response::StatusCode;

/// Error returned by a route handler. Any error type converts into it with `?`.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures that can occur while building or serving a request.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured static root does not exist. Fatal at startup.
    #[error("static file directory does not exist: {}", .0.display())]
    StaticRootMissing(PathBuf),

    /// Reading from the connection failed for a reason other than end-of-stream.
    #[error("connection i/o error: {0}")]
    Io(#[from] io::Error),

    /// A registered route handler returned an error or panicked.
    #[error("handler failed: {0}")]
    Handler(String),

    /// No route and no regular file for the path.
    #[error("static file not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Status the dispatcher answers with when this error reaches it.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NotFound,
            Error::Io(_) | Error::Handler(_) | Error::StaticRootMissing(_) => {
                StatusCode::InternalServerError
            }
        }
    }
}
