use std::any::Any;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::io::AsyncRead;
use tracing::error;

use crate::audit::AuditLog;
use crate::error::{Error, HandlerError, Result};
use crate::request::{read_request, Headers, Request};
use crate::response::{self, Response, StatusCode};
use crate::static_files::StaticFiles;
use crate::stats::ServerStats;

/// In-process route handler: `(body, headers, method) -> response body`.
pub type Handler =
    Arc<dyn Fn(&str, &Headers, &str) -> std::result::Result<String, HandlerError> + Send + Sync>;

/// Turns one connection's bytes into one response.
///
/// Routes are matched on the exact decoded path first; everything else is
/// looked up under the static root. Every failure except a missing static
/// root is answered with a response, never returned to the caller.
pub struct Dispatcher {
    routes: RwLock<FxHashMap<String, Handler>>,
    static_files: StaticFiles,
    audit: AuditLog,
    stats: Arc<ServerStats>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.read().keys().collect::<Vec<_>>())
            .field("static_files", &self.static_files)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(static_files: StaticFiles, audit: AuditLog, stats: Arc<ServerStats>) -> Self {
        Self {
            routes: RwLock::new(FxHashMap::default()),
            static_files,
            audit,
            stats,
        }
    }

    /// Binds `handler` to exactly `path`, replacing any earlier handler.
    /// Safe to call while requests are being served.
    pub fn register_route<F>(&self, path: impl Into<String>, handler: F)
    where
        F: Fn(&str, &Headers, &str) -> std::result::Result<String, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.routes.write().insert(path.into(), Arc::new(handler));
    }

    pub fn route_count(&self) -> usize {
        self.routes.read().len()
    }

    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.stats
    }

    pub fn static_files(&self) -> &StaticFiles {
        &self.static_files
    }

    /// Reads the request from `conn` with a single bounded read and returns
    /// the serialized response.
    pub async fn handle<C>(&self, conn: &mut C, remote: SocketAddr) -> Vec<u8>
    where
        C: AsyncRead + Unpin + ?Sized,
    {
        match read_request(conn).await {
            Ok(raw) => self.handle_bytes(&raw, remote).await,
            Err(e) => {
                error!(%remote, error = %e, "Error in request handler");
                response::server_error()
            }
        }
    }

    pub async fn handle_bytes(&self, raw: &[u8], remote: SocketAddr) -> Vec<u8> {
        match self.dispatch(raw, remote).await {
            Ok(response) => response,
            Err(e) => {
                let status = e.status();
                if status == StatusCode::InternalServerError {
                    error!(%remote, error = %e, "Error in request handler");
                }
                response::failure(status)
            }
        }
    }

    async fn dispatch(&self, raw: &[u8], remote: SocketAddr) -> Result<Vec<u8>> {
        let text = String::from_utf8_lossy(raw);
        let request = Request::parse_text(&text);

        self.audit.record(remote, &text);
        self.stats.record_request();

        // Clone the handler out so the table lock is not held while it runs
        let handler = self.routes.read().get(&request.path).cloned();
        if let Some(handler) = handler {
            let body = invoke(&handler, &request)?;
            return Ok(Response::ok(body).to_bytes());
        }

        let response = self.static_files.resolve(&request.path).await?;
        Ok(response.to_vec())
    }
}

fn invoke(handler: &Handler, request: &Request) -> Result<String> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        handler(&request.body, &request.headers, &request.method)
    }));

    match outcome {
        Ok(Ok(body)) => Ok(body),
        Ok(Err(e)) => Err(Error::Handler(e.to_string())),
        Err(payload) => Err(Error::Handler(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {}", message)
    } else {
        "handler panicked".to_string()
    }
}
