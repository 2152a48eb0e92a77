use std::fs::OpenOptions;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::time::SystemTime;

use parking_lot::Mutex;
use tracing::warn;

/// Append-only record of every handled request.
///
/// All writes go through one lock and complete before it is released, so
/// records never interleave. The write itself blocks the caller.
pub struct AuditLog {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog").finish_non_exhaustive()
    }
}

impl AuditLog {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(file))
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(writer)),
        }
    }

    /// Discards every record.
    pub fn disabled() -> Self {
        Self::from_writer(io::sink())
    }

    /// Writes one record. A failed write is reported and otherwise ignored.
    pub fn record(&self, remote: SocketAddr, raw_request: &str) {
        let record = format_record(SystemTime::now(), remote, raw_request);

        let mut sink = self.sink.lock();
        if let Err(e) = sink.write_all(record.as_bytes()).and_then(|_| sink.flush()) {
            warn!(error = %e, "Failed to write audit log record");
        }
    }
}

pub fn format_record(at: SystemTime, remote: SocketAddr, raw_request: &str) -> String {
    format!(
        "[{}] Client: {}\nRequest: {}\n\n",
        httpdate::fmt_http_date(at),
        remote.ip(),
        raw_request
    )
}
