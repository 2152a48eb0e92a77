use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Process-wide counters. Purely observational, nothing is gated on them.
#[derive(Debug)]
pub struct ServerStats {
    requests: AtomicU64,
    active_connections: AtomicUsize,
    started: SystemTime,
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            active_connections: AtomicUsize::new(0),
            started: SystemTime::now(),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Counts a connection as active until the returned guard is dropped.
    pub fn connection_opened(self: &Arc<Self>) -> ConnectionGuard {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        ConnectionGuard {
            stats: Arc::clone(self),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests: self.requests(),
            active_connections: self.active_connections(),
            started: self.started,
            uptime: self.started.elapsed().unwrap_or(Duration::ZERO),
        }
    }
}

/// Released on every exit path of a connection task, panics included.
#[derive(Debug)]
pub struct ConnectionGuard {
    stats: Arc<ServerStats>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.stats.active_connections.fetch_sub(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StatsSnapshot {
    pub requests: u64,
    pub active_connections: usize,
    pub started: SystemTime,
    pub uptime: Duration,
}

impl StatsSnapshot {
    pub fn to_html(&self) -> String {
        format!(
            "<html><body><h1>Server stats</h1><ul><li>Requests: {}</li><li>Active connections: {}</li><li>Started: {}</li><li>Uptime: {}s</li></ul></body></html>",
            self.requests,
            self.active_connections,
            httpdate::fmt_http_date(self.started),
            self.uptime.as_secs()
        )
    }
}
