use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::static_files::PathPolicy;

#[derive(Debug, Clone, Parser)]
#[command(name = "minihttpd")]
#[command(about = "Minimal HTTP/1.x server for routes and static files", long_about = None)]
pub struct Config {
    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Worker threads, also the number of connections handled at once
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: u16,

    /// Directory static files are served from
    #[arg(long = "static", default_value = "static")]
    pub static_dir: String,

    /// File request records are appended to
    #[arg(long, default_value = "server_log.txt")]
    pub log_file: PathBuf,

    /// Per-connection read and write timeout in seconds, 0 waits forever
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Resolve `..` in request paths so files outside the static root are unreachable
    #[arg(long)]
    pub confine_paths: bool,

    /// Serve request counters at /stats
    #[arg(long)]
    pub stats_route: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            threads: 4,
            static_dir: "static".to_string(),
            log_file: PathBuf::from("server_log.txt"),
            timeout_secs: 30,
            confine_paths: false,
            stats_route: false,
        }
    }
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn workers(&self) -> usize {
        usize::from(self.threads.max(1))
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn path_policy(&self) -> PathPolicy {
        if self.confine_paths {
            PathPolicy::Confined
        } else {
            PathPolicy::Verbatim
        }
    }
}
