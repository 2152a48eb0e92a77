use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dispatch::Dispatcher;

/// Accept loop feeding a bounded pool of connection workers.
///
/// At most `workers` connections are read, dispatched and answered at the
/// same time; the rest wait for a slot after being accepted.
pub struct Server {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    workers: Arc<Semaphore>,
    timeout: Option<Duration>,
}

impl Server {
    pub async fn bind(config: &Config, dispatcher: Arc<Dispatcher>) -> io::Result<Self> {
        let listener = TcpListener::bind(config.listen_addr()).await?;
        Ok(Self::from_listener(
            listener,
            dispatcher,
            config.workers(),
            config.timeout(),
        ))
    }

    pub fn from_listener(
        listener: TcpListener,
        dispatcher: Arc<Dispatcher>,
        workers: usize,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            listener,
            dispatcher,
            workers: Arc::new(Semaphore::new(workers.max(1))),
            timeout,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Serves until Ctrl+C or SIGTERM.
    pub async fn run(self) -> io::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    pub async fn run_until<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, remote)) => {
                            let _ = stream.set_nodelay(true);
                            let guard = self.dispatcher.stats().connection_opened();
                            let dispatcher = Arc::clone(&self.dispatcher);
                            let workers = Arc::clone(&self.workers);
                            let timeout = self.timeout;

                            tokio::spawn(async move {
                                let _guard = guard;
                                let Ok(_permit) = workers.acquire_owned().await else {
                                    return;
                                };
                                serve_connection(&dispatcher, stream, remote, timeout).await;
                            });
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping server...");
                    break;
                }
            }
        }

        self.workers.close();
        info!("Server shutdown complete");
        Ok(())
    }
}

/// One full request/response cycle: read, dispatch, write, close.
///
/// With a timeout set, a client that stays silent or stops reading has its
/// connection closed without any response.
pub async fn serve_connection<S>(
    dispatcher: &Dispatcher,
    mut stream: S,
    remote: SocketAddr,
    timeout: Option<Duration>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(response) = within(timeout, dispatcher.handle(&mut stream, remote)).await else {
        debug!(%remote, "Timed out waiting for request, closing connection");
        return;
    };

    match within(timeout, write_response(&mut stream, &response)).await {
        Some(Ok(())) => {}
        Some(Err(e)) => debug!(%remote, error = %e, "Failed to write response"),
        None => debug!(%remote, "Timed out writing response, closing connection"),
    }
}

async fn write_response<S>(stream: &mut S, response: &[u8]) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(response).await?;
    stream.flush().await?;
    stream.shutdown().await
}

async fn within<F: Future>(limit: Option<Duration>, fut: F) -> Option<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
