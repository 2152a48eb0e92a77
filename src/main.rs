use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use minihttpd::{AuditLog, Config, Dispatcher, Server, ServerStats, StaticFiles};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minihttpd=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let static_files = StaticFiles::with_policy(config.static_dir.clone(), config.path_policy())?;
    let audit = AuditLog::open(&config.log_file)?;
    let dispatcher = Arc::new(Dispatcher::new(
        static_files,
        audit,
        Arc::new(ServerStats::new()),
    ));

    if config.stats_route {
        let stats = Arc::clone(dispatcher.stats());
        dispatcher.register_route("/stats", move |_, _, _| Ok(stats.snapshot().to_html()));
    }

    let server = Server::bind(&config, dispatcher).await?;

    tracing::info!(
        address = %server.local_addr()?,
        workers = config.workers(),
        static_dir = %config.static_dir,
        timeout_secs = config.timeout_secs,
        "Server started"
    );

    server.run().await?;
    Ok(())
}
