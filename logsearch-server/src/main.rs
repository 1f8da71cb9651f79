use envconfig::Envconfig;
use tokio::signal;

use logsearch::config::Config;
use logsearch::server;

async fn shutdown() {
    let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("failed to register SIGTERM handler");

    let mut interrupt = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .expect("failed to register SIGINT handler");

    tokio::select! {
        _ = term.recv() => {},
        _ = interrupt.recv() => {},
    };

    tracing::info!("shutting down gracefully...");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match Config::init_from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("incomplete configuration: {}", err);
            return;
        }
    };

    if let Err(err) = server::serve(config, shutdown()).await {
        tracing::error!("server exited with an error: {}", err);
    }
}
