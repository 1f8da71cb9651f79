use std::future::Future;

use crate::config::Config;
use crate::router;

pub async fn serve<F>(config: Config, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(config.address).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    let app = router::router(config);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
