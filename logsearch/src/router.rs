use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::search;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

pub fn router(config: Config) -> Router {
    Router::new()
        .route("/", get(search::home))
        .route("/search", get(search::search))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState {
            config: Arc::new(config),
        })
}
