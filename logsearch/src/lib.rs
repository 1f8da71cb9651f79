pub mod api;
pub mod config;
pub mod generate;
pub mod query;
pub mod record;
pub mod router;
pub mod search;
pub mod server;
pub mod store;
