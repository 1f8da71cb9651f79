use std::net::SocketAddr;

use envconfig::Envconfig;

/// Shared by the generator CLI and the search service. The MongoDB keys
/// carry no defaults on purpose: a missing variable fails
/// `init_from_env` before any store interaction happens.
#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "MONGODB_URI")]
    pub mongodb_uri: String,

    #[envconfig(from = "DB_NAME")]
    pub db_name: String,

    #[envconfig(from = "COLL_NAME")]
    pub coll_name: String,

    #[envconfig(from = "TIME_FIELD")]
    pub time_field: String,

    #[envconfig(from = "META_FIELD")]
    pub meta_field: String,

    #[envconfig(default = "127.0.0.1:3000")]
    pub address: SocketAddr,
}
