use clap::{Parser, ValueEnum};
use envconfig::Envconfig;
use rand::rngs::StdRng;
use rand::SeedableRng;

use logsearch::config::Config;
use logsearch::generate::{generate_and_insert, BatchOpts, TimeDist};
use logsearch::store::MongoStore;

#[derive(Parser)]
#[command(about = "Generate and insert synthetic Spring Boot-style logs into MongoDB.")]
struct Cli {
    /// Number of logs to generate.
    #[arg(long, default_value_t = 1000)]
    count: usize,

    /// Application names to draw from.
    #[arg(long, num_args = 1.., default_values_t = vec!["my-app".to_string()])]
    apps: Vec<String>,

    /// Hostnames to draw from.
    #[arg(long, num_args = 1.., default_values_t = vec!["host-1".to_string()])]
    hosts: Vec<String>,

    /// Environments to draw from (e.g. dev staging prod).
    #[arg(long, num_args = 1..)]
    envs: Vec<String>,

    /// Single environment (deprecated; use --envs).
    #[arg(long)]
    env: Option<String>,

    /// Time distribution of the generated logs.
    #[arg(long, value_enum, default_value_t = TimeDistArg::Uniform)]
    time_dist: TimeDistArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum TimeDistArg {
    Uniform,
    Recent,
}

impl From<TimeDistArg> for TimeDist {
    fn from(arg: TimeDistArg) -> TimeDist {
        match arg {
            TimeDistArg::Uniform => TimeDist::Uniform,
            TimeDistArg::Recent => TimeDist::Recent,
        }
    }
}

impl Cli {
    /// `--envs` wins; the legacy `--env` still works; default is dev.
    fn resolved_envs(&self) -> Vec<String> {
        if !self.envs.is_empty() {
            self.envs.clone()
        } else if let Some(env) = &self.env {
            vec![env.clone()]
        } else {
            vec!["dev".to_string()]
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match Config::init_from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("incomplete configuration: {}", err);
            return;
        }
    };

    let store = match MongoStore::connect(&config).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!("failed to connect to MongoDB, exiting: {}", err);
            return;
        }
    };

    if let Err(err) = store.ensure_timeseries_collection().await {
        tracing::warn!("could not ensure time-series collection: {}", err);
    }
    store.ensure_meta_indexes().await;

    let opts = BatchOpts {
        count: cli.count,
        apps: cli.apps.clone(),
        hosts: cli.hosts.clone(),
        envs: cli.resolved_envs(),
        time_dist: cli.time_dist.into(),
    };

    let mut rng = StdRng::from_entropy();
    match generate_and_insert(&store, &mut rng, &opts).await {
        Ok(inserted) => tracing::info!(
            inserted,
            db = %config.db_name,
            collection = %config.coll_name,
            "inserted logs"
        ),
        Err(err) => tracing::error!("failed to insert batch, dropping it: {}", err),
    }
}
