use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::api::StoreError;
use crate::record::{Level, LogRecord, Meta, ALL_LEVELS};
use crate::store::LogStore;

/// How generated timestamps spread over the trailing 7-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeDist {
    /// Uniform over the last 7 days.
    #[default]
    Uniform,
    /// 80% within the last hour, the rest 1-7 days back.
    Recent,
}

#[derive(Debug, Clone)]
pub struct BatchOpts {
    pub count: usize,
    pub apps: Vec<String>,
    pub hosts: Vec<String>,
    pub envs: Vec<String>,
    pub time_dist: TimeDist,
}

const LOGGERS: [&str; 4] = [
    "com.example.service.UserService",
    "com.example.repository.ProductRepository",
    "com.example.controller.OrderController",
    "org.springframework.web.servlet.DispatcherServlet",
];

const THREADS: [&str; 3] = [
    "http-nio-8080-exec-1",
    "http-nio-8080-exec-2",
    "task-scheduler-1",
];

const METHODS: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];

const STATUSES: [i32; 8] = [200, 201, 400, 401, 403, 404, 500, 502];

const MESSAGES: [&str; 10] = [
    "Request completed successfully.",
    "User session validated against token cache.",
    "Fetched product catalog page from repository.",
    "Order state transition persisted.",
    "Upstream service responded within budget.",
    "Retrying request after transient downstream timeout.",
    "Payload validation rejected a malformed field.",
    "Connection pool nearing configured capacity.",
    "Scheduled job finished its sweep.",
    "Cache miss, falling back to primary store.",
];

const URIS: [&str; 8] = [
    "/api/users/profile",
    "/api/orders",
    "/api/orders/checkout",
    "/api/products/search",
    "/api/products/inventory",
    "/api/auth/refresh",
    "/api/cart/items",
    "/internal/health",
];

const STACKS: [&str; 3] = [
    "java.lang.NullPointerException: Cannot invoke \"Order.getId()\" because \"order\" is null\n\tat com.example.service.OrderService.submit(OrderService.java:87)\n\tat com.example.controller.OrderController.checkout(OrderController.java:41)\n\tat org.springframework.web.servlet.DispatcherServlet.doDispatch(DispatcherServlet.java:1089)",
    "org.springframework.dao.DataAccessResourceFailureException: Connection is closed\n\tat com.example.repository.ProductRepository.findPage(ProductRepository.java:132)\n\tat com.example.service.CatalogService.page(CatalogService.java:58)\n\tat jdk.internal.reflect.DirectMethodHandleAccessor.invoke(DirectMethodHandleAccessor.java:103)",
    "java.net.SocketTimeoutException: Read timed out\n\tat com.example.client.PaymentClient.capture(PaymentClient.java:74)\n\tat com.example.service.OrderService.submit(OrderService.java:95)\n\tat java.base/java.util.concurrent.FutureTask.run(FutureTask.java:317)",
];

fn sample_timestamp(rng: &mut impl Rng, dist: TimeDist, now: DateTime<Utc>) -> DateTime<Utc> {
    match dist {
        TimeDist::Uniform => {
            now - Duration::days(rng.gen_range(0..7)) - Duration::seconds(rng.gen_range(0..86_400))
        }
        TimeDist::Recent => {
            if rng.gen_bool(0.8) {
                now - Duration::seconds(rng.gen_range(0..3_600))
            } else {
                now - Duration::days(rng.gen_range(1..7))
                    - Duration::seconds(rng.gen_range(0..86_400))
            }
        }
    }
}

fn build_record(
    rng: &mut impl Rng,
    app: &str,
    host: &str,
    env: &str,
    timestamp: DateTime<Utc>,
) -> LogRecord {
    let level = *pick(rng, &ALL_LEVELS);

    // 70% of ERROR/FATAL records carry a trace; nothing else does.
    let stack = if level.is_severe() && rng.gen_bool(0.7) {
        Some(pick(rng, &STACKS).to_string())
    } else {
        None
    };

    LogRecord {
        timestamp,
        meta: Meta {
            app: app.to_string(),
            host: host.to_string(),
            env: env.to_string(),
        },
        level,
        logger: pick(rng, &LOGGERS).to_string(),
        thread: pick(rng, &THREADS).to_string(),
        message: pick(rng, &MESSAGES).to_string(),
        uri: pick(rng, &URIS).to_string(),
        method: pick(rng, &METHODS).to_string(),
        status: *pick(rng, &STATUSES),
        latency_ms: rng.gen_range(10..=2_000),
        trace_id: Uuid::new_v4().to_string(),
        span_id: Uuid::new_v4().to_string(),
        stack,
    }
}

fn pick<'a, T>(rng: &mut impl Rng, items: &'a [T]) -> &'a T {
    items.choose(rng).expect("candidate list must not be empty")
}

/// Produces `opts.count` records. App, host and environment are sampled
/// independently per record from the candidate lists, never paired.
pub fn synthesize_batch(
    rng: &mut impl Rng,
    opts: &BatchOpts,
    now: DateTime<Utc>,
) -> Vec<LogRecord> {
    (0..opts.count)
        .map(|_| {
            let app = pick(rng, &opts.apps).clone();
            let host = pick(rng, &opts.hosts).clone();
            let env = pick(rng, &opts.envs).clone();
            let timestamp = sample_timestamp(rng, opts.time_dist, now);
            build_record(rng, &app, &host, &env, timestamp)
        })
        .collect()
}

/// Synthesizes one batch and writes it in a single bulk insert. There is
/// no per-record fallback: a failed insert drops the whole batch.
pub async fn generate_and_insert(
    store: &impl LogStore,
    rng: &mut impl Rng,
    opts: &BatchOpts,
) -> Result<usize, StoreError> {
    let records = synthesize_batch(rng, opts, Utc::now());
    store.insert_batch(records).await
}
