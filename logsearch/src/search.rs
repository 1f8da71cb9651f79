use askama::Template;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::query::{parse_datetime, LogFilter, Pagination, PAGE_SIZE};
use crate::record::LogRecord;
use crate::router::AppState;
use crate::store::{LogStore, MongoStore};

/// Raw query-string input of the search form. Everything is optional;
/// empty strings mean "no filter". The page is kept as text so that a
/// garbled value degrades to page 1 instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub app: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub env: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub page: String,
}

impl SearchParams {
    pub fn requested_page(&self) -> u64 {
        self.page.parse().unwrap_or(1).max(1)
    }

    /// Malformed date strings are dropped here, exactly as if the field
    /// had been left blank.
    pub fn to_filter(&self) -> LogFilter {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        LogFilter {
            app: non_empty(&self.app),
            host: non_empty(&self.host),
            env: non_empty(&self.env),
            level: non_empty(&self.level),
            start: parse_datetime(&self.start),
            end: parse_datetime(&self.end),
        }
    }
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub results: Vec<LogRecord>,
    pub error: String,
    pub pagination: Pagination,
}

/// Count, clamp, fetch. A failed count is deliberately folded into
/// "zero matches" and the fetch still runs from offset 0; a failed fetch
/// surfaces its message so the form can re-render with the submitted
/// values intact.
pub async fn run_search(store: &impl LogStore, params: &SearchParams) -> SearchOutcome {
    let filter = params.to_filter();

    let total = match store.count(&filter).await {
        Ok(total) => total,
        Err(err) => {
            tracing::warn!(error = %err, "count failed, treating as zero matches");
            0
        }
    };

    let pagination = Pagination::build(total, params.requested_page());

    match store
        .fetch_page(&filter, pagination.offset, PAGE_SIZE as i64)
        .await
    {
        Ok(results) => SearchOutcome {
            results,
            error: String::new(),
            pagination,
        },
        Err(err) => {
            tracing::error!(error = %err, "page fetch failed");
            SearchOutcome {
                results: Vec::new(),
                error: format!("Search failed: {err}"),
                pagination,
            }
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub results: Vec<LogRecord>,
    pub error: String,
    pub app: String,
    pub host: String,
    pub env: String,
    pub level: String,
    pub start: String,
    pub end: String,
    pub page: u64,
    pub total: u64,
    pub total_pages: u64,
    pub page_size: u64,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

impl IndexTemplate {
    fn empty() -> IndexTemplate {
        IndexTemplate::render_state(&SearchParams::default(), Vec::new(), String::new(), 1, 0, 0)
    }

    fn with_error(params: &SearchParams, error: String) -> IndexTemplate {
        IndexTemplate::render_state(params, Vec::new(), error, params.requested_page(), 0, 0)
    }

    fn from_outcome(params: &SearchParams, outcome: SearchOutcome) -> IndexTemplate {
        IndexTemplate::render_state(
            params,
            outcome.results,
            outcome.error,
            outcome.pagination.page,
            outcome.pagination.total,
            outcome.pagination.total_pages,
        )
    }

    fn render_state(
        params: &SearchParams,
        results: Vec<LogRecord>,
        error: String,
        page: u64,
        total: u64,
        total_pages: u64,
    ) -> IndexTemplate {
        let pagination = Pagination {
            page,
            total,
            total_pages,
            offset: 0,
        };
        IndexTemplate {
            results,
            error,
            app: params.app.clone(),
            host: params.host.clone(),
            env: params.env.clone(),
            level: params.level.clone(),
            start: params.start.clone(),
            end: params.end.clone(),
            page,
            total,
            total_pages,
            page_size: PAGE_SIZE,
            prev_href: pagination.prev_page().map(|p| page_href(params, p)),
            next_href: pagination.next_page().map(|p| page_href(params, p)),
        }
    }
}

/// Rebuilds the query string for a pagination link, keeping every filter
/// the user submitted.
fn page_href(params: &SearchParams, page: u64) -> String {
    let page = page.to_string();
    let mut pairs: Vec<(&str, &str)> = Vec::new();
    for (key, value) in [
        ("app", params.app.as_str()),
        ("host", params.host.as_str()),
        ("env", params.env.as_str()),
        ("level", params.level.as_str()),
        ("start", params.start.as_str()),
        ("end", params.end.as_str()),
    ] {
        if !value.is_empty() {
            pairs.push((key, value));
        }
    }
    pairs.push(("page", &page));

    match serde_urlencoded::to_string(&pairs) {
        Ok(query) => format!("/search?{query}"),
        Err(_) => "/search".to_string(),
    }
}

pub async fn home() -> IndexTemplate {
    IndexTemplate::empty()
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> IndexTemplate {
    // One store per request; dropped (pool and all) when we return.
    let store = match MongoStore::connect(&state.config).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(error = %err, "could not reach MongoDB");
            return IndexTemplate::with_error(
                &params,
                "Failed to connect to MongoDB. Check the connection string and that the server is reachable.".to_string(),
            );
        }
    };

    let outcome = run_search(&store, &params).await;
    IndexTemplate::from_outcome(&params, outcome)
}
