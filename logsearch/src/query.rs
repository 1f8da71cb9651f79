use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use mongodb::bson::{doc, Document};

use crate::record::LogRecord;

pub const PAGE_SIZE: u64 = 50;

/// Accepts `YYYY-MM-DDTHH:MM` (what the datetime-local form input emits)
/// or a bare `YYYY-MM-DD`. Anything else is treated as if the field had
/// been left empty, so a malformed bound never fails a search.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// All filters the search form can apply. Absent fields impose no
/// constraint; present fields are AND-composed. Time bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFilter {
    pub app: Option<String>,
    pub host: Option<String>,
    pub env: Option<String>,
    pub level: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl LogFilter {
    /// Match criteria for the store, same shape the indexes cover.
    pub fn to_document(&self) -> Document {
        let mut criteria = doc! {};
        if let Some(level) = &self.level {
            criteria.insert("level", level.as_str());
        }
        if self.start.is_some() || self.end.is_some() {
            let mut bounds = doc! {};
            if let Some(start) = self.start {
                bounds.insert("$gte", mongodb::bson::DateTime::from_chrono(start));
            }
            if let Some(end) = self.end {
                bounds.insert("$lte", mongodb::bson::DateTime::from_chrono(end));
            }
            criteria.insert("timestamp", bounds);
        }
        if let Some(app) = &self.app {
            criteria.insert("meta.app", app.as_str());
        }
        if let Some(host) = &self.host {
            criteria.insert("meta.host", host.as_str());
        }
        if let Some(env) = &self.env {
            criteria.insert("meta.env", env.as_str());
        }
        criteria
    }

    /// The same predicate `to_document` expresses, evaluated in-process.
    /// Keeps the in-memory store double honest with the Mongo query.
    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(app) = &self.app {
            if &record.meta.app != app {
                return false;
            }
        }
        if let Some(host) = &self.host {
            if &record.meta.host != host {
                return false;
            }
        }
        if let Some(env) = &self.env {
            if &record.meta.env != env {
                return false;
            }
        }
        if let Some(level) = &self.level {
            if record.level.as_str() != level {
                return false;
            }
        }
        if let Some(start) = self.start {
            if record.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if record.timestamp > end {
                return false;
            }
        }
        true
    }
}

/// Page arithmetic over a fixed page size of 50. A requested page is
/// clamped to `[1, total_pages]`; with zero matches there are zero pages
/// and the offset stays 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub total: u64,
    pub total_pages: u64,
    pub offset: u64,
}

impl Pagination {
    pub fn build(total: u64, requested_page: u64) -> Pagination {
        let total_pages = total.div_ceil(PAGE_SIZE);
        let mut page = requested_page.max(1);
        if total_pages > 0 && page > total_pages {
            page = total_pages;
        }
        let offset = if total_pages == 0 {
            0
        } else {
            (page - 1) * PAGE_SIZE
        };
        Pagination {
            page,
            total,
            total_pages,
            offset,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.total_pages > 0 && self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.total_pages > 0 && self.page < self.total_pages
    }

    pub fn prev_page(&self) -> Option<u64> {
        self.has_prev().then(|| self.page - 1)
    }

    pub fn next_page(&self) -> Option<u64> {
        self.has_next().then(|| self.page + 1)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::record::{Level, Meta};

    fn record(app: &str, host: &str, env: &str, level: Level, ts: DateTime<Utc>) -> LogRecord {
        LogRecord {
            timestamp: ts,
            meta: Meta {
                app: app.to_string(),
                host: host.to_string(),
                env: env.to_string(),
            },
            level,
            logger: "com.example.service.UserService".to_string(),
            thread: "task-scheduler-1".to_string(),
            message: "ok".to_string(),
            uri: "/api/orders".to_string(),
            method: "GET".to_string(),
            status: 200,
            latency_ms: 12,
            trace_id: "t".to_string(),
            span_id: "s".to_string(),
            stack: None,
        }
    }

    #[test]
    fn parses_both_accepted_formats() {
        let dt = parse_datetime("2024-03-01T14:30").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap());

        let day = parse_datetime("2024-03-01").unwrap();
        assert_eq!(day, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn malformed_date_is_treated_as_absent() {
        assert_eq!(parse_datetime("not-a-date"), None);
        assert_eq!(parse_datetime("2024-13-99"), None);
        assert_eq!(parse_datetime(""), None);
    }

    #[test]
    fn pagination_arithmetic() {
        let p = Pagination::build(125, 1);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 0);
        assert!(!p.has_prev());
        assert!(p.has_next());
        assert_eq!(p.next_page(), Some(2));
    }

    #[test]
    fn page_past_the_end_clamps_down() {
        let p = Pagination::build(125, 5);
        assert_eq!(p.page, 3);
        assert_eq!(p.offset, 100);
        assert!(p.has_prev());
        assert!(!p.has_next());
    }

    #[test]
    fn zero_total_means_zero_pages_and_zero_offset() {
        let p = Pagination::build(0, 7);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.offset, 0);
        assert!(!p.has_prev());
        assert!(!p.has_next());
        assert_eq!(p.prev_page(), None);
        assert_eq!(p.next_page(), None);
    }

    #[test]
    fn page_zero_clamps_up_to_one() {
        let p = Pagination::build(10, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn filters_and_compose() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let rec = record("svc-a", "host-1", "prod", Level::Error, ts);

        // no filters: everything matches
        assert!(LogFilter::default().matches(&rec));

        // one matching filter
        let by_app = LogFilter {
            app: Some("svc-a".to_string()),
            ..Default::default()
        };
        assert!(by_app.matches(&rec));

        // all filters matching
        let all = LogFilter {
            app: Some("svc-a".to_string()),
            host: Some("host-1".to_string()),
            env: Some("prod".to_string()),
            level: Some("ERROR".to_string()),
            start: Some(ts - chrono::Duration::hours(1)),
            end: Some(ts + chrono::Duration::hours(1)),
        };
        assert!(all.matches(&rec));

        // one mismatch fails the whole conjunction
        let mut one_off = all.clone();
        one_off.host = Some("host-2".to_string());
        assert!(!one_off.matches(&rec));

        let mut wrong_level = all.clone();
        wrong_level.level = Some("INFO".to_string());
        assert!(!wrong_level.matches(&rec));
    }

    #[test]
    fn time_bounds_are_inclusive() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let rec = record("svc-a", "host-1", "dev", Level::Info, ts);

        let exact = LogFilter {
            start: Some(ts),
            end: Some(ts),
            ..Default::default()
        };
        assert!(exact.matches(&rec));

        let after = LogFilter {
            start: Some(ts + chrono::Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!after.matches(&rec));

        let before = LogFilter {
            end: Some(ts - chrono::Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!before.matches(&rec));
    }

    #[test]
    fn document_contains_only_supplied_filters() {
        let empty = LogFilter::default().to_document();
        assert!(empty.is_empty());

        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let filter = LogFilter {
            app: Some("svc-a".to_string()),
            level: Some("WARN".to_string()),
            start: Some(ts),
            ..Default::default()
        };
        let criteria = filter.to_document();
        assert_eq!(criteria.get_str("meta.app").unwrap(), "svc-a");
        assert_eq!(criteria.get_str("level").unwrap(), "WARN");
        assert!(criteria.get_document("timestamp").unwrap().contains_key("$gte"));
        assert!(!criteria.get_document("timestamp").unwrap().contains_key("$lte"));
        assert!(!criteria.contains_key("meta.host"));
        assert!(!criteria.contains_key("meta.env"));
    }
}
