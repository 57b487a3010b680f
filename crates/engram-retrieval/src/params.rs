//! `retrieve()`'s parameter bag and `since`/`sort_by` parsing (spec §4.5).

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use engram_core::errors::{EngramResult, RetrievalError};
use engram_core::config::RetrievalConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Score,
    Date,
}

impl SortBy {
    pub fn parse(s: &str) -> EngramResult<Self> {
        match s {
            "score" => Ok(SortBy::Score),
            "date" => Ok(SortBy::Date),
            other => Err(RetrievalError::InvalidSortKey(other.to_string()).into()),
        }
    }
}

/// Parameters for [`crate::retrieve`], defaulting the way spec §4.5's
/// signature does (`top_k=20, spread_depth=2, sort_by=score, reinforce=true,
/// compact=false`).
#[derive(Debug, Clone)]
pub struct RetrieveParams {
    pub query: Option<String>,
    pub query_embedding: Option<Vec<f32>>,
    pub labels: Option<Vec<String>>,
    pub author: Option<String>,
    pub top_k: usize,
    pub spread_depth: u32,
    pub since: Option<String>,
    pub sort_by: SortBy,
    pub reinforce: bool,
    pub compact: bool,
}

impl Default for RetrieveParams {
    fn default() -> Self {
        Self {
            query: None,
            query_embedding: None,
            labels: None,
            author: None,
            top_k: 20,
            spread_depth: 2,
            since: None,
            sort_by: SortBy::Score,
            reinforce: true,
            compact: false,
        }
    }
}

impl RetrieveParams {
    /// Builds params seeded from `config`'s defaults for `top_k`/`spread_depth`.
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.default_top_k,
            spread_depth: config.default_spread_depth,
            ..Default::default()
        }
    }
}

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)([dh])$").unwrap());

/// Resolves a `since` expression — `"Nd"`/`"Nh"` relative, or an ISO
/// date/datetime absolute — to a UTC instant (spec §4.5 "`since`
/// resolution").
pub fn resolve_since(expr: &str, now: DateTime<Utc>) -> EngramResult<DateTime<Utc>> {
    if let Some(caps) = RELATIVE_RE.captures(expr) {
        let amount: i64 = caps[1].parse().map_err(|_| RetrievalError::InvalidSince(expr.to_string()))?;
        let duration = match &caps[2] {
            "d" => chrono::Duration::days(amount),
            "h" => chrono::Duration::hours(amount),
            _ => unreachable!(),
        };
        return Ok(now - duration);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(expr) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0).unwrap();
        return Ok(Utc.from_utc_datetime(&naive));
    }

    Err(RetrievalError::InvalidSince(expr.to_string()).into())
}
