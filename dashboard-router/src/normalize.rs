//! Resolves partially specified time windows into the effective query that is
//! sent to the Data API.

use chrono::{DateTime, Utc};
use performance_client::{DataSource, QueryParams};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("unknown period: {0:?}")]
    UnknownPeriod(String),
}

/// Number of periods fetched when a query only names a period.
///
/// These values are a fixed domain table and are not derived from calendar
/// arithmetic.
pub fn period_to_duration(period: &str) -> Result<i64, NormalizeError> {
    match period {
        "hour" => Ok(24),
        "day" => Ok(30),
        "week" => Ok(9),
        "month" => Ok(12),
        "quarter" => Ok(24),
        other => Err(NormalizeError::UnknownPeriod(other.to_string())),
    }
}

/// Applies the first matching rule:
///
/// 1. open window (`start_at` only, no duration) is closed at `now`
/// 2. explicit bounds override a duration
/// 3. a bare period gets its default duration
///
/// Anything else is returned unchanged.
pub fn normalize(
    mut params: QueryParams,
    now: DateTime<Utc>,
) -> Result<QueryParams, NormalizeError> {
    let has_period = params.period.as_deref().is_some_and(|p| !p.is_empty());

    match (params.start_at, params.end_at) {
        (Some(_), None) if params.duration == 0 => {
            params.end_at = Some(now);
        }
        (Some(_), Some(_)) if params.duration != 0 => {
            params.duration = 0;
        }
        (None, None) if has_period && params.duration == 0 => {
            let period = params.period.as_deref().unwrap_or_default();
            params.duration = period_to_duration(period)?;
        }
        _ => {}
    }

    Ok(params)
}

pub fn normalize_source(
    source: DataSource,
    now: DateTime<Utc>,
) -> Result<DataSource, NormalizeError> {
    Ok(DataSource {
        query_params: normalize(source.query_params, now)?,
        ..source
    })
}
