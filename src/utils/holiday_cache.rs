use anyhow::Result;
use chrono::{Datelike, Duration as DateDuration, NaiveDate};
use moka::future::Cache;
use sqlx::MySqlPool;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::error::LeaveError;
use crate::leave::day_count::SANDWICH_SCAN_LIMIT;
use crate::store::holiday_store;

/// Declared holidays, cached per calendar year.
#[derive(Clone)]
pub struct HolidayCache {
    years: Cache<i32, Arc<Vec<NaiveDate>>>,
}

impl HolidayCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            years: Cache::builder()
                .max_capacity(64) // years, not dates
                .time_to_live(ttl)
                .build(),
        }
    }

    async fn year(&self, pool: &MySqlPool, year: i32) -> Result<Arc<Vec<NaiveDate>>, LeaveError> {
        self.years
            .try_get_with(year, async move {
                let (from, to) = holiday_store::year_bounds(year)
                    .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
                holiday_store::holiday_dates_between(pool, from, to)
                    .await
                    .map(Arc::new)
            })
            .await
            .map_err(|e| LeaveError::Database(e.to_string()))
    }

    /// Holidays in every year touched by `[from, to]`.
    pub async fn between(
        &self,
        pool: &MySqlPool,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>, LeaveError> {
        let mut holidays = BTreeSet::new();
        for year in from.year()..=to.year() {
            holidays.extend(self.year(pool, year).await?.iter().copied());
        }
        Ok(holidays)
    }

    /// Holidays covering the span plus the furthest a sandwich scan can reach.
    pub async fn for_span(
        &self,
        pool: &MySqlPool,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>, LeaveError> {
        let reach = DateDuration::days(i64::from(SANDWICH_SCAN_LIMIT) + 1);
        let from = start.checked_sub_signed(reach).unwrap_or(NaiveDate::MIN);
        let to = end.checked_add_signed(reach).unwrap_or(NaiveDate::MAX);
        self.between(pool, from, to).await
    }

    pub async fn invalidate(&self, date: NaiveDate) {
        self.years.invalidate(&date.year()).await;
    }
}

/// Load the given years into the cache ahead of the first leave request.
pub async fn warmup_holiday_cache(cache: &HolidayCache, pool: &MySqlPool, years: &[i32]) -> Result<()> {
    let mut total_count = 0usize;
    for year in years {
        total_count += cache.year(pool, *year).await?.len();
    }

    tracing::info!(
        years = ?years,
        holidays = total_count,
        "Holiday cache warmup complete"
    );

    Ok(())
}
