use super::domain::UsageRecord;
use super::repository::{RepositoryError, UsageRepository};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// How many diagnosis sessions one installation may start per calendar day.
pub const DAILY_LIMIT: u32 = 10;

/// Current standing against the daily cap, for API responses.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UsageSnapshot {
    pub date: NaiveDate,
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
}

/// Daily counter gating how many sessions may be started.
///
/// The stored record resets implicitly when its date is not today. The
/// check-then-increment pair is not atomic against concurrent callers;
/// the system assumes a single logical writer.
pub struct UsageLimiter<U> {
    repository: Arc<U>,
    limit: u32,
}

impl<U: UsageRepository> UsageLimiter<U> {
    pub fn new(repository: Arc<U>) -> Self {
        Self::with_limit(repository, DAILY_LIMIT)
    }

    pub fn with_limit(repository: Arc<U>, limit: u32) -> Self {
        Self { repository, limit }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Today's count; 0 when nothing is stored, the stored date is stale,
    /// or the store cannot be read.
    pub fn count(&self, today: NaiveDate) -> u32 {
        match self.repository.fetch() {
            Ok(Some(record)) if record.date == today => record.count,
            Ok(_) => 0,
            Err(err) => {
                warn!(%err, "failed to read usage record, treating count as 0");
                0
            }
        }
    }

    /// Persist today's count + 1 in a single store call.
    pub fn increment(&self, today: NaiveDate) -> Result<u32, RepositoryError> {
        let count = self.count(today) + 1;
        self.repository.store(UsageRecord { date: today, count })?;
        Ok(count)
    }

    pub fn is_limit_reached(&self, today: NaiveDate) -> bool {
        self.count(today) >= self.limit
    }

    pub fn snapshot(&self, today: NaiveDate) -> UsageSnapshot {
        let count = self.count(today);
        UsageSnapshot {
            date: today,
            count,
            limit: self.limit,
            remaining: self.limit.saturating_sub(count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryUsage {
        record: Mutex<Option<UsageRecord>>,
        fail_reads: Mutex<bool>,
    }

    impl UsageRepository for InMemoryUsage {
        fn fetch(&self) -> Result<Option<UsageRecord>, RepositoryError> {
            if *self.fail_reads.lock().expect("usage mutex poisoned") {
                return Err(RepositoryError::Unavailable("test outage".to_string()));
            }
            Ok(*self.record.lock().expect("usage mutex poisoned"))
        }

        fn store(&self, record: UsageRecord) -> Result<(), RepositoryError> {
            *self.record.lock().expect("usage mutex poisoned") = Some(record);
            Ok(())
        }
    }

    fn days() -> (NaiveDate, NaiveDate) {
        let today = NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date");
        let yesterday = today.pred_opt().expect("valid predecessor");
        (today, yesterday)
    }

    #[test]
    fn fresh_day_counts_from_zero() {
        let (today, yesterday) = days();
        let repository = Arc::new(InMemoryUsage::default());
        let limiter = UsageLimiter::new(repository.clone());

        assert_eq!(limiter.count(today), 0);

        repository
            .store(UsageRecord {
                date: yesterday,
                count: 7,
            })
            .expect("store succeeds");
        assert_eq!(limiter.count(today), 0, "stale record reads as zero");
    }

    #[test]
    fn increment_accumulates_and_trips_the_limit_at_ten() {
        let (today, _) = days();
        let limiter = UsageLimiter::new(Arc::new(InMemoryUsage::default()));

        for expected in 1..=DAILY_LIMIT {
            assert!(!limiter.is_limit_reached(today));
            let count = limiter.increment(today).expect("increment succeeds");
            assert_eq!(count, expected);
        }

        assert!(limiter.is_limit_reached(today));
        assert_eq!(limiter.snapshot(today).remaining, 0);
    }

    #[test]
    fn date_rollover_resets_the_counter() {
        let (today, yesterday) = days();
        let limiter = UsageLimiter::new(Arc::new(InMemoryUsage::default()));

        for _ in 0..3 {
            limiter.increment(yesterday).expect("increment succeeds");
        }
        assert_eq!(limiter.count(yesterday), 3);

        assert_eq!(limiter.count(today), 0);
        assert_eq!(limiter.increment(today).expect("increment succeeds"), 1);
    }

    #[test]
    fn read_failures_degrade_to_zero() {
        let (today, _) = days();
        let repository = Arc::new(InMemoryUsage::default());
        let limiter = UsageLimiter::new(repository.clone());

        limiter.increment(today).expect("increment succeeds");
        *repository.fail_reads.lock().expect("usage mutex poisoned") = true;

        assert_eq!(limiter.count(today), 0);
        assert!(!limiter.is_limit_reached(today));
    }
}
