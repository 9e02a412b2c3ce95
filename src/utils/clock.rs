use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Source of time for the poller. Wall clock time stamps committed ticks, instants drive the
/// schedule.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    /// Stored as `last_tick` of the store document.
    fn time(&self) -> DateTime<Utc>;

    /// Monotonic, unaffected by wall clock adjustments between ticks.
    fn instant(&self) -> Instant;

    async fn sleep_until(&self, instant: Instant);
}

/// Tokio backed clock. Under a paused test runtime both `instant` and `sleep_until` follow the
/// virtual time, while `time` keeps reporting the real wall clock.
pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, instant: Instant) {
        tokio::time::sleep_until(instant).await;
    }
}
