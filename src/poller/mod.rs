//! Background sampling of tracked subjects. [Poller] runs a single cooperative loop: every
//! interval it looks at what each tracked subject is doing and commits one unit per subject to
//! the store. Ticks never overlap, so counters of a subject are never written concurrently.

pub mod controller;
pub mod file_presence;
pub mod presence;

use std::time::Duration;

use presence::PresenceSource;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    tracking::{error::TrackingError, store::ActivityStore, ActivitySample, TrackedSubject},
    utils::clock::Clock,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    /// Time between ticks. Every tick adds one unit, so this is the length of a unit.
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

pub struct Poller<S> {
    store: S,
    presence: Box<dyn PresenceSource>,
    interval: Duration,
    clock: Box<dyn Clock>,
}

impl<S: ActivityStore> Poller<S> {
    pub fn new(
        store: S,
        presence: Box<dyn PresenceSource>,
        config: PollerConfig,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            store,
            presence,
            interval: config.interval,
            clock,
        }
    }

    /// Samples every tracked subject once and commits the result. Returns the amount of
    /// incremented records.
    pub async fn tick(&mut self) -> Result<usize, TrackingError> {
        let tracked = self.store.list_tracked().await?;
        if tracked.is_empty() {
            debug!("Nobody is tracked");
            return Ok(0);
        }

        if let Err(e) = self.presence.refresh() {
            warn!("Couldn't refresh presence, skipping tick {e:?}");
            return Ok(0);
        }

        let samples = collect_samples(self.presence.as_ref(), &tracked);
        if samples.is_empty() {
            debug!("No tracked subject is active");
            return Ok(0);
        }

        let applied = self.store.record_tick(samples, self.clock.time()).await?;
        info!("Committed {applied} samples");
        Ok(applied)
    }

    /// Executes the poller event loop. The first tick happens one interval after the start.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut next_tick = self.clock.instant();
        loop {
            next_tick += self.interval;
            let now = self.clock.instant();
            if next_tick < now {
                warn!("Poller fell behind, skipping missed ticks");
                next_tick = now + self.interval;
            }

            tokio::select! {
                // Cancellation is only observed between ticks, a started tick always commits.
                _ = shutdown.cancelled() => {
                    info!("Poller shutting down");
                    return;
                }
                _ = self.clock.sleep_until(next_tick) => ()
            }

            let span = info_span!("Poll tick");
            if let Err(e) = self.tick().instrument(span).await {
                error!("Failed to commit tick {e:?}");
            }
        }
    }
}

/// Takes the primary activity of every subject that can be found. Subjects that can't be
/// resolved or aren't doing anything are skipped.
fn collect_samples(
    presence: &dyn PresenceSource,
    tracked: &[TrackedSubject],
) -> Vec<ActivitySample> {
    tracked
        .iter()
        .filter_map(|&TrackedSubject { subject, group }| {
            let Some(group_presence) = presence.resolve_group(group) else {
                debug!("Group {group} of {subject} is unavailable");
                return None;
            };
            let Some(subject_presence) = group_presence.resolve_subject(subject) else {
                debug!("Subject {subject} isn't present in {group}");
                return None;
            };
            let activity = subject_presence.current_activities().first()?;
            debug!("Subject {subject} is doing {:?}", activity);
            Some(ActivitySample {
                subject,
                activity: activity.name.clone(),
                kind: activity.kind,
            })
        })
        .collect()
}
