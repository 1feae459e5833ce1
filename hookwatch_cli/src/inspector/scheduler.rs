//! Periodic refresh timers
//!
//! Two independent repeating timers (connection status, relative-time labels)
//! and a one-shot permission request. None of them is ever cancelled while the
//! session runs.

use std::pin::Pin;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior, Sleep};

/// How often the connection status is re-read
pub const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// How often relative-time labels are recomputed
pub const RELATIVE_TIME_INTERVAL: Duration = Duration::from_secs(5);

/// Delay before asking for notification permission
pub const PERMISSION_DELAY: Duration = Duration::from_secs(1);

/// What a scheduler wake-up is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Status,
    RelativeTimes,
    RequestPermission,
}

pub struct Scheduler {
    status: Interval,
    relative_times: Interval,
    permission: Option<Pin<Box<Sleep>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_periods(STATUS_INTERVAL, RELATIVE_TIME_INTERVAL, PERMISSION_DELAY)
    }

    pub fn with_periods(status: Duration, relative_times: Duration, permission_delay: Duration) -> Self {
        let start = Instant::now();
        Self {
            status: repeating(start, status),
            relative_times: repeating(start, relative_times),
            permission: Some(Box::pin(tokio::time::sleep(permission_delay))),
        }
    }

    /// Wait for the next timer to fire
    pub async fn next(&mut self) -> Tick {
        let permission_pending = self.permission.is_some();
        let permission = &mut self.permission;

        tokio::select! {
            _ = self.status.tick() => Tick::Status,
            _ = self.relative_times.tick() => Tick::RelativeTimes,
            _ = async {
                if let Some(sleep) = permission.as_mut() {
                    sleep.as_mut().await;
                }
            }, if permission_pending => {
                *permission = None;
                Tick::RequestPermission
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// First tick one period after `start`; late ticks are delayed, never bunched up
fn repeating(start: Instant, period: Duration) -> Interval {
    let mut interval = interval_at(start + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tick_cadence() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut ticks = Vec::new();

        loop {
            let tick = scheduler.next().await;
            let elapsed = start.elapsed();
            if elapsed > Duration::from_millis(10_500) {
                break;
            }
            ticks.push((tick, elapsed));
        }

        let count = |kind: Tick| ticks.iter().filter(|(t, _)| *t == kind).count();
        assert_eq!(count(Tick::Status), 10);
        assert_eq!(count(Tick::RelativeTimes), 2);
        assert_eq!(count(Tick::RequestPermission), 1);

        for (tick, elapsed) in &ticks {
            match tick {
                Tick::Status => assert!(elapsed.subsec_millis() < 10),
                Tick::RelativeTimes => assert_eq!(elapsed.as_secs() % 5, 0),
                Tick::RequestPermission => assert_eq!(elapsed.as_secs(), 1),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_fires_immediately() {
        let mut scheduler = Scheduler::new();

        let early = tokio::time::timeout(Duration::from_millis(999), scheduler.next()).await;
        assert!(early.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_fires_once() {
        let mut scheduler = Scheduler::with_periods(
            Duration::from_secs(60),
            Duration::from_secs(120),
            Duration::from_millis(100),
        );

        assert_eq!(scheduler.next().await, Tick::RequestPermission);
        assert_eq!(scheduler.next().await, Tick::Status);
    }
}
