mod join_handle;

use std::{future::Future, time::Duration};

use tokio::time::{Interval, MissedTickBehavior};

pub(crate) use self::join_handle::AsyncJoinHandle;

/// Spawn a task in the background to run a future.
///
/// This must be called from an async block or function running on a tokio runtime.
pub(crate) fn spawn<F, O>(fut: F) -> AsyncJoinHandle<O>
where
    F: Future<Output = O> + Send + 'static,
    O: Send + 'static,
{
    AsyncJoinHandle::spawn(fut)
}

/// Create a new `Interval` that yields with interval of `duration`. The first tick is delayed by
/// one full period, and ticks missed while the task was busy are not made up.
/// See: <https://docs.rs/tokio/latest/tokio/time/fn.interval.html>
pub(crate) fn interval(duration: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + duration, duration);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
