//! One-shot deferred execution.
//!
//! Deferred message delivery and standup flushing share this mechanism:
//! register a callback to fire once at a future wall-clock time, on its own
//! task, independent of the request that registered it.  Registration
//! returns immediately; the callback fires at or after the scheduled time,
//! never before, and exactly once unless cancelled first.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

/// Handle to a registered callback.  Dropping the handle does not affect
/// the timer; call [`TimerHandle::cancel`] to abort a callback that has not
/// fired yet.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Abort the callback if it has not fired.  Cancelling a fired timer is
    /// a no-op.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the callback has run (or been cancelled) to completion.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Register `job` to run after `delay`.
pub fn schedule_in<F>(delay: Duration, job: F) -> TimerHandle
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        job.await;
    });
    TimerHandle { task }
}

/// Register `job` to run at `fire_at`.  A deadline in the past fires
/// immediately.
pub fn schedule_at<F>(fire_at: DateTime<Utc>, job: F) -> TimerHandle
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let delay = (fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    schedule_in(delay, job)
}
