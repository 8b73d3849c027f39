//! Per-channel standup buffers.
//!
//! A standup exists only between start and flush.  Its state never touches
//! the persisted graph: the server must be running to time the window, so
//! there is nothing meaningful to restore after a restart.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use huddle_store::{ChannelId, UserId};

use crate::error::{CoreError, Result};

/// Buffered state of one active standup window.
#[derive(Debug)]
pub struct Standup {
    starter: UserId,
    time_finish: DateTime<Utc>,
    lines: Vec<String>,
}

impl Standup {
    /// The user the flushed summary message will be attributed to.
    pub fn starter(&self) -> UserId {
        self.starter
    }

    pub fn time_finish(&self) -> DateTime<Utc> {
        self.time_finish
    }

    /// Buffered `"First Last: text"` lines, in submission order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// All currently active standups, keyed by channel.
pub struct StandupRegistry {
    inner: Mutex<HashMap<ChannelId, Standup>>,
}

impl StandupRegistry {
    pub fn new() -> Self {
        StandupRegistry {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Open a standup window for a channel.  At most one window per channel
    /// may be active at a time.
    pub async fn begin(
        &self,
        channel_id: ChannelId,
        starter: UserId,
        time_finish: DateTime<Utc>,
    ) -> Result<()> {
        let mut standups = self.inner.lock().await;
        if standups.contains_key(&channel_id) {
            return Err(CoreError::invalid(
                "A standup is already active in the channel",
            ));
        }
        standups.insert(
            channel_id,
            Standup {
                starter,
                time_finish,
                lines: Vec::new(),
            },
        );
        Ok(())
    }

    /// Append a formatted line to a channel's buffer.
    pub async fn push_line(&self, channel_id: ChannelId, line: String) -> Result<()> {
        let mut standups = self.inner.lock().await;
        match standups.get_mut(&channel_id) {
            Some(standup) => {
                standup.lines.push(line);
                Ok(())
            }
            None => Err(CoreError::invalid("No standup running in the channel")),
        }
    }

    /// Close a channel's window, handing its buffered state to the caller.
    pub async fn finish(&self, channel_id: ChannelId) -> Option<Standup> {
        self.inner.lock().await.remove(&channel_id)
    }

    /// The finish time of the channel's active standup, if any.
    pub async fn time_finish(&self, channel_id: ChannelId) -> Option<DateTime<Utc>> {
        self.inner
            .lock()
            .await
            .get(&channel_id)
            .map(|s| s.time_finish)
    }

    /// Drop every active standup.  Used for test isolation.
    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }
}

impl Default for StandupRegistry {
    fn default() -> Self {
        Self::new()
    }
}
