//! Reverse-chronological message pagination.
//!
//! Channels store message ids oldest-first; retrieval presents them
//! newest-first in fixed pages of [`PAGE_SIZE`].  The returned `end` is the
//! `start` of the next page, or `-1` once the final page has been served.

use huddle_store::MessageId;

use crate::error::{CoreError, Result};

/// Fixed page size for message retrieval.
pub const PAGE_SIZE: usize = 50;

/// Slice one page out of a channel's message-id sequence.
///
/// `start` counts from the most recent message (0 = newest).  Returns the
/// page ids newest-first, plus the `end` sentinel: `-1` when there is no
/// further page, i.e. when `start + PAGE_SIZE` reaches past the last
/// message.  Paging forward with the previous `end` as the next `start`
/// walks the whole history without duplicates or gaps.
pub fn page(message_ids: &[MessageId], start: usize) -> Result<(Vec<MessageId>, i64)> {
    let count = message_ids.len();

    if count == 0 && start == 0 {
        return Ok((Vec::new(), -1));
    }
    if start >= count {
        return Err(CoreError::invalid(
            "Start index of message page exceeds number of messages in the channel",
        ));
    }

    let end = start + PAGE_SIZE;
    let ids = message_ids
        .iter()
        .rev()
        .skip(start)
        .take(PAGE_SIZE)
        .copied()
        .collect();

    let end = if end >= count { -1 } else { end as i64 };
    Ok((ids, end))
}
