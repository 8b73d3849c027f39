//! Structured payloads returned to the boundary layer.
//!
//! Everything here derives `Serialize` so the (external) transport layer
//! can emit it directly.  The structs are built from the entity graph by
//! the operations; they never feed back into it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use huddle_store::{ChannelId, EntityStore, MessageId, ReactId, UserId};

use crate::error::Result;

/// Result of a successful registration or login.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub u_id: UserId,
    pub token: String,
}

/// Channel id and name, as listed by the channel listing operations.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChannelSummary {
    pub channel_id: ChannelId,
    pub name: String,
}

/// A member as shown in channel details.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MemberView {
    pub u_id: UserId,
    pub name_first: String,
    pub name_last: String,
    pub pfp_filename: String,
}

impl MemberView {
    pub(crate) fn build(store: &EntityStore, u_id: UserId) -> Result<Self> {
        let user = store.user(u_id)?;
        Ok(MemberView {
            u_id,
            name_first: user.name_first().to_string(),
            name_last: user.name_last().to_string(),
            pfp_filename: user.pfp_filename().to_string(),
        })
    }
}

/// Full details of a channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelDetails {
    pub name: String,
    pub owner_members: Vec<MemberView>,
    pub all_members: Vec<MemberView>,
}

/// One reaction kind on a message, summarised for a particular viewer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReactView {
    pub react_id: ReactId,
    pub u_ids: Vec<UserId>,
    pub is_this_user_reacted: bool,
}

/// A message expanded into its full representation.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub message_id: MessageId,
    pub u_id: UserId,
    pub message: String,
    pub time_created: DateTime<Utc>,
    pub reacts: Vec<ReactView>,
    pub is_pinned: bool,
}

impl MessageView {
    pub(crate) fn build(
        store: &EntityStore,
        viewer: UserId,
        message_id: MessageId,
    ) -> Result<Self> {
        let message = store.message(message_id)?;
        let reacts = message
            .reacts()
            .iter()
            .map(|(&react_id, u_ids)| ReactView {
                react_id,
                u_ids: u_ids.iter().copied().collect(),
                is_this_user_reacted: u_ids.contains(&viewer),
            })
            .collect();
        Ok(MessageView {
            message_id,
            u_id: message.sender(),
            message: message.body().to_string(),
            time_created: message.time_sent(),
            reacts,
            is_pinned: message.is_pinned(),
        })
    }
}

/// One page of messages, newest first.  `end` is the `start` of the next
/// page, or `-1` after the final page.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePage {
    pub messages: Vec<MessageView>,
    pub start: usize,
    pub end: i64,
}

/// A user's profile details.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Profile {
    pub u_id: UserId,
    pub email: String,
    pub name_first: String,
    pub name_last: String,
    pub handle_str: String,
    pub pfp_filename: String,
}

impl Profile {
    pub(crate) fn build(store: &EntityStore, u_id: UserId) -> Result<Self> {
        let user = store.user(u_id)?;
        Ok(Profile {
            u_id,
            email: user.email().to_string(),
            name_first: user.name_first().to_string(),
            name_last: user.name_last().to_string(),
            handle_str: user.handle().to_string(),
            pfp_filename: user.pfp_filename().to_string(),
        })
    }
}

/// Whether a standup is running in a channel, and until when.
#[derive(Debug, Clone, Serialize)]
pub struct StandupStatus {
    pub is_active: bool,
    pub time_finish: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_view_serializes_with_stable_keys() {
        let view = MessageView {
            message_id: 3,
            u_id: 1,
            message: "hello".to_string(),
            time_created: Utc::now(),
            reacts: vec![ReactView {
                react_id: 1,
                u_ids: vec![2],
                is_this_user_reacted: false,
            }],
            is_pinned: false,
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["message_id"], 3);
        assert_eq!(json["message"], "hello");
        assert_eq!(json["reacts"][0]["u_ids"][0], 2);
        assert_eq!(json["reacts"][0]["is_this_user_reacted"], false);
        assert_eq!(json["is_pinned"], false);
    }
}
