//! Sending, scheduling, editing and reacting to messages.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use huddle_store::{
    validate_message_body, ChannelId, EntityStore, Message, MessageId, UserId, REACT_THUMBS_UP,
};

use crate::context::AppContext;
use crate::error::{CoreError, Result};
use crate::scheduler;

/// Send a message to a channel the caller belongs to.
pub async fn send(
    ctx: &Arc<AppContext>,
    token: &str,
    channel_id: ChannelId,
    body: &str,
) -> Result<MessageId> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| {
        validate_message_body(body)?;
        let channel = store.channel(channel_id)?;
        if !channel.is_member(u_id) {
            return Err(CoreError::unauthorized(
                "User is not a member of the channel",
            ));
        }
        let message_id = store.new_message_id();
        store.register_message(message_id, Message::new(u_id, channel_id, body, Utc::now())?);
        store.channel_mut(channel_id)?.add_message(message_id);
        Ok(message_id)
    })
    .await
}

/// Create a message now but deliver it at a future time.
///
/// The message is allocated and persisted immediately, so its id is stable,
/// but it is not listed in the channel until the delivery callback fires.
pub async fn send_later(
    ctx: &Arc<AppContext>,
    token: &str,
    channel_id: ChannelId,
    body: &str,
    time_sent: DateTime<Utc>,
) -> Result<MessageId> {
    let u_id = ctx.sessions.verify_token(token).await?;
    let message_id = ctx
        .mutate(|store| {
            validate_message_body(body)?;
            let channel = store.channel(channel_id)?;
            if !channel.is_member(u_id) {
                return Err(CoreError::unauthorized(
                    "User is not a member of the channel",
                ));
            }
            if time_sent <= Utc::now() {
                return Err(CoreError::invalid("Time sent is in the past"));
            }
            let message_id = store.new_message_id();
            store.register_message(message_id, Message::new(u_id, channel_id, body, time_sent)?);
            Ok(message_id)
        })
        .await?;

    let ctx = Arc::clone(ctx);
    scheduler::schedule_at(time_sent, async move {
        deliver_deferred(ctx, channel_id, message_id).await;
    });

    Ok(message_id)
}

/// Delivery callback for [`send_later`]: list the already-persisted message
/// in its channel.  Failures are logged, not retried.
async fn deliver_deferred(ctx: Arc<AppContext>, channel_id: ChannelId, message_id: MessageId) {
    let result = ctx
        .mutate(|store| {
            store.channel_mut(channel_id)?.add_message(message_id);
            Ok(())
        })
        .await;
    if let Err(e) = result {
        warn!(channel_id, message_id, error = %e, "deferred message delivery failed");
    }
}

/// Delete a message.  Allowed for its sender and for admins and the site
/// owner.
pub async fn remove(ctx: &Arc<AppContext>, token: &str, message_id: MessageId) -> Result<()> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| remove_message(store, u_id, message_id))
        .await
}

/// Replace a message's body.  An empty body deletes the message instead.
/// Same privilege rule as [`remove`].
pub async fn edit(
    ctx: &Arc<AppContext>,
    token: &str,
    message_id: MessageId,
    body: &str,
) -> Result<()> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| {
        validate_message_body(body)?;
        check_message_rights(store, u_id, message_id)?;
        if body.is_empty() {
            remove_message(store, u_id, message_id)
        } else {
            Ok(store.message_mut(message_id)?.set_body(body)?)
        }
    })
    .await
}

/// React to a message.
pub async fn react(
    ctx: &Arc<AppContext>,
    token: &str,
    message_id: MessageId,
    react_id: u32,
) -> Result<()> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| {
        store.message(message_id)?;
        if react_id != REACT_THUMBS_UP {
            return Err(CoreError::invalid("Invalid react id"));
        }
        Ok(store.message_mut(message_id)?.add_react(u_id, react_id)?)
    })
    .await
}

/// Withdraw the caller's reaction from a message.
pub async fn unreact(
    ctx: &Arc<AppContext>,
    token: &str,
    message_id: MessageId,
    react_id: u32,
) -> Result<()> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| {
        store.message(message_id)?;
        if react_id != REACT_THUMBS_UP {
            return Err(CoreError::invalid("Invalid react id"));
        }
        Ok(store.message_mut(message_id)?.remove_react(u_id, react_id)?)
    })
    .await
}

/// Pin a message.  Requires admin or site-owner permission.
pub async fn pin(ctx: &Arc<AppContext>, token: &str, message_id: MessageId) -> Result<()> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| {
        store.message(message_id)?;
        check_moderator(store, u_id)?;
        Ok(store.message_mut(message_id)?.pin()?)
    })
    .await
}

/// Unpin a message.  Requires admin or site-owner permission.
pub async fn unpin(ctx: &Arc<AppContext>, token: &str, message_id: MessageId) -> Result<()> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| {
        store.message(message_id)?;
        check_moderator(store, u_id)?;
        Ok(store.message_mut(message_id)?.unpin()?)
    })
    .await
}

fn check_moderator(store: &EntityStore, u_id: UserId) -> Result<()> {
    if !store.user(u_id)?.permission().can_moderate() {
        return Err(CoreError::unauthorized("User does not have permission"));
    }
    Ok(())
}

fn check_message_rights(store: &EntityStore, u_id: UserId, message_id: MessageId) -> Result<()> {
    let message = store.message(message_id)?;
    if message.sender() != u_id && !store.user(u_id)?.permission().can_moderate() {
        return Err(CoreError::unauthorized("User does not have permission"));
    }
    Ok(())
}

fn remove_message(store: &mut EntityStore, u_id: UserId, message_id: MessageId) -> Result<()> {
    check_message_rights(store, u_id, message_id)?;
    let channel_id = store.message(message_id)?.channel_id();
    store.channel_mut(channel_id)?.remove_message(message_id)?;
    store.delete_message(message_id)?;
    Ok(())
}
