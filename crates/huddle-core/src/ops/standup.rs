//! Timed standup windows: buffer member messages, flush them as one
//! aggregated message when the window closes.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use huddle_store::{validate_message_body, ChannelId, Message, UserId};

use crate::context::AppContext;
use crate::error::{CoreError, Result};
use crate::scheduler;
use crate::views::StandupStatus;

/// Start a standup in a channel for `length_secs` seconds.  Returns the
/// time the window closes.
pub async fn start(
    ctx: &Arc<AppContext>,
    token: &str,
    channel_id: ChannelId,
    length_secs: u64,
) -> Result<DateTime<Utc>> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.read(|store| {
        let channel = store.channel(channel_id)?;
        if !channel.is_member(u_id) {
            return Err(CoreError::unauthorized(
                "Authorised user is not a member of the channel",
            ));
        }
        Ok(())
    })
    .await?;

    let time_finish = Utc::now() + Duration::seconds(length_secs as i64);
    ctx.standups.begin(channel_id, u_id, time_finish).await?;

    let ctx = Arc::clone(ctx);
    scheduler::schedule_in(StdDuration::from_secs(length_secs), async move {
        flush(ctx, channel_id).await;
    });

    Ok(time_finish)
}

/// Flush callback: turn the buffered lines into one message attributed to
/// the user who started the standup, and discard the window.  Failures are
/// logged, not retried.
async fn flush(ctx: Arc<AppContext>, channel_id: ChannelId) {
    let Some(standup) = ctx.standups.finish(channel_id).await else {
        warn!(channel_id, "standup timer fired with no active window");
        return;
    };

    let starter: UserId = standup.starter();
    let body = standup.lines().join("\n");

    let result = ctx
        .mutate(|store| {
            let message_id = store.new_message_id();
            store.register_message(
                message_id,
                Message::new(starter, channel_id, &body, Utc::now())?,
            );
            store.channel_mut(channel_id)?.add_message(message_id);
            Ok(())
        })
        .await;
    if let Err(e) = result {
        warn!(channel_id, error = %e, "standup flush failed");
    }
}

/// Buffer a message into the channel's active standup.
pub async fn send(
    ctx: &Arc<AppContext>,
    token: &str,
    channel_id: ChannelId,
    body: &str,
) -> Result<()> {
    let u_id = ctx.sessions.verify_token(token).await?;
    let line = ctx
        .read(|store| {
            let channel = store.channel(channel_id)?;
            if !channel.is_member(u_id) {
                return Err(CoreError::unauthorized(
                    "Authorised user is not a member of the channel",
                ));
            }
            let user = store.user(u_id)?;
            Ok(format!(
                "{} {}: {}",
                user.name_first(),
                user.name_last(),
                body
            ))
        })
        .await?;

    if ctx.standups.time_finish(channel_id).await.is_none() {
        return Err(CoreError::invalid("No standup running in the channel"));
    }
    // The formatted line becomes part of a normal message, so it must obey
    // the same length limit.
    validate_message_body(&line)?;
    ctx.standups.push_line(channel_id, line).await
}

/// Whether a standup is running in the channel, and until when.
pub async fn active(
    ctx: &Arc<AppContext>,
    token: &str,
    channel_id: ChannelId,
) -> Result<StandupStatus> {
    ctx.sessions.verify_token(token).await?;
    ctx.read(|store| {
        store.channel(channel_id)?;
        Ok(())
    })
    .await?;

    let time_finish = ctx.standups.time_finish(channel_id).await;
    Ok(StandupStatus {
        is_active: time_finish.is_some(),
        time_finish,
    })
}
