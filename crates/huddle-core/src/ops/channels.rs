//! Channel operations that are not scoped to one existing channel.

use std::sync::Arc;

use huddle_store::ChannelId;

use crate::context::AppContext;
use crate::error::Result;
use crate::views::ChannelSummary;

/// Create a channel; the creator becomes its first member and owner.
pub async fn create(
    ctx: &Arc<AppContext>,
    token: &str,
    name: &str,
    is_public: bool,
) -> Result<ChannelId> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| Ok(store.create_channel(u_id, name, is_public)?))
        .await
}

/// List the channels the caller belongs to, in join order.
pub async fn list(ctx: &Arc<AppContext>, token: &str) -> Result<Vec<ChannelSummary>> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.read(|store| {
        store
            .user(u_id)?
            .channels()
            .iter()
            .map(|&channel_id| {
                Ok(ChannelSummary {
                    channel_id,
                    name: store.channel(channel_id)?.name().to_string(),
                })
            })
            .collect()
    })
    .await
}

/// List every channel on the server, public or private.
pub async fn list_all(ctx: &Arc<AppContext>, token: &str) -> Result<Vec<ChannelSummary>> {
    ctx.sessions.verify_token(token).await?;
    ctx.read(|store| {
        store
            .channel_ids()
            .map(|channel_id| {
                Ok(ChannelSummary {
                    channel_id,
                    name: store.channel(channel_id)?.name().to_string(),
                })
            })
            .collect()
    })
    .await
}
