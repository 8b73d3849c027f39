//! Substring search over the caller's channels.

use std::sync::Arc;

use crate::context::AppContext;
use crate::error::Result;
use crate::views::MessageView;

/// All messages containing `query`, drawn from every channel the caller
/// belongs to.  Within each channel, results run newest first.
pub async fn search(ctx: &Arc<AppContext>, token: &str, query: &str) -> Result<Vec<MessageView>> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.read(|store| {
        let mut hits = Vec::new();
        for &channel_id in store.user(u_id)?.channels() {
            let channel = store.channel(channel_id)?;
            for &message_id in channel.message_ids().iter().rev() {
                if store.message(message_id)?.body().contains(query) {
                    hits.push(MessageView::build(store, u_id, message_id)?);
                }
            }
        }
        Ok(hits)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{channel, channels, message, testutil};

    #[tokio::test]
    async fn test_search_scans_only_the_callers_channels() {
        let ctx = testutil::ctx();
        let (alice, bob, general) = testutil::two_member_channel(&ctx).await;
        let private = channels::create(&ctx, &alice.token, "owners", false)
            .await
            .unwrap();

        message::send(&ctx, &alice.token, general, "deploy went fine")
            .await
            .unwrap();
        message::send(&ctx, &bob.token, general, "deploy broke staging")
            .await
            .unwrap();
        message::send(&ctx, &alice.token, general, "unrelated chatter")
            .await
            .unwrap();
        message::send(&ctx, &alice.token, private, "secret deploy notes")
            .await
            .unwrap();

        // Newest first within the channel; the private channel is invisible
        // to Bob.
        let hits = search(&ctx, &bob.token, "deploy").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].message, "deploy broke staging");
        assert_eq!(hits[1].message, "deploy went fine");

        let hits = search(&ctx, &alice.token, "deploy").await.unwrap();
        assert_eq!(hits.len(), 3);

        assert!(search(&ctx, &bob.token, "nothing like this").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_matches_everything() {
        let ctx = testutil::ctx();
        let (alice, _, general) = testutil::two_member_channel(&ctx).await;
        message::send(&ctx, &alice.token, general, "one").await.unwrap();
        message::send(&ctx, &alice.token, general, "two").await.unwrap();

        assert_eq!(search(&ctx, &alice.token, "").await.unwrap().len(), 2);

        // Leaving the channel empties the result set.
        channel::leave(&ctx, &alice.token, general).await.unwrap();
        assert!(search(&ctx, &alice.token, "").await.unwrap().is_empty());
    }
}
