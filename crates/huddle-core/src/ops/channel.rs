//! Operations on a single existing channel.

use std::sync::Arc;

use huddle_store::{ChannelId, Permission, UserId};

use crate::context::AppContext;
use crate::error::{CoreError, Result};
use crate::pagination;
use crate::views::{ChannelDetails, MemberView, MessagePage, MessageView};

/// Invite a user into a channel.  The invitee is added immediately.
pub async fn invite(
    ctx: &Arc<AppContext>,
    token: &str,
    channel_id: ChannelId,
    u_id: UserId,
) -> Result<()> {
    let inviter = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| {
        let channel = store.channel(channel_id)?;
        store.user(u_id)?;
        if !channel.is_member(inviter) {
            return Err(CoreError::unauthorized(
                "Authorised user is not a member of the channel",
            ));
        }
        if channel.is_member(u_id) {
            return Err(CoreError::invalid(
                "Invited user is already a member of the channel",
            ));
        }
        Ok(store.join_channel(u_id, channel_id)?)
    })
    .await
}

/// Name, owners and members of a channel the caller belongs to.
pub async fn details(
    ctx: &Arc<AppContext>,
    token: &str,
    channel_id: ChannelId,
) -> Result<ChannelDetails> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.read(|store| {
        let channel = store.channel(channel_id)?;
        if !channel.is_member(u_id) {
            return Err(CoreError::unauthorized(
                "Authorised user is not a member of the channel",
            ));
        }
        Ok(ChannelDetails {
            name: channel.name().to_string(),
            owner_members: channel
                .owners()
                .iter()
                .map(|&o| MemberView::build(store, o))
                .collect::<Result<_>>()?,
            all_members: channel
                .members()
                .iter()
                .map(|&m| MemberView::build(store, m))
                .collect::<Result<_>>()?,
        })
    })
    .await
}

/// One page of a channel's messages, newest first, starting `start` messages
/// back from the most recent.
pub async fn messages(
    ctx: &Arc<AppContext>,
    token: &str,
    channel_id: ChannelId,
    start: usize,
) -> Result<MessagePage> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.read(|store| {
        let channel = store.channel(channel_id)?;
        if !channel.is_member(u_id) {
            return Err(CoreError::unauthorized(
                "Authorised user is not a member of the channel",
            ));
        }
        let (ids, end) = pagination::page(channel.message_ids(), start)?;
        let messages = ids
            .into_iter()
            .map(|message_id| MessageView::build(store, u_id, message_id))
            .collect::<Result<_>>()?;
        Ok(MessagePage { messages, start, end })
    })
    .await
}

/// Leave a channel.  Leaving also relinquishes channel ownership.
pub async fn leave(ctx: &Arc<AppContext>, token: &str, channel_id: ChannelId) -> Result<()> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| Ok(store.leave_channel(u_id, channel_id)?))
        .await
}

/// Join a channel.  Private channels admit only admins and the site owner.
pub async fn join(ctx: &Arc<AppContext>, token: &str, channel_id: ChannelId) -> Result<()> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| {
        let channel = store.channel(channel_id)?;
        if store.user(u_id)?.permission() == Permission::Member && !channel.is_public() {
            return Err(CoreError::unauthorized(
                "Cannot join a private channel with regular user permissions",
            ));
        }
        if channel.is_member(u_id) {
            return Err(CoreError::invalid(
                "User is already a member of the channel",
            ));
        }
        Ok(store.join_channel(u_id, channel_id)?)
    })
    .await
}

/// Promote a channel member to channel owner.  The promoter must own the
/// channel or hold the site-owner permission.
pub async fn add_owner(
    ctx: &Arc<AppContext>,
    token: &str,
    channel_id: ChannelId,
    u_id: UserId,
) -> Result<()> {
    let actor = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| {
        check_owner_rights(store, actor, channel_id)?;
        Ok(store.channel_mut(channel_id)?.add_owner(u_id)?)
    })
    .await
}

/// Demote a channel owner.  Same privilege rule as [`add_owner`].
pub async fn remove_owner(
    ctx: &Arc<AppContext>,
    token: &str,
    channel_id: ChannelId,
    u_id: UserId,
) -> Result<()> {
    let actor = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| {
        check_owner_rights(store, actor, channel_id)?;
        Ok(store.channel_mut(channel_id)?.remove_owner(u_id)?)
    })
    .await
}

fn check_owner_rights(
    store: &huddle_store::EntityStore,
    actor: UserId,
    channel_id: ChannelId,
) -> Result<()> {
    let channel = store.channel(channel_id)?;
    if !channel.is_owner(actor) && store.user(actor)?.permission() != Permission::Owner {
        return Err(CoreError::unauthorized(
            "Authorised user is not an owner of the channel or the site owner",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{admin, auth, channels, message, testutil};

    #[tokio::test]
    async fn test_send_and_read_back_one_message() {
        let ctx = testutil::ctx();
        let (alice, _, channel_id) = testutil::two_member_channel(&ctx).await;

        message::send(&ctx, &alice.token, channel_id, "hello")
            .await
            .unwrap();

        let page = messages(&ctx, &alice.token, channel_id, 0).await.unwrap();
        assert_eq!(page.messages.len(), 1);
        assert_eq!(page.messages[0].message, "hello");
        assert_eq!(page.messages[0].u_id, alice.u_id);
        assert_eq!(page.end, -1);
    }

    #[tokio::test]
    async fn test_message_pagination_walk() {
        let ctx = testutil::ctx();
        let (alice, _, channel_id) = testutil::two_member_channel(&ctx).await;

        for i in 0..100 {
            message::send(&ctx, &alice.token, channel_id, &format!("msg {i}"))
                .await
                .unwrap();
        }

        let first = messages(&ctx, &alice.token, channel_id, 0).await.unwrap();
        assert_eq!(first.messages.len(), 50);
        assert_eq!(first.messages[0].message, "msg 99");
        assert_eq!(first.messages[49].message, "msg 50");
        assert_eq!(first.end, 50);

        let second = messages(&ctx, &alice.token, channel_id, first.end as usize)
            .await
            .unwrap();
        assert_eq!(second.messages.len(), 50);
        assert_eq!(second.messages[0].message, "msg 49");
        assert_eq!(second.messages[49].message, "msg 0");
        assert_eq!(second.end, -1);

        assert!(messages(&ctx, &alice.token, channel_id, 100).await.is_err());
    }

    #[tokio::test]
    async fn test_membership_gates_details_and_messages() {
        let ctx = testutil::ctx();
        let alice = testutil::register(&ctx, "alice@example.com", "Alice", "Nguyen").await;
        let mallory = testutil::register(&ctx, "m@example.com", "Mallory", "Quinn").await;
        let channel_id = channels::create(&ctx, &alice.token, "general", true)
            .await
            .unwrap();

        assert!(matches!(
            details(&ctx, &mallory.token, channel_id).await,
            Err(CoreError::Unauthorized(_))
        ));
        assert!(matches!(
            messages(&ctx, &mallory.token, channel_id, 0).await,
            Err(CoreError::Unauthorized(_))
        ));
        assert!(details(&ctx, &alice.token, 99).await.is_err());
    }

    #[tokio::test]
    async fn test_invite_adds_user_once() {
        let ctx = testutil::ctx();
        let alice = testutil::register(&ctx, "alice@example.com", "Alice", "Nguyen").await;
        let bob = testutil::register(&ctx, "bob@example.com", "Bob", "Okafor").await;
        let channel_id = channels::create(&ctx, &alice.token, "general", false)
            .await
            .unwrap();

        // Bob is not a member, so he cannot invite.
        assert!(invite(&ctx, &bob.token, channel_id, alice.u_id).await.is_err());

        invite(&ctx, &alice.token, channel_id, bob.u_id).await.unwrap();
        let d = details(&ctx, &bob.token, channel_id).await.unwrap();
        assert_eq!(d.all_members.len(), 2);
        assert_eq!(d.owner_members.len(), 1);

        assert!(invite(&ctx, &alice.token, channel_id, bob.u_id).await.is_err());
        assert!(invite(&ctx, &alice.token, channel_id, 99).await.is_err());
    }

    #[tokio::test]
    async fn test_private_channels_admit_admins_only() {
        let ctx = testutil::ctx();
        let alice = testutil::register(&ctx, "alice@example.com", "Alice", "Nguyen").await;
        let bob = testutil::register(&ctx, "bob@example.com", "Bob", "Okafor").await;
        let private = channels::create(&ctx, &alice.token, "owners", false)
            .await
            .unwrap();

        assert!(matches!(
            join(&ctx, &bob.token, private).await,
            Err(CoreError::Unauthorized(_))
        ));

        admin::change_user_permission(&ctx, &alice.token, bob.u_id, 2)
            .await
            .unwrap();
        join(&ctx, &bob.token, private).await.unwrap();
        assert!(join(&ctx, &bob.token, private).await.is_err());
    }

    #[tokio::test]
    async fn test_owner_promotion_rules() {
        let ctx = testutil::ctx();
        let (alice, bob, channel_id) = testutil::two_member_channel(&ctx).await;
        let carol = auth::register(&ctx, "carol@example.com", "password1", "Carol", "Ito")
            .await
            .unwrap();

        // Bob owns nothing and is not the site owner.
        assert!(matches!(
            add_owner(&ctx, &bob.token, channel_id, bob.u_id).await,
            Err(CoreError::Unauthorized(_))
        ));

        // Carol is not a member, so she cannot be promoted.
        assert!(add_owner(&ctx, &alice.token, channel_id, carol.u_id)
            .await
            .is_err());

        add_owner(&ctx, &alice.token, channel_id, bob.u_id).await.unwrap();
        assert!(add_owner(&ctx, &alice.token, channel_id, bob.u_id)
            .await
            .is_err());

        // Now a channel owner, Bob can demote Alice.
        remove_owner(&ctx, &bob.token, channel_id, alice.u_id)
            .await
            .unwrap();
        assert!(remove_owner(&ctx, &bob.token, channel_id, alice.u_id)
            .await
            .is_err());

        let d = details(&ctx, &alice.token, channel_id).await.unwrap();
        assert_eq!(d.owner_members.len(), 1);
        assert_eq!(d.owner_members[0].u_id, bob.u_id);
    }

    #[tokio::test]
    async fn test_leave_requires_membership() {
        let ctx = testutil::ctx();
        let (_, bob, channel_id) = testutil::two_member_channel(&ctx).await;

        leave(&ctx, &bob.token, channel_id).await.unwrap();
        assert!(leave(&ctx, &bob.token, channel_id).await.is_err());
    }
}
