//! The operations exposed to the transport layer.
//!
//! Every operation takes the shared [`crate::AppContext`] plus the caller's
//! token, verifies the token first, and then runs its load-mutate-save cycle
//! against the entity graph.  Errors propagate to the caller unhandled; the
//! boundary layer decides how to present them.

pub mod admin;
pub mod auth;
pub mod channel;
pub mod channels;
pub mod message;
pub mod search;
pub mod standup;
pub mod user;

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Arc;

    use huddle_store::ChannelId;

    use crate::config::Config;
    use crate::context::AppContext;
    use crate::ops;
    use crate::views::AuthSession;

    pub fn ctx() -> Arc<AppContext> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
        AppContext::in_memory(Config::default()).unwrap()
    }

    pub async fn register(
        ctx: &Arc<AppContext>,
        email: &str,
        first: &str,
        last: &str,
    ) -> AuthSession {
        ops::auth::register(ctx, email, "password1", first, last)
            .await
            .unwrap()
    }

    /// First registrant (site owner) plus a second member, with a public
    /// channel created by the first and joined by the second.
    pub async fn two_member_channel(
        ctx: &Arc<AppContext>,
    ) -> (AuthSession, AuthSession, ChannelId) {
        let alice = register(ctx, "alice@example.com", "Alice", "Nguyen").await;
        let bob = register(ctx, "bob@example.com", "Bob", "Okafor").await;
        let channel_id = ops::channels::create(ctx, &alice.token, "general", true)
            .await
            .unwrap();
        ops::channel::join(ctx, &bob.token, channel_id).await.unwrap();
        (alice, bob, channel_id)
    }
}
