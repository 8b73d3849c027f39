//! Profile operations.

use std::sync::Arc;

use huddle_store::UserId;

use crate::context::AppContext;
use crate::error::{CoreError, Result};
use crate::views::Profile;

/// Profile details of any user.
pub async fn profile(ctx: &Arc<AppContext>, token: &str, u_id: UserId) -> Result<Profile> {
    ctx.sessions.verify_token(token).await?;
    ctx.read(|store| Profile::build(store, u_id)).await
}

/// Profile details of every user, in registration order.
pub async fn all(ctx: &Arc<AppContext>, token: &str) -> Result<Vec<Profile>> {
    ctx.sessions.verify_token(token).await?;
    ctx.read(|store| {
        store
            .user_ids()
            .map(|u_id| Profile::build(store, u_id))
            .collect()
    })
    .await
}

/// Update the caller's first and last name.
pub async fn set_name(
    ctx: &Arc<AppContext>,
    token: &str,
    name_first: &str,
    name_last: &str,
) -> Result<()> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| {
        let user = store.user_mut(u_id)?;
        user.set_name_first(name_first)?;
        user.set_name_last(name_last)?;
        Ok(())
    })
    .await
}

/// Update the caller's email, enforcing shape and uniqueness.
pub async fn set_email(ctx: &Arc<AppContext>, token: &str, email: &str) -> Result<()> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| {
        if store.is_registered_email(email) {
            return Err(CoreError::invalid(
                "Email is being used by another user",
            ));
        }
        Ok(store.user_mut(u_id)?.set_email(email)?)
    })
    .await
}

/// Update the caller's handle, enforcing length and uniqueness.
pub async fn set_handle(ctx: &Arc<AppContext>, token: &str, handle: &str) -> Result<()> {
    let u_id = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| {
        if store.is_registered_handle(handle) {
            return Err(CoreError::invalid(
                "Handle is being used by another user",
            ));
        }
        Ok(store.user_mut(u_id)?.set_handle(handle)?)
    })
    .await
}
