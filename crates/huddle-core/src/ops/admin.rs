//! Site-wide administration.

use std::sync::Arc;

use huddle_store::{Permission, UserId};

use crate::context::AppContext;
use crate::error::{CoreError, Result};

/// Change a user's site-wide permission level.
///
/// The site owner may change anyone.  An admin may grant or revoke admin
/// rights but may not hand out the owner level.  Members may change no one.
pub async fn change_user_permission(
    ctx: &Arc<AppContext>,
    token: &str,
    u_id: UserId,
    permission_id: u8,
) -> Result<()> {
    let actor_id = ctx.sessions.verify_token(token).await?;
    ctx.mutate(|store| {
        store.user(u_id)?;
        let actor = store.user(actor_id)?.permission();
        let requested = Permission::from_id(permission_id);

        let denied = actor == Permission::Member
            || (actor == Permission::Admin && requested == Some(Permission::Owner));
        if denied {
            return Err(CoreError::unauthorized(
                "User permission change attempted with insufficient privileges",
            ));
        }

        let permission = requested.ok_or_else(|| CoreError::invalid("Invalid permission ID"))?;
        store.user_mut(u_id)?.set_permission(permission);
        Ok(())
    })
    .await
}
