//! Registration, login/logout, and password reset.

use std::sync::Arc;

use huddle_auth::password;
use huddle_store::{is_valid_email, validate_email, Permission, User};

use crate::context::AppContext;
use crate::error::{CoreError, Result};
use crate::views::AuthSession;

/// Register a new user and open a session for them.
///
/// The handle is derived from the concatenated names, disambiguated with a
/// numeric suffix when taken.  The first user ever registered becomes the
/// site owner.
pub async fn register(
    ctx: &Arc<AppContext>,
    email: &str,
    password: &str,
    name_first: &str,
    name_last: &str,
) -> Result<AuthSession> {
    let u_id = ctx
        .mutate(|store| {
            if store.is_registered_email(email) {
                return Err(CoreError::invalid(
                    "Registration attempted with unavailable email",
                ));
            }
            validate_email(email)?;
            let password_hash = password::hash(password)?;

            let u_id = store.new_user_id();
            let mut user = User::new(email, password_hash, name_first, name_last)?;

            let handle = store.generate_unique_handle(&format!("{name_first}{name_last}"));
            user.set_handle(&handle)?;

            if u_id == 1 {
                user.set_permission(Permission::Owner);
            }

            store.register_user(u_id, user);
            Ok(u_id)
        })
        .await?;

    let token = ctx.sessions.issue_token(u_id).await;
    Ok(AuthSession { u_id, token })
}

/// Log in with an email and password.
pub async fn login(ctx: &Arc<AppContext>, email: &str, password: &str) -> Result<AuthSession> {
    let u_id = ctx
        .read(|store| {
            if !is_valid_email(email) {
                return Err(CoreError::invalid("Login attempted with invalid email"));
            }
            let u_id = store.user_id_by_email(email)?;
            if !password::verify(password, store.user(u_id)?.password_hash()) {
                return Err(CoreError::invalid(
                    "Login attempted with incorrect password",
                ));
            }
            Ok(u_id)
        })
        .await?;

    let token = ctx.sessions.issue_token(u_id).await;
    Ok(AuthSession { u_id, token })
}

/// Invalidate a session token.  Returns whether a live session was closed;
/// a token that fails verification reports `false` instead of erroring.
pub async fn logout(ctx: &Arc<AppContext>, token: &str) -> Result<bool> {
    if ctx.sessions.verify_token(token).await.is_err() {
        return Ok(false);
    }
    ctx.sessions.invalidate(token).await;
    Ok(true)
}

/// Request a password-reset code for an email.
///
/// Returns `None` when the email is not registered: the caller must not be
/// able to tell whether an address exists.
pub async fn passwordreset_request(ctx: &Arc<AppContext>, email: &str) -> Result<Option<String>> {
    let u_id = ctx
        .read(|store| {
            if store.is_registered_email(email) {
                Ok(Some(store.user_id_by_email(email)?))
            } else {
                Ok(None)
            }
        })
        .await?;

    match u_id {
        Some(u_id) => Ok(Some(ctx.sessions.issue_reset_code(u_id).await)),
        None => Ok(None),
    }
}

/// Set a new password using a one-time reset code.
///
/// The code is consumed only after the password change succeeds, so an
/// invalid new password leaves it usable.
pub async fn passwordreset_reset(
    ctx: &Arc<AppContext>,
    reset_code: &str,
    new_password: &str,
) -> Result<()> {
    let u_id = ctx.sessions.reset_code_user(reset_code).await?;

    ctx.mutate(|store| {
        let password_hash = password::hash(new_password)?;
        store.user_mut(u_id)?.set_password_hash(password_hash);
        Ok(())
    })
    .await?;

    let _ = ctx.sessions.consume_reset_code(reset_code).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::testutil;
    use crate::views::Profile;

    #[tokio::test]
    async fn test_register_then_login() {
        let ctx = testutil::ctx();
        let session = register(&ctx, "ada@example.com", "hunter22", "Ada", "Lovelace")
            .await
            .unwrap();
        assert_eq!(session.u_id, 1);
        assert_eq!(ctx.sessions.verify_token(&session.token).await.unwrap(), 1);

        let login = login(&ctx, "ada@example.com", "hunter22").await.unwrap();
        assert_eq!(login.u_id, 1);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_bad_input() {
        let ctx = testutil::ctx();
        register(&ctx, "ada@example.com", "hunter22", "Ada", "Lovelace")
            .await
            .unwrap();

        assert!(register(&ctx, "ada@example.com", "hunter22", "Ada", "Lovelace")
            .await
            .is_err());
        assert!(register(&ctx, "not-an-email", "hunter22", "Ada", "Lovelace")
            .await
            .is_err());
        assert!(register(&ctx, "b@example.com", "short", "Ada", "Lovelace")
            .await
            .is_err());
        assert!(register(&ctx, "c@example.com", "hunter22", "", "Lovelace")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_handle_collision_gets_suffix() {
        let ctx = testutil::ctx();
        let a = register(&ctx, "a@example.com", "hunter22", "Ada", "Lovelace")
            .await
            .unwrap();
        let b = register(&ctx, "b@example.com", "hunter22", "Ada", "Lovelace")
            .await
            .unwrap();

        let profiles = ctx
            .read(|store| {
                Ok((
                    Profile::build(store, a.u_id)?,
                    Profile::build(store, b.u_id)?,
                ))
            })
            .await
            .unwrap();
        assert_eq!(profiles.0.handle_str, "AdaLovelace");
        assert_eq!(profiles.1.handle_str, "AdaLovelace001");
    }

    #[tokio::test]
    async fn test_login_failures() {
        let ctx = testutil::ctx();
        register(&ctx, "ada@example.com", "hunter22", "Ada", "Lovelace")
            .await
            .unwrap();

        assert!(login(&ctx, "bad-email", "hunter22").await.is_err());
        assert!(login(&ctx, "nobody@example.com", "hunter22").await.is_err());
        assert!(login(&ctx, "ada@example.com", "wrong-password").await.is_err());
    }

    #[tokio::test]
    async fn test_logout_flag_semantics() {
        let ctx = testutil::ctx();
        let session = register(&ctx, "ada@example.com", "hunter22", "Ada", "Lovelace")
            .await
            .unwrap();

        assert!(logout(&ctx, &session.token).await.unwrap());
        // Already invalidated: reports failure rather than erroring.
        assert!(!logout(&ctx, &session.token).await.unwrap());
        assert!(!logout(&ctx, "garbage").await.unwrap());
        assert!(ctx.sessions.verify_token(&session.token).await.is_err());
    }

    #[tokio::test]
    async fn test_password_reset_round_trip() {
        let ctx = testutil::ctx();
        register(&ctx, "ada@example.com", "hunter22", "Ada", "Lovelace")
            .await
            .unwrap();

        // Unregistered emails are a silent no-op.
        assert!(passwordreset_request(&ctx, "nobody@example.com")
            .await
            .unwrap()
            .is_none());

        let code = passwordreset_request(&ctx, "ada@example.com")
            .await
            .unwrap()
            .unwrap();

        // A too-short replacement leaves the code outstanding.
        assert!(passwordreset_reset(&ctx, &code, "tiny").await.is_err());

        passwordreset_reset(&ctx, &code, "betterpass").await.unwrap();
        assert!(login(&ctx, "ada@example.com", "hunter22").await.is_err());
        login(&ctx, "ada@example.com", "betterpass").await.unwrap();

        // Single use.
        assert!(passwordreset_reset(&ctx, &code, "anotherpass").await.is_err());
        assert!(passwordreset_reset(&ctx, "XXXXXX", "anotherpass").await.is_err());
    }
}
