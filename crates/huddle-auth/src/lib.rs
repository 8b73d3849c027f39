//! # huddle-auth
//!
//! Session and credential layer for the Huddle backend.
//!
//! A [`SessionManager`] owns a process-lifetime signing secret, the set of
//! explicitly invalidated tokens, and the outstanding password-reset codes.
//! None of this state is part of the persisted entity graph; it lives and
//! dies with the process (or with an explicit [`SessionManager::reset`],
//! used for test isolation).

pub mod password;
pub mod session;
pub mod token;

mod error;

pub use error::{AuthError, Result};
pub use session::SessionManager;
