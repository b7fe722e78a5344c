//! Session lifecycle: who is signed in and what that means for the stores.

mod auth;
mod bridge;

pub use auth::{AuthEvent, AuthSession, InMemoryAuthSession, UserProfile};
pub use bridge::{SessionBridge, SessionStart};
