//! Authentication session seam.

use std::sync::{Arc, PoisonError, RwLock};

use common::{SessionIdentity, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Capacity of the auth event channel.
const AUTH_EVENT_CAPACITY: usize = 16;

/// Profile of a signed-in user, as far as checkout cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl UserProfile {
    /// Creates a profile with just an id and a display name.
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            name: name.into(),
            email: String::new(),
            phone: None,
        }
    }

    /// Sets the contact phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Sets the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Returns the session identity for this user.
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity::User(self.user_id.clone())
    }
}

/// Authentication lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    LoggedIn(UserProfile),
    LoggedOut { user_id: UserId },
}

/// The identity service as seen by the session core.
///
/// Login and logout handlers are expressed as a subscription: every
/// subscriber receives each [`AuthEvent`] in order.
pub trait AuthSession: Send + Sync {
    /// Returns who the session currently belongs to.
    fn current_identity(&self) -> SessionIdentity;

    /// Returns the signed-in user's profile.
    fn current_profile(&self) -> Option<UserProfile>;

    /// Subscribes to login/logout events.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// In-memory auth session with mock login, like a storefront without a
/// real identity provider.
#[derive(Debug, Clone)]
pub struct InMemoryAuthSession {
    profile: Arc<RwLock<Option<UserProfile>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for InMemoryAuthSession {
    fn default() -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            profile: Arc::new(RwLock::new(None)),
            events,
        }
    }
}

impl InMemoryAuthSession {
    /// Creates a session with nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signs `profile` in and notifies subscribers.
    pub fn login(&self, profile: UserProfile) {
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = Some(profile.clone());
        tracing::info!(user_id = %profile.user_id, "user logged in");
        // No subscribers is fine: there is nobody to notify.
        let _ = self.events.send(AuthEvent::LoggedIn(profile));
    }

    /// Signs the current user out. Does nothing if nobody is signed in.
    pub fn logout(&self) {
        let previous = self
            .profile
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(profile) = previous {
            tracing::info!(user_id = %profile.user_id, "user logged out");
            let _ = self.events.send(AuthEvent::LoggedOut {
                user_id: profile.user_id,
            });
        }
    }
}

impl AuthSession for InMemoryAuthSession {
    fn current_identity(&self) -> SessionIdentity {
        self.current_profile()
            .map(|p| p.identity())
            .unwrap_or_default()
    }

    fn current_profile(&self) -> Option<UserProfile> {
        self.profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_and_logout_update_identity() {
        let auth = InMemoryAuthSession::new();
        assert_eq!(auth.current_identity(), SessionIdentity::Anonymous);

        auth.login(UserProfile::new("alice", "Alice").with_phone("9876543210"));
        assert_eq!(
            auth.current_identity(),
            SessionIdentity::User(UserId::new("alice"))
        );
        assert_eq!(
            auth.current_profile().unwrap().phone.as_deref(),
            Some("9876543210")
        );

        auth.logout();
        assert_eq!(auth.current_identity(), SessionIdentity::Anonymous);
    }

    #[test]
    fn subscribers_receive_events_in_order() {
        let auth = InMemoryAuthSession::new();
        let mut rx = auth.subscribe();

        auth.login(UserProfile::new("alice", "Alice"));
        auth.logout();
        auth.logout();

        assert!(matches!(rx.try_recv(), Ok(AuthEvent::LoggedIn(_))));
        assert!(matches!(rx.try_recv(), Ok(AuthEvent::LoggedOut { .. })));
        assert!(rx.try_recv().is_err());
    }
}
