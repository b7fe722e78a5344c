//! Scoping the cart and wishlist to the authenticated identity.

use std::sync::Arc;

use common::SessionIdentity;
use persistence::PersistenceAdapter;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use super::auth::{AuthEvent, AuthSession};
use crate::cart::CartStore;
use crate::restore::RestoreStatus;
use crate::wishlist::WishlistStore;

/// Restore results for both stores at session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStart {
    pub identity: SessionIdentity,
    pub cart: RestoreStatus,
    pub wishlist: RestoreStatus,
}

/// Reacts to login and logout by rescoping the stores and their storage.
///
/// - Login loads the identity's stored snapshot into both stores. If the
///   identity has nothing stored, the anonymous contents are kept and
///   written under the new identity. The anonymous entry is removed.
/// - Logout empties both stores and deletes the identity's stored entry,
///   then rescopes to the anonymous identity.
pub struct SessionBridge {
    auth: Arc<dyn AuthSession>,
    events: broadcast::Receiver<AuthEvent>,
    cart: CartStore,
    wishlist: WishlistStore,
    persistence: PersistenceAdapter,
}

impl SessionBridge {
    /// Creates a bridge and subscribes to `auth`'s events.
    pub fn new(
        auth: Arc<dyn AuthSession>,
        cart: CartStore,
        wishlist: WishlistStore,
        persistence: PersistenceAdapter,
    ) -> Self {
        let events = auth.subscribe();
        Self {
            auth,
            events,
            cart,
            wishlist,
            persistence,
        }
    }

    /// Scopes storage to the current identity and restores both stores.
    pub fn start(&self) -> SessionStart {
        let identity = self.auth.current_identity();
        self.persistence.set_identity(identity.clone());
        let start = SessionStart {
            cart: self.cart.restore(),
            wishlist: self.wishlist.restore(),
            identity,
        };
        tracing::info!(
            identity = %start.identity,
            cart = ?start.cart,
            wishlist = ?start.wishlist,
            "session started"
        );
        start
    }

    /// Applies a login for `identity`.
    pub fn on_login(&self, identity: SessionIdentity) {
        let previous = self.persistence.identity();
        if previous == identity {
            return;
        }
        if previous.is_authenticated() {
            self.on_logout();
        }

        let mut lookup_failed = false;
        let has_snapshot = match self.persistence.load_for(&identity) {
            Ok(snapshot) => snapshot.is_some(),
            // An unreadable snapshot still belongs to this identity; the
            // restore below degrades it to empty.
            Err(e) if e.is_corrupted() => true,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    %identity,
                    "snapshot lookup failed, keeping current session"
                );
                lookup_failed = true;
                false
            }
        };

        self.persistence.set_identity(identity.clone());
        if has_snapshot {
            self.cart.restore();
            self.wishlist.restore();
        } else {
            self.cart.persist_current();
            self.wishlist.persist_current();
        }

        // The anonymous entry is the only saved copy until the carried-over
        // state reaches the user's entry.
        if !lookup_failed {
            if let Err(e) = self.persistence.clear_for(&SessionIdentity::Anonymous) {
                tracing::warn!(error = %e, "failed to clear anonymous session entry");
            }
        }
        tracing::info!(%identity, restored = has_snapshot, "session scoped to login");
    }

    /// Applies a logout of whoever the session is scoped to.
    pub fn on_logout(&self) {
        let previous = self.persistence.identity();
        self.cart.reset();
        self.wishlist.reset();
        if let Err(e) = self.persistence.clear_for(&previous) {
            tracing::warn!(error = %e, identity = %previous, "failed to clear session entry");
        }
        self.persistence.set_identity(SessionIdentity::Anonymous);
        tracing::info!(identity = %previous, "session cleared on logout");
    }

    /// Applies one auth event.
    pub fn handle(&self, event: &AuthEvent) {
        match event {
            AuthEvent::LoggedIn(profile) => self.on_login(profile.identity()),
            AuthEvent::LoggedOut { .. } => self.on_logout(),
        }
    }

    /// Applies every auth event received so far. Returns how many were applied.
    pub fn sync(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.handle(&event);
                    applied += 1;
                }
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "auth events lagged, resyncing");
                    self.resync();
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        applied
    }

    /// Applies auth events as they arrive until the auth session goes away.
    pub async fn run(mut self) {
        loop {
            match self.events.recv().await {
                Ok(event) => self.handle(&event),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "auth events lagged, resyncing");
                    self.resync();
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!("auth event stream closed");
    }

    /// Brings the stores in line with the auth session's current identity.
    fn resync(&self) {
        match self.auth.current_identity() {
            SessionIdentity::Anonymous if self.persistence.identity().is_authenticated() => {
                self.on_logout();
            }
            SessionIdentity::Anonymous => {}
            identity => self.on_login(identity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartConfig;
    use crate::product::Product;
    use crate::session::auth::{InMemoryAuthSession, UserProfile};
    use common::{Money, UserId};
    use persistence::InMemoryStorage;

    struct Harness {
        auth: InMemoryAuthSession,
        storage: InMemoryStorage,
        cart: CartStore,
        wishlist: WishlistStore,
        bridge: SessionBridge,
    }

    fn harness() -> Harness {
        let auth = InMemoryAuthSession::new();
        let storage = InMemoryStorage::new();
        let persistence =
            PersistenceAdapter::new(Arc::new(storage.clone()), SessionIdentity::Anonymous);
        let cart = CartStore::new(persistence.clone(), CartConfig::default());
        let wishlist = WishlistStore::new(persistence.clone());
        let bridge = SessionBridge::new(
            Arc::new(auth.clone()),
            cart.clone(),
            wishlist.clone(),
            persistence,
        );
        Harness {
            auth,
            storage,
            cart,
            wishlist,
            bridge,
        }
    }

    fn product(id: &str) -> Product {
        Product::new(id, "Thing", Money::from_rupees(100), Money::from_rupees(120))
    }

    fn alice() -> SessionIdentity {
        SessionIdentity::User(UserId::new("alice"))
    }

    #[test]
    fn logout_clears_stores_and_persisted_entry() {
        let mut h = harness();
        h.bridge.start();
        h.auth.login(UserProfile::new("alice", "Alice"));
        h.bridge.sync();

        h.cart.add_item(&product("A"), 2).unwrap();
        h.wishlist.toggle(&product("B"));
        assert!(h.storage.contains(&alice().storage_key()));

        h.auth.logout();
        assert_eq!(h.bridge.sync(), 1);

        assert_eq!(h.cart.count(), 0);
        assert!(h.wishlist.is_empty());
        assert!(!h.storage.contains(&alice().storage_key()));
    }

    #[test]
    fn anonymous_cart_carries_over_on_first_login() {
        let mut h = harness();
        h.bridge.start();
        h.cart.add_item(&product("A"), 1).unwrap();

        h.auth.login(UserProfile::new("alice", "Alice"));
        h.bridge.sync();

        assert_eq!(h.cart.count(), 1);
        assert!(h.storage.contains(&alice().storage_key()));
        assert!(!h.storage.contains(&SessionIdentity::Anonymous.storage_key()));
    }

    #[test]
    fn unreadable_storage_at_login_keeps_anonymous_cart() {
        let mut h = harness();
        h.bridge.start();
        h.cart.add_item(&product("A"), 1).unwrap();
        h.storage.set_fail_reads(true);

        h.auth.login(UserProfile::new("alice", "Alice"));
        h.bridge.sync();

        assert_eq!(h.cart.count(), 1);
        assert!(h.storage.contains(&SessionIdentity::Anonymous.storage_key()));
    }

    #[test]
    fn login_restores_stored_snapshot_for_that_identity() {
        let mut h = harness();
        h.bridge.start();
        h.auth.login(UserProfile::new("alice", "Alice"));
        h.bridge.sync();
        h.cart.add_item(&product("A"), 3).unwrap();

        // A fresh process with its own anonymous cart.
        let stored = h.storage.clone();
        let persistence = PersistenceAdapter::new(Arc::new(stored), SessionIdentity::Anonymous);
        let cart = CartStore::new(persistence.clone(), CartConfig::default());
        let wishlist = WishlistStore::new(persistence.clone());
        let bridge = SessionBridge::new(
            Arc::new(InMemoryAuthSession::new()),
            cart.clone(),
            wishlist,
            persistence,
        );
        cart.add_item(&product("Z"), 1).unwrap();

        bridge.on_login(alice());
        assert_eq!(cart.count(), 3);
        assert!(cart.line(&"Z".into()).is_none());
    }

    #[test]
    fn switching_users_never_leaks_contents() {
        let mut h = harness();
        h.bridge.start();
        h.auth.login(UserProfile::new("alice", "Alice"));
        h.bridge.sync();
        h.cart.add_item(&product("A"), 1).unwrap();

        h.auth.login(UserProfile::new("bob", "Bob"));
        h.bridge.sync();

        assert_eq!(h.cart.count(), 0);
        let bob = SessionIdentity::User(UserId::new("bob"));
        assert_eq!(h.bridge.persistence.identity(), bob);
    }

    #[test]
    fn start_restores_current_identity() {
        let h = harness();
        h.auth.login(UserProfile::new("alice", "Alice"));
        let start = h.bridge.start();
        assert_eq!(start.identity, alice());
        assert_eq!(start.cart, RestoreStatus::Empty);
    }

    #[tokio::test]
    async fn run_applies_events_as_they_arrive() {
        let h = harness();
        h.bridge.start();
        let task = tokio::spawn(h.bridge.run());

        h.auth.login(UserProfile::new("alice", "Alice"));
        h.cart.add_item(&product("A"), 1).unwrap();
        h.auth.logout();
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        assert_eq!(h.cart.count(), 0);
        assert!(h.storage.is_empty());
        task.abort();
    }
}
