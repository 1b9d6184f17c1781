//! Persisted client session - the local-storage analogue
//!
//! Three keys make up a session:
//! - `auth_token`: bearer token sent on every request
//! - `user_role`: role path segment the token was issued for
//! - `remember_me`: whether the user asked to stay signed in
//!
//! Storage access is synchronous. Every request reads the token fresh, so a
//! login or logout in one place is visible to the next call everywhere else.

mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

use std::sync::Arc;

use crate::auth::Role;

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const USER_ROLE_KEY: &str = "user_role";
pub const REMEMBER_ME_KEY: &str = "remember_me";

/// Typed view over the key-value store holding the session
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn KeyValueStore>,
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Session backed by process memory only (tests, one-shot CLI calls)
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    pub fn token(&self) -> Option<String> {
        self.store
            .get(AUTH_TOKEN_KEY)
            .filter(|token| !token.trim().is_empty())
    }

    /// Stored role, ignoring values that are not a known role
    pub fn role(&self) -> Option<Role> {
        self.store.get(USER_ROLE_KEY)?.parse().ok()
    }

    pub fn remember_me(&self) -> bool {
        self.store
            .get(REMEMBER_ME_KEY)
            .is_some_and(|v| v == "true")
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Store a freshly issued token together with the role it belongs to
    pub fn persist(&self, token: &str, role: Role, remember_me: bool) -> Result<(), StoreError> {
        self.store.set(AUTH_TOKEN_KEY, token)?;
        self.store.set(USER_ROLE_KEY, role.as_path())?;
        self.store
            .set(REMEMBER_ME_KEY, if remember_me { "true" } else { "false" })?;
        tracing::info!(role = role.as_path(), remember_me, "Session stored");
        Ok(())
    }

    /// Remove all session keys. Returns whether any of them was present.
    pub fn clear(&self) -> Result<bool, StoreError> {
        let mut removed = false;
        for key in [AUTH_TOKEN_KEY, USER_ROLE_KEY, REMEMBER_ME_KEY] {
            if self.store.get(key).is_some() {
                self.store.remove(key)?;
                removed = true;
            }
        }
        if removed {
            tracing::info!("Session cleared");
        }
        Ok(removed)
    }
}
