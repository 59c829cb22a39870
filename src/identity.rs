//! Identity lookup collaborator.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Resolves the auth token a client presents to a username
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, auth_token: &str) -> Option<String>;
}

/// Token table held in memory
#[derive(Default)]
pub struct MemoryIdentity {
    tokens: Mutex<HashMap<String, String>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, auth_token: impl Into<String>, username: impl Into<String>) {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(auth_token.into(), username.into());
    }
}

impl IdentityProvider for MemoryIdentity {
    fn resolve(&self, auth_token: &str) -> Option<String> {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(auth_token)
            .cloned()
    }
}
