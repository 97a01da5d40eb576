use std::sync::Arc;
use std::time::Instant;

use crate::providers::Credentials;
use crate::resolver::IdentityResolver;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<IdentityResolver>,
    /// Used for any credential a request does not supply itself.
    pub default_credentials: Arc<Credentials>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(resolver: Arc<IdentityResolver>, default_credentials: Credentials) -> Self {
        assert!(
            !resolver.namespaces().is_empty(),
            "Resolver must serve at least one namespace"
        );
        Self {
            resolver,
            default_credentials: Arc::new(default_credentials),
            start_time: Instant::now(),
        }
    }
}
