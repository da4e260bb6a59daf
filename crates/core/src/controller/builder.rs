use std::sync::Arc;

use parley_model::{RequestConfig, Transport};

use super::{DEFAULT_GREETING, SessionController};
use crate::store::SessionStore;
use crate::transport_client::TransportClient;

/// [`SessionController`] builder.
pub struct SessionControllerBuilder {
    client: TransportClient,
    config: RequestConfig,
    store: Option<SessionStore>,
    greeting: String,
}

impl SessionControllerBuilder {
    /// Creates a new builder with the specified transport.
    #[inline]
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        Self {
            client: TransportClient::new(transport),
            config: RequestConfig::default(),
            store: None,
            greeting: DEFAULT_GREETING.to_owned(),
        }
    }

    /// Sets the settings sent with every request.
    #[inline]
    pub fn with_config(mut self, config: RequestConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses an existing store instead of a fresh one.
    #[inline]
    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the greeting used by [`SessionController::seed_greeting`].
    #[inline]
    pub fn with_greeting<S: Into<String>>(mut self, greeting: S) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Builds the controller.
    #[inline]
    pub fn build(self) -> SessionController {
        SessionController {
            store: self.store.unwrap_or_default(),
            client: self.client,
            config: Arc::new(self.config),
            greeting: self.greeting.into(),
        }
    }
}
