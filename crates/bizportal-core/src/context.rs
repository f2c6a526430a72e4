//! Application-lifetime wiring of the session components.
//!
//! `PortalContext::start` builds the credential store, request pipeline,
//! session and route table once; front ends hold the context for as long
//! as the application runs and call `shutdown` on exit.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::api::{ApiClient, RequestPipeline};
use crate::auth::{CredentialStore, Session};
use crate::config::Config;
use crate::localization::Localizer;
use crate::navigation::{self, NavigationGuard, NavigationOutcome, RouteTable};
use crate::notify::Notifier;
use crate::storage::{KeyValueStore, MemoryStore};

pub struct PortalContext {
    pub config: Config,
    pub credentials: Arc<CredentialStore>,
    pub localizer: Arc<Localizer>,
    pub api: ApiClient,
    pub session: Arc<Session>,
    pub routes: RouteTable,
    pub guard: NavigationGuard,
}

impl PortalContext {
    /// Wire everything against the durable store named by `config` and a
    /// fresh in-memory ephemeral slot.
    pub fn start(config: Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let durable = config.open_durable_store()?;
        Self::with_stores(config, durable, Arc::new(MemoryStore::new()), notifier)
    }

    pub fn with_stores(
        config: Config,
        durable: Arc<dyn KeyValueStore>,
        ephemeral: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let credentials = Arc::new(CredentialStore::new(durable, ephemeral));
        let localizer = Arc::new(Localizer::new(credentials.durable_slot()));

        let pipeline = RequestPipeline::new(
            config.api_base_url(),
            config.request_timeout(),
            Arc::clone(&credentials),
            notifier,
        )?;
        let api = ApiClient::new(Arc::new(pipeline));
        let session = Arc::new(Session::new(api.clone(), Arc::clone(&localizer)));

        info!(
            base_url = config.api_base_url(),
            language = %localizer.language(),
            "Portal context started"
        );

        Ok(Self {
            config,
            credentials,
            localizer,
            api,
            session,
            routes: RouteTable::standard(),
            guard: NavigationGuard::default(),
        })
    }

    /// Run the guard for `location` against the current session.
    pub fn navigate(&self, location: &str) -> Option<NavigationOutcome> {
        navigation::navigate(
            &self.routes,
            &self.guard,
            location,
            self.session.is_authenticated(),
        )
    }

    /// Tear down at application stop. Drops the in-memory profile once no
    /// other holder of the session remains.
    pub fn shutdown(self) {
        if let Ok(session) = Arc::try_unwrap(self.session) {
            session.shutdown();
        }
        info!("Portal context stopped");
    }
}
