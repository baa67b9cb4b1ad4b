//! Application state: generator, collaborators and the per-user boards.
//!
//! This module owns:
//!   - the case generator (category registry + literature search client)
//!   - the persistence collaborator (saved case studies per user)
//!   - the authentication collaborator
//!   - one `CaseBoard` per signed-in user
//!   - the per-user generation guard (outlives boards across sign-out)
//!
//! The registry is built once here and only read afterwards.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::auth::InMemoryAuthenticator;
use crate::board::{CaseBoard, InFlight};
use crate::config::ServiceConfig;
use crate::generator::CaseGenerator;
use crate::pubmed::{LiteratureSearch, PubMedClient};
use crate::registry::CategoryRegistry;
use crate::store::{CaseStore, InMemoryCaseStore};

pub type Boards = Arc<RwLock<HashMap<String, CaseBoard>>>;

pub struct AppState<S = PubMedClient, P = InMemoryCaseStore> {
    pub generator: CaseGenerator<S>,
    pub store: P,
    pub auth: InMemoryAuthenticator,
    pub boards: Boards,
    pub in_flight: InFlight,
}

impl AppState<PubMedClient, InMemoryCaseStore> {
    /// Build state from config: registry with overrides, PubMed client, in-memory collaborators.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(cfg: &ServiceConfig) -> Result<Self, reqwest::Error> {
        let registry = Arc::new(CategoryRegistry::with_overrides(&cfg.categories));
        let pubmed = PubMedClient::new(&cfg.pubmed)?;
        info!(
            target: "medsky_backend",
            base_url = %pubmed.base_url,
            api_key = pubmed.has_api_key(),
            lookup_timeout = ?cfg.generation.lookup_timeout(),
            "PubMed enrichment configured"
        );
        Ok(Self::with_parts(
            CaseGenerator::new(registry, pubmed, &cfg.generation),
            InMemoryCaseStore::new(),
        ))
    }
}

impl<S: LiteratureSearch, P: CaseStore> AppState<S, P> {
    pub fn with_parts(generator: CaseGenerator<S>, store: P) -> Self {
        Self {
            generator,
            store,
            auth: InMemoryAuthenticator::new(),
            boards: Arc::new(RwLock::new(HashMap::new())),
            in_flight: InFlight::default(),
        }
    }
}
