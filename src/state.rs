use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::{ArtworkClient, CatalogClient, TvdbClient, WatchmodeClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::{PosterResolver, SyncService, UsageLedger};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// This client should be reused across all HTTP-based services to enable
/// connection pooling and avoid socket exhaustion.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("Dreadarr/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub catalog: Arc<dyn CatalogClient>,

    pub artwork: Arc<dyn ArtworkClient>,

    pub ledger: UsageLedger,

    pub sync_service: Arc<SyncService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = build_shared_http_client(30)?;

        let catalog: Arc<dyn CatalogClient> = Arc::new(WatchmodeClient::new(
            http_client.clone(),
            config.watchmode.api_key.clone(),
        ));
        let artwork: Arc<dyn ArtworkClient> =
            Arc::new(TvdbClient::new(http_client, config.tvdb.api_key.clone()));

        Self::with_clients(config, catalog, artwork).await
    }

    /// Wire up the state with injected provider clients. Tests use this to
    /// run the full pipeline against fixtures.
    pub async fn with_clients(
        config: Config,
        catalog: Arc<dyn CatalogClient>,
        artwork: Arc<dyn ArtworkClient>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_url,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let ledger = UsageLedger::new(store.clone(), config.watchmode.monthly_request_limit);

        let posters = PosterResolver::new(
            artwork.clone(),
            config.sync.default_poster_path.clone(),
        );

        let sync_service = Arc::new(SyncService::new(
            store.clone(),
            catalog.clone(),
            posters,
            ledger.clone(),
            config.sync.clone(),
            config.watchmode.requests_per_title,
        ));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            catalog,
            artwork,
            ledger,
            sync_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
