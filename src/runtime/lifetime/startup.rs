use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::config::{RuntimeConfig, get_config};
use crate::services::Mailer;
use crate::services::notifications::build_mailer;
use crate::storage::{self, SeaOrmStorage};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub runtime: Arc<RuntimeConfig>,
    pub mailer: Arc<dyn Mailer>,
}

impl StartupContext {
    /// Shared state handed to every actix worker.
    pub fn app_state(&self) -> AppState {
        let config = get_config();
        AppState::new(
            self.storage.clone(),
            self.runtime.clone(),
            self.mailer.clone(),
            config.site.clone(),
            config.auth.clone(),
        )
    }
}

/// Connect to the database (running migrations) and load runtime settings.
/// Shared by server startup and the CLI commands that touch the database.
pub async fn open_storage() -> Result<(Arc<SeaOrmStorage>, Arc<RuntimeConfig>)> {
    let storage = storage::open()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let runtime = RuntimeConfig::init(storage.get_db().clone())
        .await
        .context("Failed to initialize runtime config")?;
    debug!("Runtime config system initialized");

    Ok((storage, Arc::new(runtime)))
}

pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install rustls crypto provider: {:?}", e))?;

    let config = get_config();
    if let Err(e) = url::Url::parse(&config.site.base_url) {
        warn!(
            "site.base_url '{}' is not an absolute URL ({}); links in e-mails will be broken",
            config.site.base_url, e
        );
    }

    let (storage, runtime) = open_storage().await?;

    let mailer = build_mailer(&config.email).context("Failed to build mailer")?;
    debug!("Mailer initialized with {:?} backend", config.email.backend);

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        storage,
        runtime,
        mailer,
    })
}
