mod adapters;
mod application;
mod config;
mod domain;
mod interface;
mod ports;

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapters::{HttpCloudApi, MemoryStore};
use application::{ChartRegistry, Collections, InstanceScreen, StoreSync, SummaryService, UsageService};
use config::Config;
use domain::{Instance, InstanceSize, Profile, Volume};
use interface::http::{create_router, AppState};
use ports::CloudApi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("quotaboard={},tower_http=info", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Quotaboard v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config.redacted());

    let identities = match config.load_identities() {
        Ok(identities) => identities,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    info!("✓ {} configured identities", identities.len());

    // Initialize adapters
    let api: Arc<dyn CloudApi> = Arc::new(
        HttpCloudApi::new(config.api_url.clone())
            .with_token(config.api_token.clone())
            .with_timeout(config.request_timeout),
    );
    let collections = Collections {
        profile: Arc::new(MemoryStore::<Profile>::new()),
        instances: Arc::new(MemoryStore::<Instance>::new()),
        volumes: Arc::new(MemoryStore::<Volume>::new()),
        sizes: Arc::new(MemoryStore::<InstanceSize>::new()),
    };

    // Create services
    let usage = Arc::new(UsageService::new(api.clone()));
    let charts = Arc::new(ChartRegistry::new());
    let selected = config.selected_identity();
    let summaries = Arc::new(SummaryService::new(
        api.clone(),
        usage.clone(),
        charts.clone(),
        selected.clone(),
        identities,
    ));
    summaries.watch(&collections.instances, &collections.volumes);

    let screen = match selected {
        Some(identity) => {
            let screen = Arc::new(InstanceScreen::new(collections.clone()));
            screen.attach();

            let sync = StoreSync::new(api, identity.clone(), collections);
            tokio::spawn(sync.run(Duration::from_secs(config.poll_interval.max(1))));
            info!("✓ Following identity {}", identity);
            Some(screen)
        }
        None => {
            warn!("⚠ No identity selected. Instance screen disabled.");
            None
        }
    };

    // Create HTTP server
    let app = create_router(AppState {
        usage,
        charts,
        summaries,
        screen,
    });
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("✓ Quotaboard listening on {}", addr);
    info!("  → Dashboard: http://localhost:{}", config.port);
    info!("  → API: http://localhost:{}/api/identities", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
