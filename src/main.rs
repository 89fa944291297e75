// decor/src/main.rs
use std::sync::Arc;

use decor::agents::{GeoAgent, GeoFinderAgent, TrendAgent, TrendIntelAgent, VisionMatchAgent};
use decor::api::{start_api_server, AppState};
use decor::cache::invalidation::CacheInvalidationService;
use decor::cache::redis_cache::RedisBackend;
use decor::cache::store::CacheStore;
use decor::cache::TtlTable;
use decor::composer::ResultComposer;
use decor::config::AppConfig;
use decor::profile::InMemoryProfileStore;
use decor::retrieval::{ArtworkCatalog, ArtworkRetrieval};
use tracing::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();

    // A missing or unreachable Redis degrades the cache to a no-op; requests
    // still succeed, only slower.
    let backend = if config.redis_enabled {
        RedisBackend::connect(&config.redis_url()).await
    } else {
        info!("Redis disabled by configuration (set REDIS_ENABLED=true to enable)");
        RedisBackend::disabled()
    };

    let cache = Arc::new(CacheStore::new(backend, TtlTable::from_env()));
    let invalidation = Arc::new(CacheInvalidationService::new(Arc::clone(&cache)));
    let profiles = Arc::new(InMemoryProfileStore::new());

    let trend: Arc<dyn TrendAgent> = Arc::new(TrendIntelAgent::new());
    let geo: Arc<dyn GeoAgent> = Arc::new(GeoFinderAgent::new());
    let catalog: Arc<dyn ArtworkRetrieval> = Arc::new(ArtworkCatalog::new());

    let composer = Arc::new(ResultComposer::new(
        Arc::clone(&cache),
        Arc::clone(&invalidation),
        Arc::new(VisionMatchAgent::new()),
        Arc::clone(&trend),
        Arc::clone(&geo),
        Arc::clone(&catalog),
        profiles.clone(),
        config.page_size,
    ));

    let state = AppState {
        composer,
        cache,
        invalidation,
        profiles,
        trend,
        geo,
        catalog,
        upload_dir: config.upload_dir.clone(),
    };

    info!("Starting API server on http://{}", config.bind_addr());
    start_api_server(&config, state).await
}
