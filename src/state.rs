use std::sync::Arc;

use crate::background::BackgroundTasks;
use crate::cache::{CacheStore, MemoryCacheStore, NutritionCache, PgCacheStore};
use crate::config::{AppConfig, SourcesConfig};
use crate::glycemic::GlycemicEngine;
use crate::pipeline::{InsightGenerator, Pipeline, RemoteInsightGenerator};
use crate::resolver::{Resolver, Sources};
use crate::sources::{EdamamClient, FoodSource, OpenFoodFactsClient, UsdaClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Pipeline,
    pub cache: NutritionCache,
    pub background: BackgroundTasks,
}

impl AppState {
    /// Builds the state from the environment. Returns the Postgres store too
    /// so the caller can run migrations against it.
    pub async fn init() -> anyhow::Result<(Self, Option<PgCacheStore>)> {
        let config = Arc::new(AppConfig::from_env()?);

        let pg = match &config.database_url {
            Some(url) => Some(PgCacheStore::connect(url).await?),
            None => {
                tracing::warn!("DATABASE_URL not set; nutrition cache is in-memory");
                None
            }
        };
        let store: Arc<dyn CacheStore> = match &pg {
            Some(pg) => Arc::new(pg.clone()),
            None => Arc::new(MemoryCacheStore::new()),
        };

        let sources = live_sources(&config.sources);
        let insights = config.insight_service_url.as_ref().map(|url| {
            Arc::new(RemoteInsightGenerator::new(url.clone(), config.sources.http_timeout_secs))
                as Arc<dyn InsightGenerator>
        });

        Ok((Self::from_parts(config, store, sources, insights), pg))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn CacheStore>,
        sources: Sources,
        insights: Option<Arc<dyn InsightGenerator>>,
    ) -> Self {
        let background = BackgroundTasks::new();
        let cache = NutritionCache::new(store, background.clone());
        let resolver = Resolver::new(cache.clone(), sources);
        let pipeline = Pipeline::new(resolver, GlycemicEngine::default(), insights);
        Self {
            config,
            pipeline,
            cache,
            background,
        }
    }

    /// In-memory cache and unconfigured clients: every lookup misses.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            sources: SourcesConfig::default(),
            cache_cleanup_interval_minutes: 360,
            insight_service_url: None,
        });
        let sources = live_sources(&config.sources);
        Self::from_parts(config, Arc::new(MemoryCacheStore::new()), sources, None)
    }
}

fn live_sources(cfg: &SourcesConfig) -> Sources {
    Sources {
        generic: Arc::new(UsdaClient::new(cfg.usda())) as Arc<dyn FoodSource>,
        label: Arc::new(OpenFoodFactsClient::new(cfg.open_food_facts())),
        commercial: Arc::new(EdamamClient::new(cfg.edamam())),
    }
}
