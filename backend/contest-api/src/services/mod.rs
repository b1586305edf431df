use std::sync::Arc;
use std::time::Duration;

use redis::aio::ConnectionManager;

use crate::config::{Config, StoreBackend};
use crate::delivery::{DeliverySink, MemoryDeliverySink, RedisDeliverySink};
use crate::middlewares::auth::ContestTokenService;
use crate::store::{MemoryStore, MongoStore, Store};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub delivery: Arc<dyn DeliverySink>,
    pub tokens: ContestTokenService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>, delivery: Arc<dyn DeliverySink>) -> Self {
        let tokens = ContestTokenService::new(
            &config.contest_token_secret,
            config.contest_token_ttl_seconds,
        );
        Self {
            config,
            store,
            delivery,
            tokens,
        }
    }

    /// Builds the backends named by `config.store_backend`.
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        if config.store_backend == StoreBackend::Memory {
            tracing::warn!("Using in-memory store; nothing survives a restart");
            return Ok(Self::new(
                config,
                Arc::new(MemoryStore::new()),
                Arc::new(MemoryDeliverySink::new()),
            ));
        }

        let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri).await?;
        let store = MongoStore::new(mongo_client, &config.mongo_database);
        store.ensure_indexes().await?;
        tracing::info!("MongoDB connected, database {}", config.mongo_database);

        tracing::info!("Attempting to connect to Redis...");
        let redis_client = redis::Client::open(config.redis_uri.clone())?;
        let redis = tokio::time::timeout(
            Duration::from_secs(30),
            ConnectionManager::new(redis_client),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Redis connection timeout after 30s"))??;

        let mut conn = redis.clone();
        tokio::time::timeout(
            Duration::from_secs(5),
            redis::cmd("PING").query_async::<String>(&mut conn),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Redis PING timeout after 5s"))??;
        tracing::info!("Redis connection established successfully");

        let delivery = RedisDeliverySink::new(redis, config.problem_set_ttl_seconds);
        Ok(Self::new(config, Arc::new(store), Arc::new(delivery)))
    }
}

pub mod contest_service;
pub mod presenter;
pub mod problem_service;
pub mod question_service;
pub mod selection;
pub mod session_service;
pub mod stats_service;
