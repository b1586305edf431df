//! Hands materialized problem sets to the judge/runner side.
//!
//! One artifact per contest; delivering a new one replaces the old one whole.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::sync::Mutex;

use crate::error::DeliveryError;
use crate::metrics::track_cache_operation;
use crate::models::SelectedProblemSet;

#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, problem_set: &SelectedProblemSet) -> Result<(), DeliveryError>;
    async fn fetch(&self, contest_id: &str) -> Result<Option<SelectedProblemSet>, DeliveryError>;
    async fn discard(&self, contest_id: &str) -> Result<(), DeliveryError>;
    async fn ping(&self) -> Result<(), DeliveryError>;
}

pub struct RedisDeliverySink {
    redis: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisDeliverySink {
    pub fn new(redis: ConnectionManager, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }

    fn key(contest_id: &str) -> String {
        format!("problem_set:{}", contest_id)
    }
}

#[async_trait]
impl DeliverySink for RedisDeliverySink {
    async fn deliver(&self, problem_set: &SelectedProblemSet) -> Result<(), DeliveryError> {
        let payload = serde_json::to_string(problem_set)?;
        let key = Self::key(&problem_set.contest_id);
        let mut conn = self.redis.clone();

        // SET overwrites, so the previous set never leaks into the new one
        track_cache_operation("set", async {
            redis::cmd("SET")
                .arg(&key)
                .arg(payload)
                .arg("EX")
                .arg(self.ttl_seconds)
                .query_async::<()>(&mut conn)
                .await
        })
        .await?;
        Ok(())
    }

    async fn fetch(&self, contest_id: &str) -> Result<Option<SelectedProblemSet>, DeliveryError> {
        let key = Self::key(contest_id);
        let mut conn = self.redis.clone();

        let raw = track_cache_operation("get", async {
            redis::cmd("GET")
                .arg(&key)
                .query_async::<Option<String>>(&mut conn)
                .await
        })
        .await?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn discard(&self, contest_id: &str) -> Result<(), DeliveryError> {
        let key = Self::key(contest_id);
        let mut conn = self.redis.clone();

        track_cache_operation("del", async {
            redis::cmd("DEL").arg(&key).query_async::<()>(&mut conn).await
        })
        .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), DeliveryError> {
        let mut conn = self.redis.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryDeliverySink {
    sets: Mutex<HashMap<String, SelectedProblemSet>>,
}

impl MemoryDeliverySink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeliverySink for MemoryDeliverySink {
    async fn deliver(&self, problem_set: &SelectedProblemSet) -> Result<(), DeliveryError> {
        self.sets
            .lock()
            .await
            .insert(problem_set.contest_id.clone(), problem_set.clone());
        Ok(())
    }

    async fn fetch(&self, contest_id: &str) -> Result<Option<SelectedProblemSet>, DeliveryError> {
        Ok(self.sets.lock().await.get(contest_id).cloned())
    }

    async fn discard(&self, contest_id: &str) -> Result<(), DeliveryError> {
        self.sets.lock().await.remove(contest_id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), DeliveryError> {
        Ok(())
    }
}
