use std::sync::Arc;

use crate::error::ServiceResult;
use crate::models::{ContestStats, SessionStatus};
use crate::store::Store;

/// Registered/started/completed counts for a contest.
///
/// Each figure is its own count query, so a snapshot taken while students
/// are moving between states may be off by the in-flight transitions.
/// Unknown contests yield all zeros.
pub struct StatsService {
    store: Arc<dyn Store>,
}

impl StatsService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn contest_stats(&self, contest_id: &str) -> ServiceResult<ContestStats> {
        let registered = self.store.count_registrations(contest_id).await?;
        let started = self
            .store
            .count_activities(contest_id, SessionStatus::Started)
            .await?;
        let completed = self
            .store
            .count_activities(contest_id, SessionStatus::Completed)
            .await?;

        Ok(ContestStats {
            registered,
            started,
            completed,
        })
    }
}
