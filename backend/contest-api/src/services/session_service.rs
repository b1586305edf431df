use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::error::{ServiceError, ServiceResult};
use crate::metrics::SESSION_TRANSITIONS_TOTAL;
use crate::models::{SessionStatus, SessionStatusResponse};
use crate::store::{ActivityUpdate, Store};

/// Tracks each student's not_started -> started -> completed progression.
///
/// Both transitions are single upserts keyed by (contest_id, student_id), so
/// repeated or concurrent calls converge on one record.
pub struct SessionService {
    store: Arc<dyn Store>,
}

impl SessionService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn start_session(&self, contest_id: &str, student_id: &str) -> ServiceResult<()> {
        require_ids(contest_id, student_id)?;

        self.store
            .upsert_activity(
                contest_id,
                student_id,
                ActivityUpdate::Start { at: Utc::now() },
            )
            .await?;

        SESSION_TRANSITIONS_TOTAL
            .with_label_values(&[SessionStatus::Started.as_str()])
            .inc();
        tracing::info!(
            "Session started: contest_id={}, student_id={}",
            contest_id,
            student_id
        );
        Ok(())
    }

    /// Marks the session completed. A finish without a prior start still
    /// records completion.
    pub async fn finish_session(
        &self,
        contest_id: &str,
        student_id: &str,
        payload: Value,
    ) -> ServiceResult<()> {
        require_ids(contest_id, student_id)?;

        self.store
            .upsert_activity(
                contest_id,
                student_id,
                ActivityUpdate::Finish {
                    at: Utc::now(),
                    payload,
                },
            )
            .await?;

        SESSION_TRANSITIONS_TOTAL
            .with_label_values(&[SessionStatus::Completed.as_str()])
            .inc();
        tracing::info!(
            "Session completed: contest_id={}, student_id={}",
            contest_id,
            student_id
        );
        Ok(())
    }

    pub async fn get_status(
        &self,
        contest_id: &str,
        student_id: &str,
    ) -> ServiceResult<SessionStatusResponse> {
        require_ids(contest_id, student_id)?;

        let record = self.store.find_activity(contest_id, student_id).await?;
        Ok(match record {
            Some(record) => SessionStatusResponse {
                contest_id: record.contest_id,
                student_id: record.student_id,
                status: record.status,
                start_time: record.start_time,
                completed_at: record.completed_at,
            },
            None => SessionStatusResponse {
                contest_id: contest_id.to_string(),
                student_id: student_id.to_string(),
                status: SessionStatus::NotStarted,
                start_time: None,
                completed_at: None,
            },
        })
    }
}

pub(crate) fn require_ids(contest_id: &str, student_id: &str) -> ServiceResult<()> {
    if contest_id.trim().is_empty() {
        return Err(ServiceError::invalid_input("contest_id is required"));
    }
    if student_id.trim().is_empty() {
        return Err(ServiceError::invalid_input("student_id is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ActivityStore, MemoryStore};
    use serde_json::json;

    fn service() -> (SessionService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (SessionService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn unknown_session_reads_as_not_started() {
        let (service, _) = service();
        let status = service.get_status("c1", "s1").await.unwrap();
        assert_eq!(status.status, SessionStatus::NotStarted);
        assert!(status.start_time.is_none());
    }

    #[tokio::test]
    async fn start_twice_then_finish() {
        let (service, store) = service();
        service.start_session("c1", "s1").await.unwrap();
        service.start_session("c1", "s1").await.unwrap();
        assert_eq!(store.list_activities("c1").await.unwrap().len(), 1);

        service
            .finish_session("c1", "s1", json!({ "score": 7 }))
            .await
            .unwrap();
        let status = service.get_status("c1", "s1").await.unwrap();
        assert_eq!(status.status, SessionStatus::Completed);
        assert!(status.start_time.is_some());
        assert!(status.completed_at.is_some());
    }

    #[tokio::test]
    async fn finish_without_start_completes() {
        let (service, store) = service();
        service.finish_session("c1", "s9", json!({})).await.unwrap();

        let record = store.find_activity("c1", "s9").await.unwrap().unwrap();
        assert_eq!(record.status, SessionStatus::Completed);
        assert!(record.start_time.is_none());
    }

    #[tokio::test]
    async fn restart_after_completion_is_allowed() {
        let (service, _) = service();
        service.finish_session("c1", "s1", json!({})).await.unwrap();
        service.start_session("c1", "s1").await.unwrap();

        let status = service.get_status("c1", "s1").await.unwrap();
        assert_eq!(status.status, SessionStatus::Started);
    }

    #[tokio::test]
    async fn blank_ids_are_rejected() {
        let (service, _) = service();
        assert!(matches!(
            service.start_session("", "s1").await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            service.finish_session("c1", "  ", json!({})).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
