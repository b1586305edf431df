use std::sync::Arc;

use crate::delivery::DeliverySink;
use crate::error::{ServiceError, ServiceResult, StoreError};
use crate::models::{
    Contest, ContestStudent, CreateContestRequest, CreateStudentRequest, DeleteContestOutcome,
    RegisterStudentRequest, Registration,
};
use crate::store::Store;

pub struct ContestService {
    store: Arc<dyn Store>,
    delivery: Arc<dyn DeliverySink>,
}

impl ContestService {
    pub fn new(store: Arc<dyn Store>, delivery: Arc<dyn DeliverySink>) -> Self {
        Self { store, delivery }
    }

    pub async fn create(&self, req: CreateContestRequest) -> ServiceResult<Contest> {
        let contest = Contest::from(req);
        if !self.store.insert_contest(&contest).await? {
            return Err(ServiceError::invalid_input(format!(
                "Contest {} already exists",
                contest.contest_id
            )));
        }
        tracing::info!("Contest created: contest_id={}", contest.contest_id);
        Ok(contest)
    }

    pub async fn list(&self) -> ServiceResult<Vec<Contest>> {
        Ok(self.store.list_contests().await?)
    }

    pub async fn get(&self, contest_id: &str) -> ServiceResult<Contest> {
        self.store
            .find_contest(contest_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Contest not found"))
    }

    /// Removes the contest and everything hanging off it.
    ///
    /// Every child step is attempted even if an earlier one fails. The contest
    /// document itself is removed last and only when all children are gone, so
    /// a failed delete can simply be retried.
    pub async fn delete(&self, contest_id: &str) -> ServiceResult<DeleteContestOutcome> {
        self.get(contest_id).await?;

        let mut failed: Vec<&str> = Vec::new();
        let mut outcome = DeleteContestOutcome {
            contest_id: contest_id.to_string(),
            ..DeleteContestOutcome::default()
        };

        match self.store.delete_mcq_assessment(contest_id).await {
            Ok(n) => outcome.mcq_assessments_removed = n,
            Err(e) => {
                tracing::error!("Failed to delete MCQ assessment of {}: {}", contest_id, e);
                failed.push("mcq assessment");
            }
        }
        match self.store.delete_coding_assessment(contest_id).await {
            Ok(n) => outcome.coding_assessments_removed = n,
            Err(e) => {
                tracing::error!("Failed to delete coding assessment of {}: {}", contest_id, e);
                failed.push("coding assessment");
            }
        }
        match self.store.delete_activities(contest_id).await {
            Ok(n) => outcome.sessions_removed = n,
            Err(e) => {
                tracing::error!("Failed to delete sessions of {}: {}", contest_id, e);
                failed.push("sessions");
            }
        }
        match self.store.delete_registrations(contest_id).await {
            Ok(n) => outcome.registrations_removed = n,
            Err(e) => {
                tracing::error!("Failed to delete registrations of {}: {}", contest_id, e);
                failed.push("registrations");
            }
        }
        if let Err(e) = self.delivery.discard(contest_id).await {
            tracing::error!("Failed to discard problem set of {}: {}", contest_id, e);
            failed.push("problem set");
        }

        if !failed.is_empty() {
            return Err(ServiceError::StoreFailure(StoreError::Other(format!(
                "Contest {} cascade incomplete: {} failed",
                contest_id,
                failed.join(", ")
            ))));
        }

        self.store.delete_contest(contest_id).await?;
        tracing::info!(
            "Contest deleted: contest_id={}, sessions={}, registrations={}",
            contest_id,
            outcome.sessions_removed,
            outcome.registrations_removed
        );
        Ok(outcome)
    }

    /// Upsert keyed by (contest_id, student_id); re-registering updates the row.
    pub async fn register(
        &self,
        contest_id: &str,
        req: RegisterStudentRequest,
    ) -> ServiceResult<Registration> {
        self.get(contest_id).await?;

        let registration = Registration {
            contest_id: contest_id.to_string(),
            student_id: req.student_id,
            name: req.name,
            role: req.role,
            skills: req.skills,
        };
        self.store.upsert_registration(&registration).await?;
        tracing::info!(
            "Student registered: contest_id={}, student_id={}",
            contest_id,
            registration.student_id
        );
        Ok(registration)
    }

    pub async fn create_student(&self, req: CreateStudentRequest) -> ServiceResult<String> {
        let id = self.store.insert_student(&req).await?;
        tracing::info!("Student profile created: id={}", id);
        Ok(id)
    }

    /// Every session record of the contest joined with the student's profile.
    /// Records without a profile are left out.
    pub async fn contest_students(&self, contest_id: &str) -> ServiceResult<Vec<ContestStudent>> {
        let records = self.store.list_activities(contest_id).await?;

        let mut students = Vec::with_capacity(records.len());
        for record in records {
            match self.store.find_student(&record.student_id).await? {
                Some(profile) => students.push(ContestStudent::new(profile, record.status)),
                None => tracing::debug!(
                    "Skipping session of unknown student {} in {}",
                    record.student_id,
                    contest_id
                ),
            }
        }
        Ok(students)
    }
}
