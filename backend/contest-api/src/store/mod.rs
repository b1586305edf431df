//! Persistence seam. Services talk to these traits; `MongoStore` backs them in
//! production and `MemoryStore` in tests and local runs.
//!
//! Every method is a single storage round trip. Upserts and set insertions are
//! conditional updates at the storage layer, never read-then-write from here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::models::{
    AssessmentOverview, CodingAssessment, Contest, CreateStudentRequest, McqAssessment,
    McqTestConfiguration, Question, Registration, SessionRecord, SessionStatus, StudentProfile,
};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Partial update applied to a (contest, student) session record.
#[derive(Debug, Clone)]
pub enum ActivityUpdate {
    /// status=started, start_time refreshed
    Start { at: DateTime<Utc> },
    /// status=completed, completion payload stored
    Finish {
        at: DateTime<Utc>,
        payload: serde_json::Value,
    },
}

#[async_trait]
pub trait ContestStore: Send + Sync {
    /// Returns false when a contest with the same id already exists.
    async fn insert_contest(&self, contest: &Contest) -> StoreResult<bool>;
    async fn list_contests(&self) -> StoreResult<Vec<Contest>>;
    async fn find_contest(&self, contest_id: &str) -> StoreResult<Option<Contest>>;
    async fn delete_contest(&self, contest_id: &str) -> StoreResult<u64>;
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn upsert_registration(&self, registration: &Registration) -> StoreResult<()>;
    async fn count_registrations(&self, contest_id: &str) -> StoreResult<u64>;
    async fn delete_registrations(&self, contest_id: &str) -> StoreResult<u64>;
    async fn insert_student(&self, student: &CreateStudentRequest) -> StoreResult<String>;
    async fn find_student(&self, student_id: &str) -> StoreResult<Option<StudentProfile>>;
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn upsert_activity(
        &self,
        contest_id: &str,
        student_id: &str,
        update: ActivityUpdate,
    ) -> StoreResult<()>;
    async fn find_activity(
        &self,
        contest_id: &str,
        student_id: &str,
    ) -> StoreResult<Option<SessionRecord>>;
    async fn count_activities(&self, contest_id: &str, status: SessionStatus) -> StoreResult<u64>;
    async fn list_activities(&self, contest_id: &str) -> StoreResult<Vec<SessionRecord>>;
    async fn delete_activities(&self, contest_id: &str) -> StoreResult<u64>;
}

#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn find_coding_assessment(&self, contest_id: &str)
        -> StoreResult<Option<CodingAssessment>>;
    async fn replace_coding_assessment(&self, assessment: &CodingAssessment) -> StoreResult<()>;
    async fn delete_coding_assessment(&self, contest_id: &str) -> StoreResult<u64>;

    async fn find_mcq_assessment(&self, contest_id: &str) -> StoreResult<Option<McqAssessment>>;
    /// Creates an empty assessment if none exists. Idempotent.
    async fn ensure_mcq_assessment(&self, contest_id: &str) -> StoreResult<()>;
    async fn save_mcq_settings(
        &self,
        contest_id: &str,
        overview: &AssessmentOverview,
        configuration: &McqTestConfiguration,
    ) -> StoreResult<()>;
    /// Appends the question unless one with the same `question_id` is present.
    /// Returns whether it was added.
    async fn push_question_if_absent(&self, contest_id: &str, question: &Question)
        -> StoreResult<bool>;
    /// Overwrites the question with the same `question_id`. Returns whether one matched.
    async fn update_question(&self, contest_id: &str, question: &Question) -> StoreResult<bool>;
    async fn replace_questions(&self, contest_id: &str, questions: &[Question])
        -> StoreResult<()>;
    /// Returns false when the assessment does not exist.
    async fn add_visible_students(&self, contest_id: &str, students: &[String])
        -> StoreResult<bool>;
    async fn delete_mcq_assessment(&self, contest_id: &str) -> StoreResult<u64>;
}

#[async_trait]
pub trait Store: ContestStore + RegistrationStore + ActivityStore + AssessmentStore {
    async fn ping(&self) -> StoreResult<()>;

    async fn close(&self) {}
}
