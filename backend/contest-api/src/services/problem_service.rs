use std::sync::Arc;

use chrono::Utc;

use super::selection::select_problems;
use super::session_service::SessionService;
use crate::delivery::DeliverySink;
use crate::error::{ServiceError, ServiceResult};
use crate::metrics::PROBLEM_SETS_DELIVERED_TOTAL;
use crate::models::{CodingAssessment, SaveCodingAssessmentRequest, SelectedProblemSet};
use crate::store::Store;

pub struct ProblemService {
    store: Arc<dyn Store>,
    delivery: Arc<dyn DeliverySink>,
}

impl ProblemService {
    pub fn new(store: Arc<dyn Store>, delivery: Arc<dyn DeliverySink>) -> Self {
        Self { store, delivery }
    }

    /// Bulk replace of the contest's problem pool and configuration.
    pub async fn save_coding_assessment(
        &self,
        contest_id: &str,
        req: SaveCodingAssessmentRequest,
    ) -> ServiceResult<CodingAssessment> {
        if contest_id.trim().is_empty() {
            return Err(ServiceError::invalid_input("contest_id is required"));
        }

        let assessment = CodingAssessment {
            contest_id: contest_id.to_string(),
            problems: Some(req.problems),
            test_configuration: req.test_configuration,
        };
        self.store.replace_coding_assessment(&assessment).await?;

        tracing::info!(
            "Coding assessment saved: contest_id={}, problems={}, per_start={}",
            contest_id,
            assessment.problems.as_ref().map_or(0, Vec::len),
            assessment.test_configuration.questions
        );
        Ok(assessment)
    }

    /// Starts the student's session, draws a fresh problem set and hands it
    /// to the judge. The delivered set replaces whatever was there before.
    pub async fn start_coding_test(
        &self,
        contest_id: &str,
        student_id: &str,
    ) -> ServiceResult<SelectedProblemSet> {
        SessionService::new(self.store.clone())
            .start_session(contest_id, student_id)
            .await?;

        let pool = self
            .store
            .find_coding_assessment(contest_id)
            .await?
            .and_then(|assessment| {
                let requested = assessment.test_configuration.questions;
                assessment.problems.map(|problems| (problems, requested))
            });
        let Some((problems, requested)) = pool else {
            return Err(ServiceError::not_found(
                "No problems found for the given contest_id",
            ));
        };

        let problem_set = SelectedProblemSet {
            contest_id: contest_id.to_string(),
            generated_at: Utc::now(),
            problems: select_problems(&problems, requested, &mut rand::rng()),
        };

        self.delivery.deliver(&problem_set).await.map_err(|e| {
            tracing::error!(
                "Problem set delivery failed for contest_id={}: {}",
                contest_id,
                e
            );
            ServiceError::from(e)
        })?;

        PROBLEM_SETS_DELIVERED_TOTAL.inc();
        tracing::info!(
            "Problem set delivered: contest_id={}, student_id={}, selected={} of {}",
            contest_id,
            student_id,
            problem_set.problems.len(),
            problems.len()
        );
        Ok(problem_set)
    }

    pub async fn fetch_problem_set(&self, contest_id: &str) -> ServiceResult<SelectedProblemSet> {
        self.delivery
            .fetch(contest_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("No problem set delivered for this contest"))
    }
}
