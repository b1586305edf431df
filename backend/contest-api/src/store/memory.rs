use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ActivityStore, ActivityUpdate, AssessmentStore, ContestStore, RegistrationStore, Store};
use crate::error::StoreResult;
use crate::models::{
    AssessmentOverview, CodingAssessment, Contest, CreateStudentRequest, McqAssessment,
    McqTestConfiguration, Question, Registration, SessionRecord, SessionStatus, StudentProfile,
};

type PairKey = (String, String);

#[derive(Default)]
struct MemoryState {
    contests: Vec<Contest>,
    registrations: BTreeMap<PairKey, Registration>,
    students: BTreeMap<String, StudentProfile>,
    activity: BTreeMap<PairKey, SessionRecord>,
    coding: BTreeMap<String, CodingAssessment>,
    mcq: BTreeMap<String, McqAssessment>,
}

/// Process-local store. Each call holds the lock for its whole update, which
/// gives the same per-document atomicity as the MongoDB conditional updates.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn pair(contest_id: &str, student_id: &str) -> PairKey {
    (contest_id.to_string(), student_id.to_string())
}

fn remove_where<K: Ord + Clone, V>(map: &mut BTreeMap<K, V>, keep: impl Fn(&K) -> bool) -> u64 {
    let before = map.len();
    map.retain(|key, _| keep(key));
    (before - map.len()) as u64
}

#[async_trait]
impl ContestStore for MemoryStore {
    async fn insert_contest(&self, contest: &Contest) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        if state
            .contests
            .iter()
            .any(|existing| existing.contest_id == contest.contest_id)
        {
            return Ok(false);
        }
        state.contests.push(contest.clone());
        Ok(true)
    }

    async fn list_contests(&self) -> StoreResult<Vec<Contest>> {
        Ok(self.state.lock().await.contests.clone())
    }

    async fn find_contest(&self, contest_id: &str) -> StoreResult<Option<Contest>> {
        let state = self.state.lock().await;
        Ok(state
            .contests
            .iter()
            .find(|contest| contest.contest_id == contest_id)
            .cloned())
    }

    async fn delete_contest(&self, contest_id: &str) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.contests.len();
        state.contests.retain(|contest| contest.contest_id != contest_id);
        Ok((before - state.contests.len()) as u64)
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn upsert_registration(&self, registration: &Registration) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.registrations.insert(
            pair(&registration.contest_id, &registration.student_id),
            registration.clone(),
        );
        Ok(())
    }

    async fn count_registrations(&self, contest_id: &str) -> StoreResult<u64> {
        let state = self.state.lock().await;
        Ok(state
            .registrations
            .keys()
            .filter(|(contest, _)| contest == contest_id)
            .count() as u64)
    }

    async fn delete_registrations(&self, contest_id: &str) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        Ok(remove_where(&mut state.registrations, |(contest, _)| {
            contest != contest_id
        }))
    }

    async fn insert_student(&self, student: &CreateStudentRequest) -> StoreResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        let profile = StudentProfile {
            id: id.clone(),
            name: student.name.clone(),
            regno: student.regno.clone(),
            dept: student.dept.clone(),
            collegename: student.collegename.clone(),
        };
        self.state.lock().await.students.insert(id.clone(), profile);
        Ok(id)
    }

    async fn find_student(&self, student_id: &str) -> StoreResult<Option<StudentProfile>> {
        Ok(self.state.lock().await.students.get(student_id).cloned())
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn upsert_activity(
        &self,
        contest_id: &str,
        student_id: &str,
        update: ActivityUpdate,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let record = state
            .activity
            .entry(pair(contest_id, student_id))
            .or_insert_with(|| SessionRecord {
                contest_id: contest_id.to_string(),
                student_id: student_id.to_string(),
                status: SessionStatus::NotStarted,
                start_time: None,
                completed_at: None,
                completion: None,
            });

        match update {
            ActivityUpdate::Start { at } => {
                record.status = SessionStatus::Started;
                record.start_time = Some(at);
            }
            ActivityUpdate::Finish { at, payload } => {
                record.status = SessionStatus::Completed;
                record.completed_at = Some(at);
                record.completion = Some(payload);
            }
        }
        Ok(())
    }

    async fn find_activity(
        &self,
        contest_id: &str,
        student_id: &str,
    ) -> StoreResult<Option<SessionRecord>> {
        let state = self.state.lock().await;
        Ok(state.activity.get(&pair(contest_id, student_id)).cloned())
    }

    async fn count_activities(&self, contest_id: &str, status: SessionStatus) -> StoreResult<u64> {
        let state = self.state.lock().await;
        Ok(state
            .activity
            .values()
            .filter(|record| record.contest_id == contest_id && record.status == status)
            .count() as u64)
    }

    async fn list_activities(&self, contest_id: &str) -> StoreResult<Vec<SessionRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .activity
            .values()
            .filter(|record| record.contest_id == contest_id)
            .cloned()
            .collect())
    }

    async fn delete_activities(&self, contest_id: &str) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        Ok(remove_where(&mut state.activity, |(contest, _)| {
            contest != contest_id
        }))
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn find_coding_assessment(
        &self,
        contest_id: &str,
    ) -> StoreResult<Option<CodingAssessment>> {
        Ok(self.state.lock().await.coding.get(contest_id).cloned())
    }

    async fn replace_coding_assessment(&self, assessment: &CodingAssessment) -> StoreResult<()> {
        self.state
            .lock()
            .await
            .coding
            .insert(assessment.contest_id.clone(), assessment.clone());
        Ok(())
    }

    async fn delete_coding_assessment(&self, contest_id: &str) -> StoreResult<u64> {
        let removed = self.state.lock().await.coding.remove(contest_id);
        Ok(removed.map_or(0, |_| 1))
    }

    async fn find_mcq_assessment(&self, contest_id: &str) -> StoreResult<Option<McqAssessment>> {
        Ok(self.state.lock().await.mcq.get(contest_id).cloned())
    }

    async fn ensure_mcq_assessment(&self, contest_id: &str) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state
            .mcq
            .entry(contest_id.to_string())
            .or_insert_with(|| McqAssessment {
                contest_id: contest_id.to_string(),
                ..McqAssessment::default()
            });
        Ok(())
    }

    async fn save_mcq_settings(
        &self,
        contest_id: &str,
        overview: &AssessmentOverview,
        configuration: &McqTestConfiguration,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let assessment = state
            .mcq
            .entry(contest_id.to_string())
            .or_insert_with(|| McqAssessment {
                contest_id: contest_id.to_string(),
                ..McqAssessment::default()
            });
        assessment.assessment_overview = overview.clone();
        assessment.test_configuration = configuration.clone();
        Ok(())
    }

    async fn push_question_if_absent(
        &self,
        contest_id: &str,
        question: &Question,
    ) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let Some(assessment) = state.mcq.get_mut(contest_id) else {
            return Ok(false);
        };
        if assessment
            .questions
            .iter()
            .any(|existing| existing.question_id == question.question_id)
        {
            return Ok(false);
        }
        assessment.questions.push(question.clone());
        Ok(true)
    }

    async fn update_question(&self, contest_id: &str, question: &Question) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let slot = state.mcq.get_mut(contest_id).and_then(|assessment| {
            assessment
                .questions
                .iter_mut()
                .find(|existing| existing.question_id == question.question_id)
        });

        match slot {
            Some(existing) => {
                *existing = question.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn replace_questions(&self, contest_id: &str, questions: &[Question]) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let assessment = state
            .mcq
            .entry(contest_id.to_string())
            .or_insert_with(|| McqAssessment {
                contest_id: contest_id.to_string(),
                ..McqAssessment::default()
            });
        assessment.questions = questions.to_vec();
        Ok(())
    }

    async fn add_visible_students(
        &self,
        contest_id: &str,
        students: &[String],
    ) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let Some(assessment) = state.mcq.get_mut(contest_id) else {
            return Ok(false);
        };
        for student in students {
            if !assessment.visible_to.contains(student) {
                assessment.visible_to.push(student.clone());
            }
        }
        Ok(true)
    }

    async fn delete_mcq_assessment(&self, contest_id: &str) -> StoreResult<u64> {
        let removed = self.state.lock().await.mcq.remove(contest_id);
        Ok(removed.map_or(0, |_| 1))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
