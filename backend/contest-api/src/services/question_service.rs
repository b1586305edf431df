use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use super::presenter::present;
use crate::error::{ServiceError, ServiceResult};
use crate::metrics::QUESTIONS_APPENDED_TOTAL;
use crate::models::{ImportRow, PresentedAssessment, Question, SaveAssessmentRequest};
use crate::store::Store;

/// MCQ question bank of a contest. Mutations are scoped to the contest id
/// carried by the caller's contest token.
pub struct QuestionService {
    store: Arc<dyn Store>,
}

impl QuestionService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn save_assessment(
        &self,
        contest_id: &str,
        req: SaveAssessmentRequest,
    ) -> ServiceResult<()> {
        self.store
            .save_mcq_settings(contest_id, &req.assessment_overview, &req.test_configuration)
            .await?;
        tracing::info!("MCQ assessment settings saved: contest_id={}", contest_id);
        Ok(())
    }

    /// Adds every question whose `question_id` is not already in the bank and
    /// returns the ones actually added. Each insert is one conditional push, so
    /// concurrent appends of the same id leave exactly one copy.
    pub async fn append_questions(
        &self,
        contest_id: &str,
        questions: Vec<Question>,
    ) -> ServiceResult<Vec<Question>> {
        if questions.is_empty() {
            return Err(ServiceError::invalid_input("No questions provided"));
        }
        if questions.iter().any(|q| q.question_id.trim().is_empty()) {
            return Err(ServiceError::invalid_input("Every question needs a question_id"));
        }

        self.store.ensure_mcq_assessment(contest_id).await?;

        let mut added = Vec::new();
        for question in questions {
            if self.store.push_question_if_absent(contest_id, &question).await? {
                added.push(question);
            }
        }

        QUESTIONS_APPENDED_TOTAL.inc_by(added.len() as u64);
        tracing::info!(
            "Questions appended: contest_id={}, added={}",
            contest_id,
            added.len()
        );
        Ok(added)
    }

    /// Staff view of the stored questions, answers included. Never writes.
    pub async fn list_questions(&self, contest_id: &str) -> ServiceResult<Vec<Question>> {
        if let Some(assessment) = self.store.find_mcq_assessment(contest_id).await? {
            return Ok(assessment.questions);
        }
        if self.store.find_contest(contest_id).await?.is_some() {
            return Ok(Vec::new());
        }
        Err(ServiceError::not_found(format!(
            "No assessment found for contestId: {}",
            contest_id
        )))
    }

    pub async fn update_question(&self, contest_id: &str, question: Question) -> ServiceResult<()> {
        if question.question_id.trim().is_empty() {
            return Err(ServiceError::invalid_input("question_id is required"));
        }
        if !self.store.update_question(contest_id, &question).await? {
            return Err(ServiceError::not_found("Question not found"));
        }
        Ok(())
    }

    /// Replaces the whole question list in one write.
    pub async fn replace_questions(
        &self,
        contest_id: &str,
        questions: Vec<Question>,
    ) -> ServiceResult<()> {
        if questions.is_empty() {
            return Err(ServiceError::invalid_input("No question data provided."));
        }
        self.store.replace_questions(contest_id, &questions).await?;
        tracing::info!(
            "Question bank replaced: contest_id={}, questions={}",
            contest_id,
            questions.len()
        );
        Ok(())
    }

    pub async fn publish(&self, contest_id: &str, students: Vec<String>) -> ServiceResult<()> {
        let students: Vec<String> = students
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect();
        if students.is_empty() {
            return Err(ServiceError::invalid_input("No students selected"));
        }
        if !self.store.add_visible_students(contest_id, &students).await? {
            return Err(ServiceError::not_found("Contest not found"));
        }
        tracing::info!(
            "Assessment published: contest_id={}, students={}",
            contest_id,
            students.len()
        );
        Ok(())
    }

    pub async fn present_assessment(&self, contest_id: &str) -> ServiceResult<PresentedAssessment> {
        let assessment = self
            .store
            .find_mcq_assessment(contest_id)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!(
                    "No assessment found for contestId: {}",
                    contest_id
                ))
            })?;

        let questions = present(
            &assessment.questions,
            assessment.test_configuration.shuffle_questions,
            &mut rand::rng(),
        );
        Ok(PresentedAssessment {
            assessment_name: assessment.assessment_overview.name,
            duration: assessment.test_configuration.duration,
            questions,
        })
    }
}

/// Turns imported sheet rows into questions. Nothing is stored; callers append
/// the result themselves.
pub fn questions_from_rows(rows: &[ImportRow]) -> ServiceResult<Vec<Question>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let row_number = index + 1;
            Ok(Question {
                question_id: Uuid::new_v4().to_string(),
                question_type: "MCQ".to_string(),
                question: row.question.trim().to_string(),
                options: row
                    .options()
                    .iter()
                    .map(|option| option.trim())
                    .filter(|option| !option.is_empty())
                    .map(str::to_string)
                    .collect(),
                correct_answer: row.correct_answer.trim().to_string(),
                mark: parse_mark(row.mark.as_ref(), "mark", row_number)?,
                negative_mark: parse_mark(row.negative_marking.as_ref(), "negative_marking", row_number)?,
                randomize_order: false,
            })
        })
        .collect()
}

fn parse_mark(raw: Option<&Value>, column: &str, row_number: usize) -> ServiceResult<i32> {
    let invalid = || {
        ServiceError::invalid_input(format!(
            "Row {}: {} must be a whole number",
            row_number, column
        ))
    };

    match raw {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(invalid),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0),
        Some(Value::String(s)) => s.trim().parse::<i32>().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssessmentOverview, Contest, McqTestConfiguration};
    use crate::store::{AssessmentStore, ContestStore, MemoryStore};
    use serde_json::json;

    fn question(id: &str) -> Question {
        Question {
            question_id: id.to_string(),
            question_type: "MCQ".to_string(),
            question: format!("Question {}", id),
            options: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            correct_answer: "b".to_string(),
            mark: 2,
            negative_mark: 1,
            randomize_order: true,
        }
    }

    fn service() -> (QuestionService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (QuestionService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn append_is_a_set_union_by_id() {
        let (service, _) = service();
        let added = service
            .append_questions("c1", vec![question("q1"), question("q2")])
            .await
            .unwrap();
        assert_eq!(added.len(), 2);

        let added = service
            .append_questions("c1", vec![question("q2"), question("q3")])
            .await
            .unwrap();
        assert_eq!(added, vec![question("q3")]);

        let stored: Vec<String> = service
            .list_questions("c1")
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.question_id)
            .collect();
        assert_eq!(stored, vec!["q1", "q2", "q3"]);
    }

    #[tokio::test]
    async fn duplicate_ids_within_one_batch_are_added_once() {
        let (service, _) = service();
        let added = service
            .append_questions("c1", vec![question("q1"), question("q1")])
            .await
            .unwrap();
        assert_eq!(added.len(), 1);
    }

    #[tokio::test]
    async fn append_rejects_empty_batches_and_blank_ids() {
        let (service, _) = service();
        assert!(matches!(
            service.append_questions("c1", vec![]).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            service.append_questions("c1", vec![question(" ")]).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn list_distinguishes_unknown_contest_from_empty_bank() {
        let (service, store) = service();
        assert!(matches!(
            service.list_questions("ghost").await,
            Err(ServiceError::NotFound(_))
        ));

        store
            .insert_contest(&Contest {
                contest_id: "c1".to_string(),
                contest_name: "Round 1".to_string(),
                start_time: String::new(),
                end_time: String::new(),
                organization_type: String::new(),
                organization_name: String::new(),
                test_type: "mcq".to_string(),
            })
            .await
            .unwrap();
        assert!(service.list_questions("c1").await.unwrap().is_empty());
        assert!(store.find_mcq_assessment("c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_overwrites_in_place() {
        let (service, _) = service();
        service
            .append_questions("c1", vec![question("q1"), question("q2")])
            .await
            .unwrap();

        let mut edited = question("q1");
        edited.question = "Edited".to_string();
        edited.mark = 5;
        service.update_question("c1", edited.clone()).await.unwrap();

        let stored = service.list_questions("c1").await.unwrap();
        assert_eq!(stored[0], edited);
        assert_eq!(stored[1], question("q2"));

        assert!(matches!(
            service.update_question("c1", question("q9")).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn replace_swaps_the_whole_list() {
        let (service, _) = service();
        service
            .append_questions("c1", vec![question("q1"), question("q2")])
            .await
            .unwrap();
        service
            .replace_questions("c1", vec![question("q7")])
            .await
            .unwrap();

        let stored = service.list_questions("c1").await.unwrap();
        assert_eq!(stored, vec![question("q7")]);
        assert!(matches!(
            service.replace_questions("c1", vec![]).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn publish_needs_students_and_an_assessment() {
        let (service, store) = service();
        assert!(matches!(
            service.publish("c1", vec!["s1".to_string()]).await,
            Err(ServiceError::NotFound(_))
        ));

        store.ensure_mcq_assessment("c1").await.unwrap();
        assert!(matches!(
            service.publish("c1", vec![]).await,
            Err(ServiceError::InvalidInput(_))
        ));

        service
            .publish("c1", vec!["s1".to_string(), "s2".to_string()])
            .await
            .unwrap();
        service
            .publish("c1", vec!["s2".to_string(), "s3".to_string()])
            .await
            .unwrap();
        let assessment = store.find_mcq_assessment("c1").await.unwrap().unwrap();
        assert_eq!(assessment.visible_to, vec!["s1", "s2", "s3"]);
    }

    #[tokio::test]
    async fn present_uses_saved_settings() {
        let (service, store) = service();
        assert!(matches!(
            service.present_assessment("c1").await,
            Err(ServiceError::NotFound(_))
        ));

        store
            .save_mcq_settings(
                "c1",
                &AssessmentOverview {
                    name: Some("Aptitude".to_string()),
                    ..AssessmentOverview::default()
                },
                &McqTestConfiguration {
                    shuffle_questions: true,
                    duration: Some(json!({ "hours": 1 })),
                    ..McqTestConfiguration::default()
                },
            )
            .await
            .unwrap();
        service
            .append_questions("c1", vec![question("q1"), question("q2")])
            .await
            .unwrap();

        let presented = service.present_assessment("c1").await.unwrap();
        assert_eq!(presented.assessment_name.as_deref(), Some("Aptitude"));
        assert_eq!(presented.duration, Some(json!({ "hours": 1 })));
        assert_eq!(presented.questions.len(), 2);
        assert!(presented
            .questions
            .iter()
            .all(|q| q.options.contains(&"b".to_string())));
    }

    #[test]
    fn rows_become_questions() {
        let rows: Vec<ImportRow> = serde_json::from_value(json!([
            {
                "question": "  Capital of France? ",
                "option_1": "Paris",
                "option_2": " Lyon ",
                "option_3": "",
                "correct_answer": "Paris ",
                "mark": "4",
                "negative_marking": 1
            },
            { "question": "Blank marks", "option_1": "x", "mark": "", "correct_answer": "x" }
        ]))
        .unwrap();

        let questions = questions_from_rows(&rows).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question, "Capital of France?");
        assert_eq!(questions[0].options, vec!["Paris", "Lyon"]);
        assert_eq!(questions[0].correct_answer, "Paris");
        assert_eq!(questions[0].mark, 4);
        assert_eq!(questions[0].negative_mark, 1);
        assert!(!questions[0].randomize_order);
        assert_eq!(questions[1].mark, 0);
        assert_ne!(questions[0].question_id, questions[1].question_id);
    }

    #[test]
    fn non_numeric_marks_name_the_row() {
        let rows: Vec<ImportRow> = serde_json::from_value(json!([
            { "question": "ok", "mark": 1 },
            { "question": "bad", "mark": "lots" }
        ]))
        .unwrap();

        match questions_from_rows(&rows) {
            Err(ServiceError::InvalidInput(message)) => assert!(message.starts_with("Row 2")),
            other => panic!("expected invalid input, got {:?}", other),
        }
    }
}
