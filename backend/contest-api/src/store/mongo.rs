use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson, Bson, DateTime as BsonDateTime, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};

use super::{ActivityStore, ActivityUpdate, AssessmentStore, ContestStore, RegistrationStore, Store};
use crate::error::StoreResult;
use crate::metrics::track_db_operation;
use crate::models::{
    AssessmentOverview, CodingAssessment, Contest, CreateStudentRequest, McqAssessment,
    McqTestConfiguration, Question, Registration, SessionRecord, SessionStatus, StudentProfile,
};

const CONTESTS: &str = "Contest_Details";
const REGISTRATIONS: &str = "User_info";
const STUDENTS: &str = "students";
const MCQ_ASSESSMENTS: &str = "MCQ_Assessment_Data";
const CODING_ASSESSMENTS: &str = "coding_assessments";
const ACTIVITY: &str = "contest_activity";

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    pub fn new(client: Client, database: &str) -> Self {
        let db = client.database(database);
        Self { client, db }
    }

    fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection::<T>(name)
    }

    /// Unique keys that make the upserts and inserts below race-free.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        let indexes = [
            (ACTIVITY, doc! { "contest_id": 1, "student_id": 1 }),
            (REGISTRATIONS, doc! { "contest_id": 1, "student_id": 1 }),
            (CONTESTS, doc! { "contest_id": 1 }),
            (MCQ_ASSESSMENTS, doc! { "contestId": 1 }),
            (CODING_ASSESSMENTS, doc! { "contestId": 1 }),
        ];

        for (collection, keys) in indexes {
            let model = IndexModel::builder().keys(keys).options(unique()).build();
            self.collection::<Document>(collection)
                .create_index(model)
                .await?;
            tracing::debug!("Ensured unique index on {}", collection);
        }

        Ok(())
    }
}

fn chrono_to_bson(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY
    )
}

fn student_filter(student_id: &str) -> Document {
    match ObjectId::parse_str(student_id) {
        Ok(oid) => doc! { "_id": oid },
        Err(_) => doc! { "_id": student_id },
    }
}

fn student_from_document(document: &Document) -> StudentProfile {
    let id = match document.get("_id") {
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::String(value)) => value.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    let field = |name: &str| document.get_str(name).unwrap_or_default().to_string();

    StudentProfile {
        id,
        name: field("name"),
        regno: field("regno"),
        dept: field("dept"),
        collegename: field("collegename"),
    }
}

#[async_trait]
impl ContestStore for MongoStore {
    async fn insert_contest(&self, contest: &Contest) -> StoreResult<bool> {
        let result = track_db_operation("insert_one", CONTESTS, async {
            self.collection::<Contest>(CONTESTS).insert_one(contest).await
        })
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_duplicate_key(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_contests(&self) -> StoreResult<Vec<Contest>> {
        let cursor = track_db_operation("find", CONTESTS, async {
            self.collection::<Contest>(CONTESTS).find(doc! {}).await
        })
        .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_contest(&self, contest_id: &str) -> StoreResult<Option<Contest>> {
        let contest = track_db_operation("find_one", CONTESTS, async {
            self.collection::<Contest>(CONTESTS)
                .find_one(doc! { "contest_id": contest_id })
                .await
        })
        .await?;
        Ok(contest)
    }

    async fn delete_contest(&self, contest_id: &str) -> StoreResult<u64> {
        let result = track_db_operation("delete_one", CONTESTS, async {
            self.collection::<Document>(CONTESTS)
                .delete_one(doc! { "contest_id": contest_id })
                .await
        })
        .await?;
        Ok(result.deleted_count)
    }
}

#[async_trait]
impl RegistrationStore for MongoStore {
    async fn upsert_registration(&self, registration: &Registration) -> StoreResult<()> {
        let filter = doc! {
            "contest_id": &registration.contest_id,
            "student_id": &registration.student_id,
        };
        let update = doc! {
            "$set": {
                "name": &registration.name,
                "role": &registration.role,
                "skills": registration.skills.clone(),
            }
        };

        track_db_operation("update_one", REGISTRATIONS, async {
            self.collection::<Document>(REGISTRATIONS)
                .update_one(filter, update)
                .upsert(true)
                .await
        })
        .await?;
        Ok(())
    }

    async fn count_registrations(&self, contest_id: &str) -> StoreResult<u64> {
        let count = track_db_operation("count_documents", REGISTRATIONS, async {
            self.collection::<Document>(REGISTRATIONS)
                .count_documents(doc! { "contest_id": contest_id })
                .await
        })
        .await?;
        Ok(count)
    }

    async fn delete_registrations(&self, contest_id: &str) -> StoreResult<u64> {
        let result = track_db_operation("delete_many", REGISTRATIONS, async {
            self.collection::<Document>(REGISTRATIONS)
                .delete_many(doc! { "contest_id": contest_id })
                .await
        })
        .await?;
        Ok(result.deleted_count)
    }

    async fn insert_student(&self, student: &CreateStudentRequest) -> StoreResult<String> {
        let document = doc! {
            "name": &student.name,
            "regno": &student.regno,
            "dept": &student.dept,
            "collegename": &student.collegename,
        };

        let result = track_db_operation("insert_one", STUDENTS, async {
            self.collection::<Document>(STUDENTS)
                .insert_one(document)
                .await
        })
        .await?;

        Ok(match result.inserted_id {
            Bson::ObjectId(oid) => oid.to_hex(),
            Bson::String(value) => value,
            other => other.to_string(),
        })
    }

    async fn find_student(&self, student_id: &str) -> StoreResult<Option<StudentProfile>> {
        let document = track_db_operation("find_one", STUDENTS, async {
            self.collection::<Document>(STUDENTS)
                .find_one(student_filter(student_id))
                .await
        })
        .await?;
        Ok(document.as_ref().map(student_from_document))
    }
}

#[async_trait]
impl ActivityStore for MongoStore {
    async fn upsert_activity(
        &self,
        contest_id: &str,
        student_id: &str,
        update: ActivityUpdate,
    ) -> StoreResult<()> {
        let set = match update {
            ActivityUpdate::Start { at } => doc! {
                "status": SessionStatus::Started.as_str(),
                "start_time": chrono_to_bson(at),
            },
            ActivityUpdate::Finish { at, payload } => doc! {
                "status": SessionStatus::Completed.as_str(),
                "completed_at": chrono_to_bson(at),
                "completion": to_bson(&payload)?,
            },
        };

        // Single conditional update keyed by the unique pair
        track_db_operation("update_one", ACTIVITY, async {
            self.collection::<Document>(ACTIVITY)
                .update_one(
                    doc! { "contest_id": contest_id, "student_id": student_id },
                    doc! { "$set": set },
                )
                .upsert(true)
                .await
        })
        .await?;
        Ok(())
    }

    async fn find_activity(
        &self,
        contest_id: &str,
        student_id: &str,
    ) -> StoreResult<Option<SessionRecord>> {
        let record = track_db_operation("find_one", ACTIVITY, async {
            self.collection::<SessionRecord>(ACTIVITY)
                .find_one(doc! { "contest_id": contest_id, "student_id": student_id })
                .await
        })
        .await?;
        Ok(record)
    }

    async fn count_activities(&self, contest_id: &str, status: SessionStatus) -> StoreResult<u64> {
        let count = track_db_operation("count_documents", ACTIVITY, async {
            self.collection::<Document>(ACTIVITY)
                .count_documents(doc! { "contest_id": contest_id, "status": status.as_str() })
                .await
        })
        .await?;
        Ok(count)
    }

    async fn list_activities(&self, contest_id: &str) -> StoreResult<Vec<SessionRecord>> {
        let cursor = track_db_operation("find", ACTIVITY, async {
            self.collection::<SessionRecord>(ACTIVITY)
                .find(doc! { "contest_id": contest_id })
                .await
        })
        .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn delete_activities(&self, contest_id: &str) -> StoreResult<u64> {
        let result = track_db_operation("delete_many", ACTIVITY, async {
            self.collection::<Document>(ACTIVITY)
                .delete_many(doc! { "contest_id": contest_id })
                .await
        })
        .await?;
        Ok(result.deleted_count)
    }
}

#[async_trait]
impl AssessmentStore for MongoStore {
    async fn find_coding_assessment(
        &self,
        contest_id: &str,
    ) -> StoreResult<Option<CodingAssessment>> {
        let assessment = track_db_operation("find_one", CODING_ASSESSMENTS, async {
            self.collection::<CodingAssessment>(CODING_ASSESSMENTS)
                .find_one(doc! { "contestId": contest_id })
                .await
        })
        .await?;
        Ok(assessment)
    }

    async fn replace_coding_assessment(&self, assessment: &CodingAssessment) -> StoreResult<()> {
        track_db_operation("replace_one", CODING_ASSESSMENTS, async {
            self.collection::<CodingAssessment>(CODING_ASSESSMENTS)
                .replace_one(doc! { "contestId": &assessment.contest_id }, assessment)
                .upsert(true)
                .await
        })
        .await?;
        Ok(())
    }

    async fn delete_coding_assessment(&self, contest_id: &str) -> StoreResult<u64> {
        let result = track_db_operation("delete_many", CODING_ASSESSMENTS, async {
            self.collection::<Document>(CODING_ASSESSMENTS)
                .delete_many(doc! { "contestId": contest_id })
                .await
        })
        .await?;
        Ok(result.deleted_count)
    }

    async fn find_mcq_assessment(&self, contest_id: &str) -> StoreResult<Option<McqAssessment>> {
        let assessment = track_db_operation("find_one", MCQ_ASSESSMENTS, async {
            self.collection::<McqAssessment>(MCQ_ASSESSMENTS)
                .find_one(doc! { "contestId": contest_id })
                .await
        })
        .await?;
        Ok(assessment)
    }

    async fn ensure_mcq_assessment(&self, contest_id: &str) -> StoreResult<()> {
        track_db_operation("update_one", MCQ_ASSESSMENTS, async {
            self.collection::<Document>(MCQ_ASSESSMENTS)
                .update_one(
                    doc! { "contestId": contest_id },
                    doc! { "$setOnInsert": { "questions": [], "visible_to": [] } },
                )
                .upsert(true)
                .await
        })
        .await?;
        Ok(())
    }

    async fn save_mcq_settings(
        &self,
        contest_id: &str,
        overview: &AssessmentOverview,
        configuration: &McqTestConfiguration,
    ) -> StoreResult<()> {
        let update = doc! {
            "$set": {
                "assessmentOverview": to_bson(overview)?,
                "testConfiguration": to_bson(configuration)?,
            },
            "$setOnInsert": { "questions": [], "visible_to": [] },
        };

        track_db_operation("update_one", MCQ_ASSESSMENTS, async {
            self.collection::<Document>(MCQ_ASSESSMENTS)
                .update_one(doc! { "contestId": contest_id }, update)
                .upsert(true)
                .await
        })
        .await?;
        Ok(())
    }

    async fn push_question_if_absent(
        &self,
        contest_id: &str,
        question: &Question,
    ) -> StoreResult<bool> {
        let filter = doc! {
            "contestId": contest_id,
            "questions.question_id": { "$ne": &question.question_id },
        };
        let update = doc! { "$push": { "questions": to_bson(question)? } };

        let result = track_db_operation("update_one", MCQ_ASSESSMENTS, async {
            self.collection::<Document>(MCQ_ASSESSMENTS)
                .update_one(filter, update)
                .await
        })
        .await?;
        Ok(result.modified_count == 1)
    }

    async fn update_question(&self, contest_id: &str, question: &Question) -> StoreResult<bool> {
        let filter = doc! {
            "contestId": contest_id,
            "questions.question_id": &question.question_id,
        };
        let update = doc! {
            "$set": {
                "questions.$.questionType": &question.question_type,
                "questions.$.question": &question.question,
                "questions.$.options": question.options.clone(),
                "questions.$.correctAnswer": &question.correct_answer,
                "questions.$.mark": question.mark,
                "questions.$.negativeMark": question.negative_mark,
                "questions.$.randomizeOrder": question.randomize_order,
            }
        };

        let result = track_db_operation("update_one", MCQ_ASSESSMENTS, async {
            self.collection::<Document>(MCQ_ASSESSMENTS)
                .update_one(filter, update)
                .await
        })
        .await?;
        Ok(result.matched_count > 0)
    }

    async fn replace_questions(&self, contest_id: &str, questions: &[Question]) -> StoreResult<()> {
        let update = doc! {
            "$set": { "questions": to_bson(questions)? },
            "$setOnInsert": {
                "assessmentOverview": {},
                "testConfiguration": {},
                "visible_to": [],
            },
        };

        track_db_operation("update_one", MCQ_ASSESSMENTS, async {
            self.collection::<Document>(MCQ_ASSESSMENTS)
                .update_one(doc! { "contestId": contest_id }, update)
                .upsert(true)
                .await
        })
        .await?;
        Ok(())
    }

    async fn add_visible_students(
        &self,
        contest_id: &str,
        students: &[String],
    ) -> StoreResult<bool> {
        let update = doc! {
            "$addToSet": { "visible_to": { "$each": students.to_vec() } }
        };

        let result = track_db_operation("update_one", MCQ_ASSESSMENTS, async {
            self.collection::<Document>(MCQ_ASSESSMENTS)
                .update_one(doc! { "contestId": contest_id }, update)
                .await
        })
        .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_mcq_assessment(&self, contest_id: &str) -> StoreResult<u64> {
        let result = track_db_operation("delete_many", MCQ_ASSESSMENTS, async {
            self.collection::<Document>(MCQ_ASSESSMENTS)
                .delete_many(doc! { "contestId": contest_id })
                .await
        })
        .await?;
        Ok(result.deleted_count)
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn close(&self) {
        tracing::info!("Shutting down MongoDB client");
        self.client.clone().shutdown().await;
    }
}
