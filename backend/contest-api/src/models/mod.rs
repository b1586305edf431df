pub mod activity;
pub mod contest;
pub mod problem;
pub mod question;
pub mod registration;

pub use activity::{
    ContestStats, FinishSessionRequest, SessionRecord, SessionStatus, SessionStatusResponse,
    StartSessionRequest,
};
pub use contest::{Contest, CreateContestRequest, DeleteContestOutcome};
pub use problem::{
    CodingAssessment, CodingTestConfiguration, Problem, ProblemView, SampleCase,
    SaveCodingAssessmentRequest, SelectedProblemSet,
};
pub use question::{
    AssessmentOverview, ImportRow, IssueTokenRequest, McqAssessment, McqTestConfiguration,
    PresentedAssessment, PublishRequest, Question, QuestionView, QuestionsPayload,
    SaveAssessmentRequest, TokenResponse,
};
pub use registration::{
    ContestStudent, CreateStudentRequest, RegisterStudentRequest, Registration, StudentProfile,
};

// Serde converters for chrono::DateTime <-> mongodb::bson::DateTime
pub(crate) mod bson_datetime_as_chrono_option {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => {
                let bson_dt = bson::DateTime::from_millis(d.timestamp_millis());
                serializer.serialize_some(&bson_dt)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt_bson_dt: Option<bson::DateTime> = Option::deserialize(deserializer)?;
        match opt_bson_dt {
            None => Ok(None),
            Some(dt) => DateTime::from_timestamp_millis(dt.timestamp_millis())
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom("timestamp out of range")),
        }
    }
}
