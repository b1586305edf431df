use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

fn default_question_type() -> String {
    "MCQ".to_string()
}

/// MCQ question embedded in an assessment document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "question_id", default)]
    pub question_id: String,
    #[serde(default = "default_question_type")]
    pub question_type: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    /// Option text, not an index, so reordering options keeps it valid.
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub mark: i32,
    #[serde(default)]
    pub negative_mark: i32,
    #[serde(default)]
    pub randomize_order: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct McqTestConfiguration {
    #[serde(default)]
    pub shuffle_questions: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssessmentOverview {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Document in "MCQ_Assessment_Data", one per contest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct McqAssessment {
    pub contest_id: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub test_configuration: McqTestConfiguration,
    #[serde(default)]
    pub assessment_overview: AssessmentOverview,
    #[serde(rename = "visible_to", default)]
    pub visible_to: Vec<String>,
}

/// What a student sees of a question. Never carries the correct answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub text: String,
    pub options: Vec<String>,
    pub mark: i32,
    pub negative_mark: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PresentedAssessment {
    pub assessment_name: Option<String>,
    pub duration: Option<Value>,
    pub questions: Vec<QuestionView>,
}

/// One row of a bulk question import, keyed by the sheet's column names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportRow {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub option_1: String,
    #[serde(default)]
    pub option_2: String,
    #[serde(default)]
    pub option_3: String,
    #[serde(default)]
    pub option_4: String,
    #[serde(default)]
    pub option_5: String,
    #[serde(default)]
    pub option_6: String,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub mark: Option<Value>,
    #[serde(default)]
    pub negative_marking: Option<Value>,
}

impl ImportRow {
    pub fn options(&self) -> [&str; 6] {
        [
            &self.option_1,
            &self.option_2,
            &self.option_3,
            &self.option_4,
            &self.option_5,
            &self.option_6,
        ]
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IssueTokenRequest {
    #[validate(length(min = 1, message = "Contest ID is required"))]
    #[serde(rename = "contestId", default)]
    pub contest_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAssessmentRequest {
    #[serde(default)]
    pub assessment_overview: AssessmentOverview,
    #[serde(default)]
    pub test_configuration: McqTestConfiguration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionsPayload {
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishRequest {
    #[serde(default)]
    pub students: Vec<String>,
}
