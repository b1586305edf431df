use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SampleCase {
    pub input: String,
    pub output: String,
}

/// A coding problem authored for one contest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Problem {
    pub title: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub problem_statement: String,
    #[serde(default)]
    pub samples: Vec<SampleCase>,
    /// Graded cases. Handed to the judge with the selected set, so the
    /// start response carries them too.
    #[serde(default)]
    pub hidden_samples: Vec<SampleCase>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodingTestConfiguration {
    /// Number of problems drawn per start. Stored as a number or a numeric string.
    #[serde(default, deserialize_with = "deserialize_count")]
    pub questions: i64,
}

/// Document in "coding_assessments". `problems` is `None` when the pool was
/// never authored, which differs from an authored but empty pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodingAssessment {
    #[serde(rename = "contestId")]
    pub contest_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problems: Option<Vec<Problem>>,
    #[serde(rename = "testConfiguration", default)]
    pub test_configuration: CodingTestConfiguration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveCodingAssessmentRequest {
    pub problems: Vec<Problem>,
    #[serde(rename = "testConfiguration", default)]
    pub test_configuration: CodingTestConfiguration,
}

/// Numbered projection of a selected problem, handed to the judge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemView {
    pub id: usize,
    pub title: String,
    pub role: String,
    pub level: String,
    pub problem_statement: String,
    pub samples: Vec<SampleCase>,
    pub hidden_samples: Vec<SampleCase>,
}

impl ProblemView {
    pub fn numbered(id: usize, problem: &Problem) -> Self {
        ProblemView {
            id,
            title: problem.title.clone(),
            role: problem.role.clone(),
            level: problem.level.clone(),
            problem_statement: problem.problem_statement.clone(),
            samples: problem.samples.clone(),
            hidden_samples: problem.hidden_samples.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedProblemSet {
    pub contest_id: String,
    pub generated_at: DateTime<Utc>,
    pub problems: Vec<ProblemView>,
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Option::<RawCount>::deserialize(deserializer)? {
        None => Ok(0),
        Some(RawCount::Int(n)) => Ok(n),
        Some(RawCount::Float(f)) => Ok(f as i64),
        Some(RawCount::Text(s)) if s.trim().is_empty() => Ok(0),
        Some(RawCount::Text(s)) => s.trim().parse::<i64>().map_err(|_| {
            serde::de::Error::custom(format!("questions must be a whole number, got '{}'", s))
        }),
    }
}
