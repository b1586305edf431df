use serde::{Deserialize, Serialize};
use validator::Validate;

/// Contest stored in the "Contest_Details" collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contest {
    pub contest_id: String,
    #[serde(default)]
    pub contest_name: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub organization_type: String,
    #[serde(default)]
    pub organization_name: String,
    #[serde(rename = "testType", default)]
    pub test_type: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateContestRequest {
    #[validate(length(min = 1, max = 128, message = "contest_id is required"))]
    pub contest_id: String,

    #[validate(length(max = 200, message = "contest_name must be at most 200 characters"))]
    #[serde(default)]
    pub contest_name: String,

    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub organization_type: String,
    #[serde(default)]
    pub organization_name: String,

    #[serde(rename = "ContestType", default)]
    pub test_type: String,
}

impl From<CreateContestRequest> for Contest {
    fn from(req: CreateContestRequest) -> Self {
        Contest {
            contest_id: req.contest_id,
            contest_name: req.contest_name,
            start_time: req.start_time,
            end_time: req.end_time,
            organization_type: req.organization_type,
            organization_name: req.organization_name,
            test_type: req.test_type,
        }
    }
}

/// Child documents removed alongside a contest.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DeleteContestOutcome {
    pub contest_id: String,
    pub mcq_assessments_removed: u64,
    pub coding_assessments_removed: u64,
    pub sessions_removed: u64,
    pub registrations_removed: u64,
}
