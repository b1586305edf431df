use serde::{Deserialize, Serialize};
use validator::Validate;

use super::SessionStatus;

/// A student's registration for a contest ("User_info" collection).
/// Unique per (contest_id, student_id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Registration {
    pub contest_id: String,
    pub student_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterStudentRequest {
    #[validate(length(min = 1, message = "student_id is required"))]
    pub student_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Student profile from the "students" collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentProfile {
    pub id: String,
    pub name: String,
    pub regno: String,
    pub dept: String,
    pub collegename: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "regno is required"))]
    pub regno: String,
    #[serde(default)]
    pub dept: String,
    #[serde(default)]
    pub collegename: String,
}

/// Roster row: a session record joined with the student's profile.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContestStudent {
    pub id: String,
    pub name: String,
    pub registration_number: String,
    pub department: String,
    pub collegename: String,
    pub status: SessionStatus,
}

impl ContestStudent {
    pub fn new(profile: StudentProfile, status: SessionStatus) -> Self {
        ContestStudent {
            id: profile.id,
            name: profile.name,
            registration_number: profile.regno,
            department: profile.dept,
            collegename: profile.collegename,
            status,
        }
    }
}
