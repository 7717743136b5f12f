//! Staff assessment forms, questions, and graded submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentForm {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub form_id: String,
    pub text: String,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub question_id: String,
    pub text: String,
    pub points: i64,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentSubmission {
    pub id: String,
    pub form_id: String,
    /// The staff member being evaluated.
    pub subject: String,
    pub submitted_by: String,
    pub score: i64,
    pub max_score: i64,
    pub percent: i64,
    pub submitted_at: DateTime<Utc>,
}

/// One chosen option inside a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionAnswer {
    pub submission_id: String,
    pub question_id: String,
    pub option_id: String,
}
