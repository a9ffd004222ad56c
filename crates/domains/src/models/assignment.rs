use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coursework posted by the owning tutor, visible to enrolled students once
/// published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub instructions: Option<String>,
    pub due_date: DateTime<Utc>,
    /// Upper bound for the raw (pre-penalty) score
    pub max_score: u32,
    pub allow_late_submission: bool,
    /// Percentage 0..=100 deducted from late submissions at grading time
    pub late_submission_penalty: u8,
    /// Free-form grading rubric, passed through to the AI pre-grader
    pub rubric: Option<serde_json::Value>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

pub const DEFAULT_MAX_SCORE: u32 = 100;

/// `final = max(0, raw − raw · penalty/100)` when the submission is late and
/// a penalty is configured, else the raw score unchanged.
pub fn late_adjusted_score(raw: f64, is_late: bool, penalty_percent: u8) -> f64 {
    if is_late && penalty_percent > 0 {
        let deduction = raw * f64::from(penalty_percent) / 100.0;
        (raw - deduction).max(0.0)
    } else {
        raw
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Submitted,
    Graded,
}

/// An uploaded attachment, already persisted in the blob store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionFile {
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
    /// Opaque blob-store identifier
    pub storage_id: String,
}

/// At most one submission document exists per (assignment, student);
/// re-submission mutates it and bumps `attempt_number`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub files: Vec<SubmissionFile>,
    pub text: Option<String>,
    pub submitted_at: DateTime<Utc>,
    /// Computed against the assignment due date at submission time
    pub is_late: bool,
    pub attempt_number: u32,
    pub status: SubmissionStatus,
    /// Final (post-penalty) score; set at grading
    pub score: Option<f64>,
    pub feedback: Option<String>,
    pub graded_by: Option<Uuid>,
    pub graded_at: Option<DateTime<Utc>>,
}

/// Mutable fields applied on (re-)submission. `files`/`text` use patch
/// semantics: `None` preserves whatever the previous attempt stored.
#[derive(Debug, Clone)]
pub struct SubmissionDraft {
    pub files: Option<Vec<SubmissionFile>>,
    pub text: Option<String>,
    pub is_late: bool,
    pub submitted_at: DateTime<Utc>,
}
