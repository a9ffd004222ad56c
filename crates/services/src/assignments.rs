//! # Assignments
//!
//! Assignment publication, submission and grading. Submissions are unique per
//! (assignment, student); the storage adapter performs the upsert atomically,
//! so two concurrent submits from the same student still resolve to one
//! document with a bumped attempt counter.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domains::models::{
    late_adjusted_score, Assignment, Course, Role, Submission, SubmissionDraft, SubmissionFile,
    SubmissionStatus, User, UserSummary, DEFAULT_MAX_SCORE,
};
use domains::policy;
use domains::ports::{AssignmentRepo, CourseRepo, FileStore, SubmissionRepo, UserRepo};
use domains::{DomainError, Result};

use crate::notifications::{Notifier, OutboundEvent};

/// Upload cap per submission, matching the HTTP layer's multipart limit.
pub const MAX_SUBMISSION_FILES: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssignmentInput {
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub instructions: Option<String>,
    pub due_date: DateTime<Utc>,
    pub max_score: Option<u32>,
    pub allow_late_submission: Option<bool>,
    pub late_submission_penalty: Option<u8>,
    pub rubric: Option<serde_json::Value>,
}

/// One file received from the multipart form, not yet persisted.
pub struct UploadedFile {
    pub data: Vec<u8>,
    pub file_name: String,
    pub content_type: mime::Mime,
}

pub struct SubmitInput {
    pub files: Vec<UploadedFile>,
    pub text: Option<String>,
}

/// Tutor-view submission enriched with who submitted and who graded.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionView {
    #[serde(flatten)]
    pub submission: Submission,
    pub student: Option<UserSummary>,
    pub grader: Option<UserSummary>,
}

/// Student-view submission enriched with its assignment and course.
#[derive(Debug, Clone, Serialize)]
pub struct OwnSubmissionView {
    #[serde(flatten)]
    pub submission: Submission,
    pub assignment: Option<AssignmentRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentRef {
    pub id: Uuid,
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub max_score: u32,
    pub course_id: Uuid,
    pub course_title: Option<String>,
}

pub struct AssignmentService {
    assignments: Arc<dyn AssignmentRepo>,
    submissions: Arc<dyn SubmissionRepo>,
    courses: Arc<dyn CourseRepo>,
    users: Arc<dyn UserRepo>,
    files: Arc<dyn FileStore>,
    notifier: Arc<Notifier>,
}

impl AssignmentService {
    pub fn new(
        assignments: Arc<dyn AssignmentRepo>,
        submissions: Arc<dyn SubmissionRepo>,
        courses: Arc<dyn CourseRepo>,
        users: Arc<dyn UserRepo>,
        files: Arc<dyn FileStore>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            assignments,
            submissions,
            courses,
            users,
            files,
            notifier,
        }
    }

    /// Publishes an assignment and fans out a notification (plus best-effort
    /// email) to every enrolled student.
    pub async fn create(&self, user: &User, input: CreateAssignmentInput) -> Result<Assignment> {
        if input.title.trim().is_empty() || input.description.trim().is_empty() {
            return Err(DomainError::validation(
                "Please provide all required fields",
            ));
        }
        let penalty = input.late_submission_penalty.unwrap_or(0);
        if penalty > 100 {
            return Err(DomainError::validation(
                "Late submission penalty must be between 0 and 100",
            ));
        }

        let course = self.require_course(input.course_id).await?;
        policy::require_course_manager(user, &course).map_err(|_| {
            DomainError::forbidden("Not authorized to create assignments for this course")
        })?;

        let assignment = Assignment {
            id: Uuid::new_v4(),
            course_id: course.id,
            title: input.title.trim().to_owned(),
            description: input.description,
            instructions: input.instructions,
            due_date: input.due_date,
            max_score: input.max_score.unwrap_or(DEFAULT_MAX_SCORE),
            allow_late_submission: input.allow_late_submission.unwrap_or(false),
            late_submission_penalty: penalty,
            rubric: input.rubric,
            is_published: true,
            created_at: Utc::now(),
        };
        self.assignments.insert(assignment.clone()).await?;

        self.notifier
            .dispatch(OutboundEvent::AssignmentPublished {
                course_id: course.id,
                course_title: course.title,
                assignment_id: assignment.id,
                assignment_title: assignment.title.clone(),
                recipients: course
                    .enrolled_students
                    .iter()
                    .map(|e| e.student_id)
                    .collect(),
            })
            .await;

        tracing::info!(assignment_id = %assignment.id, course_id = %course.id, "assignment created");
        Ok(assignment)
    }

    /// Published assignments of a course, newest first.
    pub async fn list_for_course(&self, course_id: Uuid) -> Result<Vec<Assignment>> {
        self.assignments.list_for_course(course_id).await
    }

    /// Single assignment; students also get their own submission back.
    pub async fn get(
        &self,
        user: &User,
        assignment_id: Uuid,
    ) -> Result<(Assignment, Option<Submission>)> {
        let assignment = self.require_assignment(assignment_id).await?;
        let submission = if user.role == Role::Student {
            self.submissions.find_by_pair(assignment_id, user.id).await?
        } else {
            None
        };
        Ok((assignment, submission))
    }

    /// (Re-)submits. Enrollment is required, lateness is computed here, and
    /// the storage upsert keeps one document per (assignment, student).
    pub async fn submit(
        &self,
        student: &User,
        assignment_id: Uuid,
        input: SubmitInput,
    ) -> Result<Submission> {
        if input.files.len() > MAX_SUBMISSION_FILES {
            return Err(DomainError::validation(format!(
                "At most {MAX_SUBMISSION_FILES} files per submission"
            )));
        }
        let text = input.text.filter(|t| !t.trim().is_empty());
        if input.files.is_empty() && text.is_none() {
            return Err(DomainError::validation(
                "Please provide files or text to submit",
            ));
        }

        let assignment = self.require_assignment(assignment_id).await?;
        let course = self.require_course(assignment.course_id).await?;
        if !course.is_enrolled(student.id) {
            return Err(DomainError::forbidden(
                "You must be enrolled in the course to submit assignments",
            ));
        }

        let now = Utc::now();
        let is_late = now > assignment.due_date;
        if is_late && !assignment.allow_late_submission {
            return Err(DomainError::DeadlinePassed);
        }

        // Persist attachments before touching the submission document.
        let mut stored_files = Vec::with_capacity(input.files.len());
        for file in input.files {
            let stored = self
                .files
                .store(file.data, &file.file_name, &file.content_type)
                .await?;
            stored_files.push(SubmissionFile {
                file_name: file.file_name,
                file_url: stored.url,
                file_type: file.content_type.to_string(),
                storage_id: stored.id,
            });
        }

        let draft = SubmissionDraft {
            files: (!stored_files.is_empty()).then_some(stored_files),
            text,
            is_late,
            submitted_at: now,
        };
        let submission = self
            .submissions
            .upsert(assignment_id, student.id, draft)
            .await?;

        self.notifier
            .dispatch(OutboundEvent::SubmissionReceived {
                tutor_id: course.tutor_id,
                course_id: course.id,
                assignment_id,
                assignment_title: assignment.title.clone(),
                student_name: student.name.clone(),
            })
            .await;

        tracing::info!(
            assignment_id = %assignment_id,
            student_id = %student.id,
            attempt = submission.attempt_number,
            late = is_late,
            "assignment submitted"
        );
        Ok(submission)
    }

    /// Grades a submission. The raw score is bounded by the assignment's max;
    /// the stored score is the late-adjusted final.
    pub async fn grade(
        &self,
        user: &User,
        submission_id: Uuid,
        raw_score: f64,
        feedback: Option<String>,
    ) -> Result<Submission> {
        let mut submission = self
            .submissions
            .find(submission_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Submission", submission_id))?;
        let assignment = self.require_assignment(submission.assignment_id).await?;
        let course = self.require_course(assignment.course_id).await?;
        policy::require_course_manager(user, &course)
            .map_err(|_| DomainError::forbidden("Not authorized to grade this submission"))?;

        if raw_score < 0.0 {
            return Err(DomainError::validation("Score cannot be negative"));
        }
        if raw_score > f64::from(assignment.max_score) {
            return Err(DomainError::validation(format!(
                "Score cannot exceed {}",
                assignment.max_score
            )));
        }

        submission.score = Some(late_adjusted_score(
            raw_score,
            submission.is_late,
            assignment.late_submission_penalty,
        ));
        submission.feedback = feedback;
        submission.status = SubmissionStatus::Graded;
        submission.graded_by = Some(user.id);
        submission.graded_at = Some(Utc::now());
        self.submissions.update(&submission).await?;

        self.notifier
            .dispatch(OutboundEvent::SubmissionGraded {
                student_id: submission.student_id,
                course_id: course.id,
                assignment_id: assignment.id,
                assignment_title: assignment.title.clone(),
            })
            .await;

        tracing::info!(
            submission_id = %submission_id,
            grader_id = %user.id,
            score = submission.score,
            "submission graded"
        );
        Ok(submission)
    }

    /// All submissions of an assignment for the tutor view, newest first,
    /// enriched with submitter and grader identity.
    pub async fn submissions(
        &self,
        user: &User,
        assignment_id: Uuid,
    ) -> Result<Vec<SubmissionView>> {
        let assignment = self.require_assignment(assignment_id).await?;
        let course = self.require_course(assignment.course_id).await?;
        policy::require_course_manager(user, &course)
            .map_err(|_| DomainError::forbidden("Not authorized to view these submissions"))?;

        let submissions = self.submissions.list_for_assignment(assignment_id).await?;
        let mut ids: Vec<Uuid> = submissions.iter().map(|s| s.student_id).collect();
        ids.extend(submissions.iter().filter_map(|s| s.graded_by));
        let people = self.summaries_by_id(&ids).await?;

        Ok(submissions
            .into_iter()
            .map(|submission| SubmissionView {
                student: people.get(&submission.student_id).cloned(),
                grader: submission.graded_by.and_then(|id| people.get(&id).cloned()),
                submission,
            })
            .collect())
    }

    /// The caller's own submissions across all courses, newest first,
    /// enriched with assignment and course titles.
    pub async fn my_submissions(&self, student: &User) -> Result<Vec<OwnSubmissionView>> {
        policy::require_role(student, Role::Student)?;
        let submissions = self.submissions.list_for_student(student.id).await?;

        let mut assignments: HashMap<Uuid, Assignment> = HashMap::new();
        let mut course_titles: HashMap<Uuid, String> = HashMap::new();
        for submission in &submissions {
            if assignments.contains_key(&submission.assignment_id) {
                continue;
            }
            if let Some(assignment) = self.assignments.find(submission.assignment_id).await? {
                if !course_titles.contains_key(&assignment.course_id) {
                    if let Some(course) = self.courses.find(assignment.course_id).await? {
                        course_titles.insert(course.id, course.title);
                    }
                }
                assignments.insert(assignment.id, assignment);
            }
        }

        Ok(submissions
            .into_iter()
            .map(|submission| {
                let assignment = assignments.get(&submission.assignment_id).map(|a| {
                    AssignmentRef {
                        id: a.id,
                        title: a.title.clone(),
                        due_date: a.due_date,
                        max_score: a.max_score,
                        course_id: a.course_id,
                        course_title: course_titles.get(&a.course_id).cloned(),
                    }
                });
                OwnSubmissionView {
                    submission,
                    assignment,
                }
            })
            .collect())
    }

    async fn summaries_by_id(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, UserSummary>> {
        let users = self.users.find_many(ids).await?;
        Ok(users.into_iter().map(|u| (u.id, u.summary())).collect())
    }

    async fn require_assignment(&self, assignment_id: Uuid) -> Result<Assignment> {
        self.assignments
            .find(assignment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Assignment", assignment_id))
    }

    async fn require_course(&self, course_id: Uuid) -> Result<Course> {
        self.courses
            .find(course_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Course", course_id))
    }
}
