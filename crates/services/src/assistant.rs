//! # Assistant
//!
//! Mediator in front of the external AI completion API. Owns prompt
//! construction, model routing by task, response parsing and the fallback
//! rules. Two parsing regimes exist on purpose: study recommendations always
//! degrade to a fixed fallback payload, every other structured operation
//! propagates malformed upstream output as an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use domains::models::{Conversation, Sender, TranscriptEntry, User};
use domains::ports::{
    AssignmentRepo, CompletionClient, CompletionRequest, ConversationRepo, CourseRepo,
    PromptMessage, SubmissionRepo,
};
use domains::{DomainError, Result};
use domains::policy;

/// Which upstream model family a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    #[default]
    General,
    Coding,
    Recommendation,
    Research,
}

impl TaskKind {
    fn wants_reasoning(self) -> bool {
        matches!(self, TaskKind::Recommendation | TaskKind::Research)
    }
}

/// Model identifiers, configured per deployment.
#[derive(Debug, Clone)]
pub struct ModelRouting {
    /// Handles `coding` tasks
    pub coder: String,
    /// Handles everything else, with optional reasoning metadata
    pub reasoning: String,
}

impl Default for ModelRouting {
    fn default() -> Self {
        Self {
            coder: "kwaipilot/kat-coder-pro:free".to_owned(),
            reasoning: "x-ai/grok-4.1-fast:free".to_owned(),
        }
    }
}

/// One study recommendation as requested from the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub category: String,
    #[serde(rename = "estimatedTime")]
    pub estimated_time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseSuggestion {
    pub title: String,
    pub reason: String,
}

/// The `/ai/recommend` payload: raw items plus the partitioned buckets the
/// frontend renders.
#[derive(Debug, Clone, Serialize)]
pub struct StudyRecommendations {
    pub courses: Vec<CourseSuggestion>,
    pub books: Vec<String>,
    #[serde(rename = "studyPlan")]
    pub study_plan: String,
    pub recommendations: Vec<RecommendationItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceItem {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub author: String,
    pub url: String,
    pub description: String,
    pub difficulty: String,
    #[serde(rename = "isFree")]
    pub is_free: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRecommendations {
    pub resources: Vec<ResourceItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekPlan {
    pub week: u32,
    pub topics: Vec<String>,
    pub goals: Vec<String>,
    pub study_hours: f64,
    pub activities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlanReport {
    pub total_weeks: u32,
    pub weekly_plan: Vec<WeekPlan>,
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalysis {
    pub overall_performance: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvement_areas: Vec<String>,
    pub motivational_message: String,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreGradeReport {
    pub suggested_score: f64,
    pub max_score: f64,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    /// 0-100
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudyPlanInput {
    pub course_id: Uuid,
    pub available_hours_per_week: f64,
    pub student_level: Option<String>,
}

/// Progress snapshot fed into the study-recommendation prompt.
#[derive(Debug, Clone, Default)]
struct StudyProgress {
    completed_percent: f32,
    recent_grades: Vec<f64>,
    struggling_areas: Vec<String>,
}

pub struct AssistantService {
    client: Arc<dyn CompletionClient>,
    conversations: Arc<dyn ConversationRepo>,
    submissions: Arc<dyn SubmissionRepo>,
    assignments: Arc<dyn AssignmentRepo>,
    courses: Arc<dyn CourseRepo>,
    models: ModelRouting,
}

impl AssistantService {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        conversations: Arc<dyn ConversationRepo>,
        submissions: Arc<dyn SubmissionRepo>,
        assignments: Arc<dyn AssignmentRepo>,
        courses: Arc<dyn CourseRepo>,
        models: ModelRouting,
    ) -> Self {
        Self {
            client,
            conversations,
            submissions,
            assignments,
            courses,
            models,
        }
    }

    fn request(
        &self,
        task: TaskKind,
        messages: Vec<PromptMessage>,
        reasoning_details: Option<serde_json::Value>,
    ) -> CompletionRequest {
        let model = match task {
            TaskKind::Coding => self.models.coder.clone(),
            _ => self.models.reasoning.clone(),
        };
        CompletionRequest {
            model,
            messages,
            reasoning_details: reasoning_details.filter(|_| task.wants_reasoning()),
        }
    }

    // -- Free-form operations ------------------------------------------------

    /// Answers a question in the given course context; raw model text.
    pub async fn ask(
        &self,
        question: &str,
        context: Option<String>,
        task: TaskKind,
        reasoning_details: Option<serde_json::Value>,
    ) -> Result<String> {
        if question.trim().is_empty() {
            return Err(DomainError::validation("Please provide a question"));
        }
        let context = context.unwrap_or_else(|| "general learning".to_owned());
        let messages = vec![
            PromptMessage::system(format!(
                "You are a helpful tutor for the course: {context}. Provide clear, educational answers."
            )),
            PromptMessage::user(question),
        ];
        self.client
            .complete(self.request(task, messages, reasoning_details))
            .await
    }

    /// Condenses a class transcript into notes; raw model text.
    pub async fn summarize(&self, transcript: &str) -> Result<String> {
        if transcript.trim().is_empty() {
            return Err(DomainError::validation("Please provide a transcript"));
        }
        let messages = vec![
            PromptMessage::system(
                "You are an expert at summarizing educational content into clear, concise notes.",
            ),
            PromptMessage::user(format!(
                "Summarize this class transcript into key points and actionable notes:\n\n{transcript}"
            )),
        ];
        self.client
            .complete(self.request(TaskKind::General, messages, None))
            .await
    }

    // -- Structured operations ----------------------------------------------

    /// Personalized study recommendations. This operation never surfaces an
    /// upstream or parse failure: any problem substitutes the fixed fallback
    /// payload so the student always gets something actionable.
    pub async fn study_recommendations(
        &self,
        user: &User,
        course_id: Uuid,
    ) -> StudyRecommendations {
        let progress = match self.collect_progress(user, course_id).await {
            Ok(progress) => progress,
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "progress lookup failed");
                StudyProgress::default()
            }
        };

        let grades = if progress.recent_grades.is_empty() {
            "No grades yet".to_owned()
        } else {
            progress
                .recent_grades
                .iter()
                .map(|g| g.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let areas = if progress.struggling_areas.is_empty() {
            "None identified".to_owned()
        } else {
            progress.struggling_areas.join(", ")
        };
        let prompt = format!(
            "You are an expert learning advisor. Based on the following student information, \
             provide 5 personalized study recommendations.\n\n\
             Student Progress: {:.0}% complete\n\
             Recent Grades: {grades}\n\
             Struggling Areas: {areas}\n\
             Learning Pace: Normal\n\n\
             Provide recommendations in the following JSON format:\n\
             {{\n  \"recommendations\": [\n    {{\n      \"title\": \"Recommendation title\",\n      \
             \"description\": \"Brief description\",\n      \"priority\": \"high|medium|low\",\n      \
             \"category\": \"study_habit|resource|practice|concept_review\",\n      \
             \"estimatedTime\": \"time in minutes\"\n    }}\n  ]\n}}",
            progress.completed_percent
        );

        let messages = vec![
            PromptMessage::system(
                "You are a helpful learning advisor specializing in personalized education.",
            ),
            PromptMessage::user(prompt),
        ];
        let items = match self
            .client
            .complete(self.request(TaskKind::Recommendation, messages, None))
            .await
        {
            Ok(raw) => match serde_json::from_str::<RecommendationEnvelope>(&raw) {
                Ok(envelope) if !envelope.recommendations.is_empty() => envelope.recommendations,
                Ok(_) => fallback_recommendations(),
                Err(e) => {
                    tracing::warn!(user_id = %user.id, error = %e, "recommendation parse failed");
                    fallback_recommendations()
                }
            },
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "recommendation request failed");
                fallback_recommendations()
            }
        };
        partition_recommendations(items)
    }

    /// Curated external resources for a course. Malformed model output is an
    /// upstream error here, unlike study recommendations.
    pub async fn resource_recommendations(
        &self,
        course_id: Uuid,
        current_topic: Option<String>,
    ) -> Result<ResourceRecommendations> {
        let course = self
            .courses
            .find(course_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Course", course_id))?;
        let topic = current_topic.unwrap_or_else(|| "General course content".to_owned());
        let prompt = format!(
            "You are an expert educator. Recommend 5 high-quality learning resources for a \
             student studying:\n\n\
             Course: {}\n\
             Description: {}\n\
             Current Topic: {topic}\n\n\
             Provide a mix of:\n- Textbooks\n- Online courses/tutorials\n- YouTube channels\n\
             - Documentation\n- Practice platforms\n\n\
             Return in JSON format:\n\
             {{\n  \"resources\": [\n    {{\n      \"title\": \"Resource title\",\n      \
             \"type\": \"textbook|video|course|documentation|practice\",\n      \
             \"author\": \"Author/Creator name\",\n      \
             \"url\": \"URL if available or 'Search online'\",\n      \
             \"description\": \"Why this resource is helpful\",\n      \
             \"difficulty\": \"beginner|intermediate|advanced\",\n      \
             \"isFree\": true|false\n    }}\n  ]\n}}",
            course.title, course.description
        );
        let messages = vec![
            PromptMessage::system("You are a knowledgeable education resource curator."),
            PromptMessage::user(prompt),
        ];
        let raw = self
            .client
            .complete(self.request(TaskKind::Recommendation, messages, None))
            .await?;
        serde_json::from_str(&raw)
            .map_err(|_| DomainError::upstream("Failed to generate resource recommendations"))
    }

    /// Week-by-week study plan for a course.
    pub async fn study_plan(&self, input: StudyPlanInput) -> Result<StudyPlanReport> {
        let course = self
            .courses
            .find(input.course_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Course", input.course_id))?;
        let duration = match (course.start_date, course.end_date) {
            (Some(start), Some(end)) => {
                format!("{} weeks", ((end - start).num_days() / 7).max(1))
            }
            _ => "Flexible".to_owned(),
        };
        let level = input.student_level.unwrap_or_else(|| "beginner".to_owned());
        let prompt = format!(
            "Create a personalized study plan for:\n\n\
             Course: {}\n\
             Description: {}\n\
             Duration: {duration}\n\
             Student Level: {level}\n\
             Available Hours/Week: {}\n\n\
             Provide a week-by-week study plan in JSON format:\n\
             {{\n  \"totalWeeks\": number,\n  \"weeklyPlan\": [\n    {{\n      \"week\": number,\n      \
             \"topics\": [\"topic1\", \"topic2\"],\n      \"goals\": [\"goal1\", \"goal2\"],\n      \
             \"studyHours\": number,\n      \"activities\": [\"activity1\", \"activity2\"]\n    }}\n  ],\n  \
             \"tips\": [\"tip1\", \"tip2\", \"tip3\"]\n}}",
            course.title, course.description, input.available_hours_per_week
        );
        let messages = vec![
            PromptMessage::system(
                "You are an expert learning strategist creating effective study plans.",
            ),
            PromptMessage::user(prompt),
        ];
        let raw = self
            .client
            .complete(self.request(TaskKind::Recommendation, messages, None))
            .await?;
        serde_json::from_str(&raw)
            .map_err(|_| DomainError::upstream("Failed to generate study plan"))
    }

    /// Insight report over the caller's own graded work.
    pub async fn analyze_performance(&self, user: &User) -> Result<PerformanceAnalysis> {
        let submissions = self.submissions.list_for_student(user.id).await?;
        let mut rows = Vec::with_capacity(submissions.len());
        for submission in &submissions {
            let assignment = self.assignments.find(submission.assignment_id).await?;
            rows.push(json!({
                "assignment": assignment.as_ref().map(|a| a.title.clone()),
                "score": submission.score,
                "maxScore": assignment.as_ref().map(|a| a.max_score),
                "isLate": submission.is_late,
                "feedback": submission.feedback,
            }));
        }
        let data = serde_json::to_string_pretty(&rows)
            .map_err(|e| DomainError::internal(e))?;
        let prompt = format!(
            "Analyze the following student performance data and provide insights:\n\n{data}\n\n\
             Provide analysis in JSON format:\n\
             {{\n  \"overallPerformance\": \"excellent|good|average|needs_improvement\",\n  \
             \"strengths\": [\"strength1\", \"strength2\"],\n  \
             \"weaknesses\": [\"weakness1\", \"weakness2\"],\n  \
             \"improvementAreas\": [\"area1\", \"area2\"],\n  \
             \"motivationalMessage\": \"Encouraging message for the student\",\n  \
             \"nextSteps\": [\"step1\", \"step2\", \"step3\"]\n}}"
        );
        let messages = vec![
            PromptMessage::system("You are an educational analyst providing constructive feedback."),
            PromptMessage::user(prompt),
        ];
        let raw = self
            .client
            .complete(self.request(TaskKind::Recommendation, messages, None))
            .await?;
        serde_json::from_str(&raw)
            .map_err(|_| DomainError::upstream("Failed to analyze performance"))
    }

    /// Draft grading for a submission; tutors review before committing a real
    /// grade. Routed to the coder model.
    pub async fn pre_grade(&self, user: &User, submission_id: Uuid) -> Result<PreGradeReport> {
        let submission = self
            .submissions
            .find(submission_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Submission", submission_id))?;
        let assignment = self
            .assignments
            .find(submission.assignment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Assignment", submission.assignment_id))?;
        let course = self
            .courses
            .find(assignment.course_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Course", assignment.course_id))?;
        policy::require_course_manager(user, &course)
            .map_err(|_| DomainError::forbidden("Not authorized to grade this submission"))?;

        let rubric = serde_json::to_string_pretty(
            assignment.rubric.as_ref().unwrap_or(&serde_json::Value::Null),
        )
        .map_err(|e| DomainError::internal(e))?;
        let text = submission
            .text
            .clone()
            .unwrap_or_else(|| "(no text submitted)".to_owned());
        let prompt = format!(
            "You are a teaching assistant. Pre-grade the following student submission based on \
             the assignment criteria.\n\n\
             Assignment: {}\n\n\
             Rubric:\n{rubric}\n\n\
             Student Submission:\n{text}\n\n\
             Provide grading in JSON format:\n\
             {{\n  \"suggestedScore\": number,\n  \"maxScore\": number,\n  \
             \"feedback\": \"Detailed constructive feedback\",\n  \
             \"strengths\": [\"strength1\", \"strength2\"],\n  \
             \"improvements\": [\"area1\", \"area2\"],\n  \
             \"confidence\": number (0-100)\n}}",
            assignment.description
        );
        let messages = vec![
            PromptMessage::system(
                "You are a fair and constructive grading assistant. Provide honest, helpful feedback.",
            ),
            PromptMessage::user(prompt),
        ];
        let raw = self
            .client
            .complete(self.request(TaskKind::Coding, messages, None))
            .await?;
        serde_json::from_str(&raw)
            .map_err(|_| DomainError::upstream("Failed to pre-grade submission"))
    }

    // -- Conversation lifecycle ---------------------------------------------

    pub async fn create_conversation(
        &self,
        user_id: Uuid,
        name: Option<String>,
    ) -> Result<Conversation> {
        let conversation = Conversation::new(user_id, name);
        self.conversations.insert(conversation.clone()).await?;
        Ok(conversation)
    }

    /// The caller's conversations, most recently updated first.
    pub async fn conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        self.conversations.list_for_user(user_id).await
    }

    /// Owner-scoped fetch; a foreign conversation id behaves like a missing
    /// one.
    pub async fn conversation(&self, user_id: Uuid, id: Uuid) -> Result<Conversation> {
        match self.conversations.find(id).await? {
            Some(conversation) if conversation.user_id == user_id => Ok(conversation),
            _ => Err(DomainError::not_found("Conversation", id)),
        }
    }

    /// Appends one transcript turn. The HTTP client persists both sides of
    /// an exchange through this; the service never writes turns on its own.
    pub async fn append_message(
        &self,
        user_id: Uuid,
        id: Uuid,
        sender: Sender,
        content: String,
    ) -> Result<Conversation> {
        if content.trim().is_empty() {
            return Err(DomainError::validation("Message content is required"));
        }
        // Owner check before the append.
        self.conversation(user_id, id).await?;
        self.conversations
            .append(id, TranscriptEntry::now(sender, content))
            .await
    }

    async fn collect_progress(&self, user: &User, course_id: Uuid) -> Result<StudyProgress> {
        let course = self
            .courses
            .find(course_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Course", course_id))?;
        let completed_percent = course
            .enrolled_students
            .iter()
            .find(|e| e.student_id == user.id)
            .map(|e| e.progress)
            .unwrap_or(0.0);

        let submissions = self.submissions.list_for_student(user.id).await?;
        let mut recent_grades = Vec::new();
        let mut struggling_areas = Vec::new();
        for submission in submissions.iter().take(5) {
            let Some(score) = submission.score else {
                continue;
            };
            recent_grades.push(score);
            if let Some(assignment) = self.assignments.find(submission.assignment_id).await? {
                if score < f64::from(assignment.max_score) / 2.0 {
                    struggling_areas.push(assignment.title);
                }
            }
        }

        Ok(StudyProgress {
            completed_percent,
            recent_grades,
            struggling_areas,
        })
    }
}

#[derive(Deserialize)]
struct RecommendationEnvelope {
    recommendations: Vec<RecommendationItem>,
}

/// The fixed payload served whenever recommendation generation fails.
fn fallback_recommendations() -> Vec<RecommendationItem> {
    vec![
        RecommendationItem {
            title: "Stay Consistent".to_owned(),
            description: "Set aside regular study time each day to build a habit.".to_owned(),
            priority: "high".to_owned(),
            category: "study_habit".to_owned(),
            estimated_time: "30".to_owned(),
        },
        RecommendationItem {
            title: "Review Past Material".to_owned(),
            description: "Go over previous lessons to reinforce your understanding.".to_owned(),
            priority: "medium".to_owned(),
            category: "concept_review".to_owned(),
            estimated_time: "20".to_owned(),
        },
    ]
}

/// Buckets items for the frontend. The explicit category decides; the
/// "book"-in-title heuristic only catches items with no recognized category.
fn partition_recommendations(items: Vec<RecommendationItem>) -> StudyRecommendations {
    let mut courses = Vec::new();
    let mut books = Vec::new();
    let mut plan_lines = Vec::new();
    for item in &items {
        match item.category.as_str() {
            "resource" | "course" => courses.push(CourseSuggestion {
                title: item.title.clone(),
                reason: item.description.clone(),
            }),
            "book" => books.push(item.title.clone()),
            "study_habit" | "concept_review" | "practice" => plan_lines.push(format!(
                "• {}: {} ({} min)",
                item.title, item.description, item.estimated_time
            )),
            _ if item.title.to_lowercase().contains("book") => books.push(item.title.clone()),
            _ => {}
        }
    }
    StudyRecommendations {
        courses,
        books,
        study_plan: plan_lines.join("\n"),
        recommendations: items,
    }
}
