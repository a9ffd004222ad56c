use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Difficulty band used by catalog filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

/// Membership record embedded in the course document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
    /// Completion percentage, 0.0..=100.0
    pub progress: f32,
}

impl Enrollment {
    pub fn new(student_id: Uuid) -> Self {
        Self {
            student_id,
            enrolled_at: Utc::now(),
            progress: 0.0,
        }
    }
}

/// Rating record embedded in the course document; unique per student
/// (a second rating from the same student replaces the first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub student_id: Uuid,
    /// 1..=5
    pub rating: u8,
    pub review: Option<String>,
    pub rated_at: DateTime<Utc>,
}

/// One recurring slot of the course timetable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSlot {
    /// Lowercase weekday name, e.g. "monday"
    pub day: String,
    /// "HH:MM" 24h
    pub start_time: String,
    pub end_time: String,
    pub topic: Option<String>,
}

/// A course owned by exactly one tutor. Enrollments and ratings are embedded;
/// the group chat room is referenced back from `group_chat_id` and created
/// best-effort alongside the course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub tutor_id: Uuid,
    /// 0 means free; any positive price defers enrollment to payment
    pub price: f64,
    pub currency: String,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub syllabus: Option<String>,
    pub tags: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub max_students: u32,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub schedule: Vec<ScheduleSlot>,
    pub enrolled_students: Vec<Enrollment>,
    pub ratings: Vec<Rating>,
    /// Arithmetic mean of `ratings`, recomputed on every rating upsert
    pub average_rating: f32,
    /// Back-reference to the course group chat room
    pub group_chat_id: Option<Uuid>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_MAX_STUDENTS: u32 = 50;
pub const DEFAULT_CURRENCY: &str = "NGN";

impl Course {
    /// A free, published course with catalog defaults. Callers fill in the
    /// descriptive fields afterwards.
    pub fn new(title: String, tutor_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description: String::new(),
            tutor_id,
            price: 0.0,
            currency: DEFAULT_CURRENCY.to_owned(),
            category: None,
            level: None,
            syllabus: None,
            tags: Vec::new(),
            thumbnail_url: None,
            max_students: DEFAULT_MAX_STUDENTS,
            start_date: None,
            end_date: None,
            schedule: Vec::new(),
            enrolled_students: Vec::new(),
            ratings: Vec::new(),
            average_rating: 0.0,
            group_chat_id: None,
            is_published: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_free(&self) -> bool {
        self.price <= 0.0
    }

    pub fn is_enrolled(&self, student_id: Uuid) -> bool {
        self.enrolled_students
            .iter()
            .any(|e| e.student_id == student_id)
    }

    pub fn is_full(&self) -> bool {
        self.enrolled_students.len() as u32 >= self.max_students
    }

    /// Mean of the current rating set; 0.0 when unrated.
    pub fn recompute_average_rating(&mut self) {
        if self.ratings.is_empty() {
            self.average_rating = 0.0;
        } else {
            let sum: u32 = self.ratings.iter().map(|r| u32::from(r.rating)).sum();
            self.average_rating = sum as f32 / self.ratings.len() as f32;
        }
    }
}
