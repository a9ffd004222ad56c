//! # Courses
//!
//! Catalog CRUD, enrollment and ratings. Enrollment and course creation touch
//! several documents, so both run as sagas: the pivot write aborts the
//! request on failure, the tail steps are best-effort.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use domains::models::{
    ChatRoom, Course, CourseLevel, Enrollment, Participant, ParticipantRole, Rating, Role,
    ScheduleSlot, User, DEFAULT_CURRENCY, DEFAULT_MAX_STUDENTS,
};
use domains::policy;
use domains::ports::{ChatRoomRepo, CourseFilter, CourseRepo, UserRepo};
use domains::{DomainError, Result};

use crate::notifications::{Notifier, OutboundEvent};
use crate::saga::Saga;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourseInput {
    pub title: String,
    pub description: String,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub syllabus: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub max_students: Option<u32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub schedule: Vec<ScheduleSlot>,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCourseInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub syllabus: Option<String>,
    pub tags: Option<Vec<String>>,
    pub thumbnail_url: Option<String>,
    pub max_students: Option<u32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub schedule: Option<Vec<ScheduleSlot>>,
    pub is_published: Option<bool>,
}

/// Result of an enrollment request. Paid courses answer with the amount due
/// and change nothing.
#[derive(Debug)]
pub enum EnrollOutcome {
    Enrolled(Course),
    PaymentRequired { amount: f64, currency: String },
}

pub struct CourseService {
    courses: Arc<dyn CourseRepo>,
    users: Arc<dyn UserRepo>,
    rooms: Arc<dyn ChatRoomRepo>,
    notifier: Arc<Notifier>,
}

impl CourseService {
    pub fn new(
        courses: Arc<dyn CourseRepo>,
        users: Arc<dyn UserRepo>,
        rooms: Arc<dyn ChatRoomRepo>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            courses,
            users,
            rooms,
            notifier,
        }
    }

    /// Published-catalog query; returns the page plus the total match count.
    pub async fn list(&self, filter: CourseFilter) -> Result<(Vec<Course>, u64)> {
        self.courses.list(&filter).await
    }

    /// Single course plus whether the (optional) viewer is enrolled.
    pub async fn get(&self, course_id: Uuid, viewer: Option<Uuid>) -> Result<(Course, bool)> {
        let course = self.require_course(course_id).await?;
        let is_enrolled = viewer.is_some_and(|id| course.is_enrolled(id));
        Ok((course, is_enrolled))
    }

    /// Creates the course and, best-effort, its group chat room. Only
    /// verified tutors (or admins) may create courses.
    pub async fn create(&self, tutor: &User, input: CreateCourseInput) -> Result<Course> {
        policy::require_role(tutor, Role::Tutor)?;
        if tutor.role == Role::Tutor && !tutor.verified_tutor {
            return Err(DomainError::forbidden(
                "Only verified tutors can create courses",
            ));
        }
        if input.title.trim().is_empty() || input.description.trim().is_empty() {
            return Err(DomainError::validation(
                "Please provide title and description",
            ));
        }

        let mut course = Course::new(input.title.trim().to_owned(), tutor.id);
        course.description = input.description;
        course.price = input.price.unwrap_or(0.0);
        course.currency = input.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_owned());
        course.category = input.category;
        course.level = input.level;
        course.syllabus = input.syllabus;
        course.tags = input.tags;
        course.thumbnail_url = input.thumbnail_url;
        course.max_students = input.max_students.unwrap_or(DEFAULT_MAX_STUDENTS);
        course.start_date = input.start_date;
        course.end_date = input.end_date;
        course.schedule = input.schedule;

        // 1. Pivot: persist the course itself.
        self.courses.insert(course.clone()).await?;

        // 2. Tail: group chat room with the tutor as room admin, then the
        //    back-reference on the course document.
        let mut saga = Saga::new("create_course");
        let room = ChatRoom::course_group(
            format!("{} - Group Chat", course.title),
            course.id,
            tutor.id,
        );
        let room_id = room.id;
        if saga
            .step("create_group_chat", self.rooms.insert(room).await)
            .is_some()
        {
            if saga
                .step(
                    "link_group_chat",
                    self.courses.set_group_chat(course.id, room_id).await,
                )
                .is_some()
            {
                course.group_chat_id = Some(room_id);
            }
        }
        let report = saga.finish();
        tracing::info!(
            course_id = %course.id,
            tutor_id = %tutor.id,
            complete = report.is_complete(),
            "course created"
        );
        Ok(course)
    }

    pub async fn update(
        &self,
        user: &User,
        course_id: Uuid,
        input: UpdateCourseInput,
    ) -> Result<Course> {
        let mut course = self.require_course(course_id).await?;
        policy::require_course_manager(user, &course)?;

        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(DomainError::validation("Title cannot be empty"));
            }
            course.title = title;
        }
        if let Some(description) = input.description {
            course.description = description;
        }
        if let Some(price) = input.price {
            if price < 0.0 {
                return Err(DomainError::validation("Price cannot be negative"));
            }
            course.price = price;
        }
        if let Some(currency) = input.currency {
            course.currency = currency;
        }
        if let Some(category) = input.category {
            course.category = Some(category);
        }
        if let Some(level) = input.level {
            course.level = Some(level);
        }
        if let Some(syllabus) = input.syllabus {
            course.syllabus = Some(syllabus);
        }
        if let Some(tags) = input.tags {
            course.tags = tags;
        }
        if let Some(thumbnail_url) = input.thumbnail_url {
            course.thumbnail_url = Some(thumbnail_url);
        }
        if let Some(max_students) = input.max_students {
            course.max_students = max_students;
        }
        if let Some(start_date) = input.start_date {
            course.start_date = Some(start_date);
        }
        if let Some(end_date) = input.end_date {
            course.end_date = Some(end_date);
        }
        if let Some(schedule) = input.schedule {
            course.schedule = schedule;
        }
        if let Some(is_published) = input.is_published {
            course.is_published = is_published;
        }
        course.updated_at = Utc::now();
        self.courses.update(&course).await?;
        Ok(course)
    }

    pub async fn delete(&self, user: &User, course_id: Uuid) -> Result<()> {
        let course = self.require_course(course_id).await?;
        policy::require_course_manager(user, &course)?;
        self.courses.delete(course_id).await?;
        tracing::info!(course_id = %course_id, user_id = %user.id, "course deleted");
        Ok(())
    }

    /// Enrollment entry point. Duplicate and capacity checks answer before
    /// the payment branch; a paid course mutates nothing. Free enrollment
    /// runs the membership saga.
    pub async fn enroll(&self, student: &User, course_id: Uuid) -> Result<EnrollOutcome> {
        let course = self.require_course(course_id).await?;

        if course.is_enrolled(student.id) {
            return Err(DomainError::AlreadyEnrolled);
        }
        if course.is_full() {
            return Err(DomainError::CourseFull);
        }
        if !course.is_free() {
            return Ok(EnrollOutcome::PaymentRequired {
                amount: course.price,
                currency: course.currency.clone(),
            });
        }

        // 1. Pivot: atomic membership append. The adapter re-checks the
        //    duplicate and capacity rules under the document lock.
        let course = self
            .courses
            .enroll_student(course_id, Enrollment::new(student.id))
            .await?;

        // 2. Tail: student's enrolled set, group chat membership, confirmation.
        let mut saga = Saga::new("enroll");
        saga.step(
            "add_to_enrolled_courses",
            self.users.add_enrolled_course(student.id, course_id).await,
        );
        if let Some(room_id) = course.group_chat_id {
            saga.step(
                "join_group_chat",
                self.rooms
                    .add_participant(room_id, Participant::new(student.id, ParticipantRole::Member))
                    .await,
            );
        }
        self.notifier
            .dispatch(OutboundEvent::EnrollmentConfirmed {
                student_id: student.id,
                course_id,
                course_title: course.title.clone(),
            })
            .await;
        let report = saga.finish();
        tracing::info!(
            course_id = %course_id,
            student_id = %student.id,
            complete = report.is_complete(),
            "student enrolled"
        );
        Ok(EnrollOutcome::Enrolled(course))
    }

    /// Per-student rating upsert; returns the recomputed average.
    pub async fn rate(
        &self,
        student: &User,
        course_id: Uuid,
        rating: u8,
        review: Option<String>,
    ) -> Result<f32> {
        if !(1..=5).contains(&rating) {
            return Err(DomainError::validation("Rating must be between 1 and 5"));
        }
        let course = self.require_course(course_id).await?;
        if !course.is_enrolled(student.id) {
            return Err(DomainError::forbidden(
                "You must be enrolled to rate this course",
            ));
        }
        self.courses
            .upsert_rating(
                course_id,
                Rating {
                    student_id: student.id,
                    rating,
                    review,
                    rated_at: Utc::now(),
                },
            )
            .await
    }

    /// Timetable, restricted to enrolled students, the tutor and admins.
    pub async fn schedule(&self, user: &User, course_id: Uuid) -> Result<(String, Vec<ScheduleSlot>)> {
        let course = self.require_course(course_id).await?;
        policy::require_course_access(user, &course)
            .map_err(|_| DomainError::forbidden("Not authorized to view this schedule"))?;
        Ok((course.title, course.schedule))
    }

    async fn require_course(&self, course_id: Uuid) -> Result<Course> {
        self.courses
            .find(course_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Course", course_id))
    }
}
