//! # Notifications
//!
//! Domain workflows never talk to the notification store, mailer or realtime
//! gateway directly; they emit an [`OutboundEvent`] and the [`Notifier`]
//! executes the side effects. Every send is best-effort: persistence and push
//! failures are logged and swallowed, email is spawned off the request path
//! entirely.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use domains::models::{Notification, NotificationType, Priority, User};
use domains::ports::{Mailer, NotificationRepo, RealtimePush, UserRepo};
use domains::Result;

/// A side effect requested by a domain workflow.
#[derive(Debug, Clone)]
pub enum OutboundEvent {
    /// Free-course enrollment completed; confirm to the student.
    EnrollmentConfirmed {
        student_id: Uuid,
        course_id: Uuid,
        course_title: String,
    },
    /// New assignment published; fan out to every enrolled student,
    /// with a best-effort email per recipient.
    AssignmentPublished {
        course_id: Uuid,
        course_title: String,
        assignment_id: Uuid,
        assignment_title: String,
        recipients: Vec<Uuid>,
    },
    /// A student submitted; tell the owning tutor.
    SubmissionReceived {
        tutor_id: Uuid,
        course_id: Uuid,
        assignment_id: Uuid,
        assignment_title: String,
        student_name: String,
    },
    /// A submission was graded; tell the student.
    SubmissionGraded {
        student_id: Uuid,
        course_id: Uuid,
        assignment_id: Uuid,
        assignment_title: String,
    },
}

/// Executes outbound events: persist the notification, push to live
/// connections, email where the event calls for it. Honors each recipient's
/// notification settings.
pub struct Notifier {
    notifications: Arc<dyn NotificationRepo>,
    users: Arc<dyn UserRepo>,
    mailer: Arc<dyn Mailer>,
    push: Arc<dyn RealtimePush>,
}

impl Notifier {
    pub fn new(
        notifications: Arc<dyn NotificationRepo>,
        users: Arc<dyn UserRepo>,
        mailer: Arc<dyn Mailer>,
        push: Arc<dyn RealtimePush>,
    ) -> Self {
        Self {
            notifications,
            users,
            mailer,
            push,
        }
    }

    /// Never fails; every fallible edge inside is logged instead.
    pub async fn dispatch(&self, event: OutboundEvent) {
        match event {
            OutboundEvent::EnrollmentConfirmed {
                student_id,
                course_id,
                course_title,
            } => {
                let notification = Notification::new(
                    student_id,
                    NotificationType::CourseEnrollment,
                    "Course Enrollment Successful",
                    format!("You have successfully enrolled in {course_title}"),
                    json!({ "courseId": course_id }),
                    Priority::Normal,
                );
                self.persist_and_push(notification).await;
            }
            OutboundEvent::AssignmentPublished {
                course_id,
                course_title,
                assignment_id,
                assignment_title,
                recipients,
            } => {
                let students = match self.users.find_many(&recipients).await {
                    Ok(students) => students,
                    Err(e) => {
                        tracing::warn!(error = %e, "assignment fan-out recipient lookup failed");
                        return;
                    }
                };

                let notifications: Vec<Notification> = students
                    .iter()
                    .map(|student| {
                        Notification::new(
                            student.id,
                            NotificationType::NewAssignment,
                            "New Assignment Posted",
                            format!(
                                "New assignment \"{assignment_title}\" has been posted in {course_title}"
                            ),
                            json!({ "courseId": course_id, "assignmentId": assignment_id }),
                            Priority::High,
                        )
                    })
                    .collect();

                // One batch insert; a failed batch is not retried per recipient.
                if let Err(e) = self.notifications.insert_many(notifications.clone()).await {
                    tracing::warn!(error = %e, "assignment fan-out insert failed");
                    return;
                }

                for (student, notification) in students.iter().zip(&notifications) {
                    if student.settings.push_enabled {
                        self.push.push_notification(notification);
                    }
                    self.spawn_email(
                        student,
                        "New Assignment Posted",
                        format!(
                            "Hi {},\n\nA new assignment \"{}\" has been posted in {}. \
                             It is due on {}.\n",
                            student.name,
                            assignment_title,
                            course_title,
                            notification.created_at.format("%Y-%m-%d")
                        ),
                    );
                }
            }
            OutboundEvent::SubmissionReceived {
                tutor_id,
                course_id,
                assignment_id,
                assignment_title,
                student_name,
            } => {
                let notification = Notification::new(
                    tutor_id,
                    NotificationType::System,
                    "New Assignment Submission",
                    format!("{student_name} submitted \"{assignment_title}\""),
                    json!({ "courseId": course_id, "assignmentId": assignment_id }),
                    Priority::Normal,
                );
                self.persist_and_push(notification).await;
            }
            OutboundEvent::SubmissionGraded {
                student_id,
                course_id,
                assignment_id,
                assignment_title,
            } => {
                let notification = Notification::new(
                    student_id,
                    NotificationType::AssignmentGraded,
                    "Assignment Graded",
                    format!("Your submission for \"{assignment_title}\" has been graded"),
                    json!({ "assignmentId": assignment_id, "courseId": course_id }),
                    Priority::High,
                );
                self.persist_and_push(notification).await;
            }
        }
    }

    async fn persist_and_push(&self, notification: Notification) {
        if let Err(e) = self.notifications.insert(notification.clone()).await {
            tracing::warn!(
                user_id = %notification.user_id,
                error = %e,
                "notification insert failed"
            );
            return;
        }
        match self.users.find(notification.user_id).await {
            Ok(Some(user)) if !user.settings.push_enabled => {}
            Ok(_) => self.push.push_notification(&notification),
            Err(e) => {
                tracing::warn!(user_id = %notification.user_id, error = %e, "push settings lookup failed");
                self.push.push_notification(&notification);
            }
        }
    }

    /// Fire-and-forget email, off the request path.
    fn spawn_email(&self, recipient: &User, subject: &'static str, body: String) {
        if !recipient.settings.email_enabled {
            return;
        }
        let mailer = Arc::clone(&self.mailer);
        let to = recipient.email.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&to, subject, &body).await {
                tracing::warn!(recipient = %to, error = %e, "notification email failed");
            }
        });
    }
}

/// Read/mark API over a user's own notifications.
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepo>,
}

impl NotificationService {
    pub fn new(notifications: Arc<dyn NotificationRepo>) -> Self {
        Self { notifications }
    }

    pub async fn list(&self, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>> {
        self.notifications.list_for_user(user_id, unread_only).await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<u64> {
        self.notifications.unread_count(user_id).await
    }

    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        self.notifications.mark_read(id, user_id).await
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        self.notifications.mark_all_read(user_id).await
    }
}
