//! # Seed
//!
//! Writes a demo snapshot the server boots from: a few accounts, two courses
//! with a group chat, an assignment, notifications and a feed post. Every
//! account uses the password `password123`; local use only.

use chrono::{Duration, Utc};
use serde_json::json;

use auth_adapters::Argon2Hasher;
use configs::Settings;
use domains::models::{
    Assignment, ChatRoom, Course, CourseLevel, Enrollment, Notification, NotificationType,
    Participant, ParticipantRole, Post, Priority, Role, ScheduleSlot, User,
};
use domains::ports::{
    AssignmentRepo, ChatRoomRepo, CourseRepo, CredentialHasher, NotificationRepo, PostRepo,
    UserRepo,
};
use storage_adapters::MemoryDocumentStore;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let settings = Settings::load()?;
    let store = MemoryDocumentStore::new();
    let hasher = Argon2Hasher::new();
    let password = hasher.hash("password123")?;

    // Accounts
    let admin = User::new(
        "Amara Okafor".to_owned(),
        "admin@edubridge.dev".to_owned(),
        password.clone(),
        Role::Admin,
    );
    let mut tutor = User::new(
        "Jonas Weber".to_owned(),
        "tutor@edubridge.dev".to_owned(),
        password.clone(),
        Role::Tutor,
    );
    tutor.verified_tutor = true;
    tutor.bio = Some("Systems programmer, ten years of production Rust.".to_owned());
    let student = User::new(
        "Priya Sharma".to_owned(),
        "student@edubridge.dev".to_owned(),
        password.clone(),
        Role::Student,
    );
    let second_student = User::new(
        "Tunde Adeyemi".to_owned(),
        "tunde@edubridge.dev".to_owned(),
        password,
        Role::Student,
    );
    for user in [&admin, &tutor, &student, &second_student] {
        UserRepo::insert(&store, user.clone()).await?;
    }

    // A free course with a timetable, and a paid one that exercises the
    // payment-required enrollment path.
    let mut rust_course = Course::new("Practical Rust".to_owned(), tutor.id);
    rust_course.description =
        "Ownership, borrowing and fearless concurrency, built up from zero.".to_owned();
    rust_course.category = Some("programming".to_owned());
    rust_course.level = Some(CourseLevel::Beginner);
    rust_course.tags = vec!["rust".to_owned(), "systems".to_owned()];
    rust_course.schedule = vec![
        ScheduleSlot {
            day: "monday".to_owned(),
            start_time: "18:00".to_owned(),
            end_time: "19:30".to_owned(),
            topic: Some("Ownership and borrowing".to_owned()),
        },
        ScheduleSlot {
            day: "thursday".to_owned(),
            start_time: "18:00".to_owned(),
            end_time: "19:30".to_owned(),
            topic: Some("Traits and generics".to_owned()),
        },
    ];
    rust_course.start_date = Some(Utc::now());
    rust_course.end_date = Some(Utc::now() + Duration::weeks(8));

    let mut data_course = Course::new("Advanced Data Engineering".to_owned(), tutor.id);
    data_course.description = "Pipelines, storage layouts and query engines.".to_owned();
    data_course.category = Some("data".to_owned());
    data_course.level = Some(CourseLevel::Advanced);
    data_course.price = 15000.0;

    let room = ChatRoom::course_group(
        format!("{} - Group Chat", rust_course.title),
        rust_course.id,
        tutor.id,
    );
    rust_course.group_chat_id = Some(room.id);
    CourseRepo::insert(&store, rust_course.clone()).await?;
    CourseRepo::insert(&store, data_course.clone()).await?;
    ChatRoomRepo::insert(&store, room.clone()).await?;

    // Enroll both students in the free course
    for learner in [&student, &second_student] {
        store
            .enroll_student(rust_course.id, Enrollment::new(learner.id))
            .await?;
        store.add_enrolled_course(learner.id, rust_course.id).await?;
        store
            .add_participant(room.id, Participant::new(learner.id, ParticipantRole::Member))
            .await?;
    }

    // Coursework, due in two weeks, late submissions at a 20% penalty
    let assignment = Assignment {
        id: Uuid::new_v4(),
        course_id: rust_course.id,
        title: "Ownership Basics".to_owned(),
        description: "Model a small inventory without cloning your way out.".to_owned(),
        instructions: Some("Submit a single .rs file or paste the code as text.".to_owned()),
        due_date: Utc::now() + Duration::weeks(2),
        max_score: 100,
        allow_late_submission: true,
        late_submission_penalty: 20,
        rubric: Some(json!({
            "correctness": 60,
            "idiomatic_style": 25,
            "documentation": 15,
        })),
        is_published: true,
        created_at: Utc::now(),
    };
    AssignmentRepo::insert(&store, assignment.clone()).await?;

    store
        .insert_many(
            [&student, &second_student]
                .into_iter()
                .map(|learner| {
                    Notification::new(
                        learner.id,
                        NotificationType::System,
                        "Welcome to EduBridge",
                        "Your demo account is ready. Have a look around!",
                        json!({}),
                        Priority::Low,
                    )
                })
                .collect(),
        )
        .await?;

    PostRepo::insert(
        &store,
        Post::new(
            student.id,
            "Week one of Practical Rust done. The borrow checker and I are not friends yet."
                .to_owned(),
            None,
        ),
    )
    .await?;

    store.save(&settings.storage.snapshot_path).await?;
    tracing::info!(
        path = %settings.storage.snapshot_path,
        users = 4,
        courses = 2,
        "seed snapshot written"
    );
    tracing::info!("sign in with admin@edubridge.dev / password123 (or tutor@ / student@)");
    Ok(())
}
