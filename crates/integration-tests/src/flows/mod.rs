mod admin;
mod assignments;
mod chat;
mod courses;
mod notifications;
