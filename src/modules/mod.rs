pub mod announcement;
pub mod attendance;
pub mod class;
pub mod dashboard;
pub mod grade;
pub mod student;
pub mod subject;
pub mod teacher;
pub mod timetable;
pub mod user;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::api::dto::ListPayload;
use crate::api::{ApiClient, FetchOptions};
use crate::error::AppError;
use crate::models::{Class, Subject, Teacher};
use crate::resource::SelectOptions;

pub use announcement::AnnouncementModule;
pub use attendance::AttendanceModule;
pub use class::ClassModule;
pub use dashboard::DashboardModule;
pub use grade::GradeModule;
pub use student::StudentModule;
pub use subject::SubjectModule;
pub use teacher::TeacherModule;
pub use timetable::TimetableModule;
pub use user::UserModule;

/// A page the shell can open and render into the content area.
#[async_trait]
pub trait ModuleView: Send + Sync {
    /// Fetches whatever the page needs. Failures are reported through the
    /// notifier and reflected in the rendered output.
    async fn open(&self);

    fn render(&self) -> String;
}

/// GET a list endpoint that may answer either a bare array or a page.
pub async fn fetch_all<T: DeserializeOwned>(
    api: &ApiClient,
    path: &str,
    fallback: &str,
) -> Result<Vec<T>, AppError> {
    let payload: ListPayload<T> = api.get_json(path, FetchOptions::get(), fallback).await?;
    Ok(payload.into_vec())
}

pub fn class_options(classes: &[Class]) -> SelectOptions {
    classes.iter().map(|c| (c.id.to_string(), c.label())).collect()
}

pub fn teacher_options(teachers: &[Teacher]) -> SelectOptions {
    teachers.iter().map(|t| (t.id.to_string(), t.name.clone())).collect()
}

pub fn subject_options(subjects: &[Subject]) -> SelectOptions {
    subjects.iter().map(|s| (s.id.to_string(), s.name.clone())).collect()
}
