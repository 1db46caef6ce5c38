use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::{ModuleView, fetch_all, subject_options, teacher_options};
use crate::api::dto::EnrollmentRequest;
use crate::api::{Body, FetchOptions, FormData, Method};
use crate::error::AppError;
use crate::models::{Class, EnrolledStudent, Student, Subject, Teacher};
use crate::resource::{Entity, Field, FieldKind, ResourceModule};
use crate::state::AppState;
use crate::ui::html::{escape, option, or_na};

fn id_or_null(raw: &str) -> Value {
    raw.trim().parse::<i64>().map(Value::from).unwrap_or(Value::Null)
}

impl Entity for Class {
    const BASE_PATH: &'static str = "/api/classes";
    const KEY: &'static str = "class";
    const LABEL: &'static str = "Class";
    const PLURAL: &'static str = "classes";
    const TITLE_KEY: &'static str = "module_academic";
    const EMPTY_MESSAGE: &'static str = "No classes found.";

    fn id(&self) -> i64 {
        self.id
    }

    fn columns() -> Vec<&'static str> {
        vec!["class_name", "academic_year", "teacher", "subject"]
    }

    fn cells(&self, _state: &AppState) -> Vec<String> {
        vec![
            escape(&self.name),
            escape(self.academic_year.as_deref().unwrap_or("")),
            escape(or_na(self.teacher_name.as_deref())),
            escape(or_na(self.subject_name.as_deref())),
        ]
    }

    fn form_fields(_editing: bool) -> Vec<Field> {
        vec![
            Field::new("name", "class_name", FieldKind::Text).required(),
            Field::new("academic_year", "academic_year", FieldKind::Text).required(),
            Field::new("teacher_id", "assign_teacher", FieldKind::Select),
            Field::new("subject_id", "assign_subject", FieldKind::Select),
        ]
    }

    fn prefill(&self) -> FormData {
        FormData::new()
            .text("name", self.name.as_str())
            .text("academic_year", self.academic_year.clone().unwrap_or_default())
            .text(
                "teacher_id",
                self.teacher_id.map(|id| id.to_string()).unwrap_or_default(),
            )
            .text(
                "subject_id",
                self.subject_id.map(|id| id.to_string()).unwrap_or_default(),
            )
    }

    /// Unassigned teacher/subject selections go out as `null`.
    fn submit_request(id: Option<i64>, form: &FormData) -> Result<(Method, String, Body), AppError> {
        let body = Body::Json(json!({
            "name": form.get("name"),
            "academic_year": form.get("academic_year"),
            "teacher_id": id_or_null(form.get("teacher_id")),
            "subject_id": id_or_null(form.get("subject_id")),
        }));
        Ok(match id {
            Some(id) => (Method::Put, format!("{}/{}", Self::BASE_PATH, id), body),
            None => (Method::Post, Self::BASE_PATH.to_string(), body),
        })
    }

    /// Every role may manage enrollments.
    fn extra_row_actions(&self, state: &AppState) -> String {
        format!(
            r#"<button class="btn btn-manage-students" data-id="{}">{}</button>"#,
            self.id,
            escape(state.t().get("manage_students"))
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    pub class_id: i64,
    pub class_name: String,
    pub enrolled: Vec<EnrolledStudent>,
    /// Students not yet in the class.
    pub available: Vec<Student>,
}

/// Class list plus the per-class enrollment manager.
pub struct ClassModule {
    list: ResourceModule<Class>,
    enrollment: Mutex<Option<Enrollment>>,
}

impl ClassModule {
    pub fn new(state: AppState) -> Self {
        Self {
            list: ResourceModule::new(state),
            enrollment: Mutex::new(None),
        }
    }

    pub fn list(&self) -> &ResourceModule<Class> {
        &self.list
    }

    fn state(&self) -> &AppState {
        self.list.state()
    }

    pub fn enrollment(&self) -> Option<Enrollment> {
        self.enrollment.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_enrollment(&self, enrollment: Option<Enrollment>) {
        *self.enrollment.lock().unwrap_or_else(|e| e.into_inner()) = enrollment;
    }

    /// Only a lost session is returned; other failures are reported here.
    async fn load_form_options(&self) -> Result<(), AppError> {
        let state = self.state();
        let api = &state.api;
        let result = tokio::try_join!(
            fetch_all::<Teacher>(api, "/api/teachers", "Failed to load teachers."),
            fetch_all::<Subject>(api, "/api/subjects", "Failed to load subjects."),
        );
        match result {
            Ok((teachers, subjects)) => {
                self.list.set_options("teacher_id", teacher_options(&teachers));
                self.list.set_options("subject_id", subject_options(&subjects));
            }
            Err(AppError::Unauthorized) => {
                state.notifier.error(&AppError::Unauthorized.user_message());
                return Err(AppError::Unauthorized);
            }
            Err(e) => {
                warn!("class form options: {}", e);
                state.notifier.error("Failed to load data for class form.");
            }
        }
        Ok(())
    }

    /// Opens the enrollment manager for one class.
    pub async fn manage_students(&self, class_id: i64) -> bool {
        let state = self.state();
        let api = &state.api;
        let enrolled_path = format!("/api/classes/{}/students", class_id);
        let result = tokio::try_join!(
            api.get_json::<Vec<EnrolledStudent>>(&enrolled_path, FetchOptions::get(), "Failed to load student data."),
            fetch_all::<Student>(api, "/api/students", "Failed to load student data."),
        );

        match result {
            Ok((enrolled, all_students)) => {
                let enrolled_ids: HashSet<i64> = enrolled.iter().map(|s| s.id).collect();
                let available = all_students
                    .into_iter()
                    .filter(|s| !enrolled_ids.contains(&s.id))
                    .collect();
                let class_name = self.list.find(class_id).map(|c| c.name).unwrap_or_default();
                self.set_enrollment(Some(Enrollment {
                    class_id,
                    class_name,
                    enrolled,
                    available,
                }));
                true
            }
            Err(e) => {
                warn!("enrollment manager for class {}: {}", class_id, e);
                state.notifier.error(&e.user_message());
                self.set_enrollment(None);
                false
            }
        }
    }

    pub async fn back_to_classes(&self) {
        self.set_enrollment(None);
        self.list.load(1).await;
    }

    pub async fn enroll(&self, student_id: i64) -> bool {
        let Some(class_id) = self.enrollment().map(|e| e.class_id) else {
            return false;
        };
        let body = match Body::json(&EnrollmentRequest {
            student_id,
            class_id,
        }) {
            Ok(body) => body,
            Err(e) => {
                self.state().notifier.error(&e.user_message());
                return false;
            }
        };
        self.enrollment_action(class_id, "/api/enrollments".to_string(), FetchOptions::post(body), "Student added to class.")
            .await
    }

    pub async fn remove_enrollment(&self, enrollment_id: i64) -> bool {
        let Some(class_id) = self.enrollment().map(|e| e.class_id) else {
            return false;
        };
        self.enrollment_action(
            class_id,
            format!("/api/enrollments/{}", enrollment_id),
            FetchOptions::delete(),
            "Student removed from class.",
        )
        .await
    }

    async fn enrollment_action(&self, class_id: i64, path: String, options: FetchOptions, success: &str) -> bool {
        let state = self.state();
        let result = state
            .api
            .fetch_with_auth(&path, options)
            .await
            .and_then(|response| response.into_result("Action failed"));
        match result {
            Ok(_) => {
                info!("enrollment change for class {} via {}", class_id, path);
                state.notifier.success(success);
                self.manage_students(class_id).await;
                true
            }
            Err(e) => {
                warn!("enrollment change {} failed: {}", path, e);
                state.notifier.error(&e.user_message());
                false
            }
        }
    }

    fn render_enrollment(&self, enrollment: &Enrollment) -> String {
        let t = self.state().t();
        let options: String = enrollment
            .available
            .iter()
            .map(|s| option(&s.id.to_string(), s.display_name(), false))
            .collect();
        let rows: String = if enrollment.enrolled.is_empty() {
            format!(
                r#"<tr><td colspan="3">{}</td></tr>"#,
                escape(t.get("no_students_in_class"))
            )
        } else {
            enrollment
                .enrolled
                .iter()
                .map(|s| {
                    format!(
                        r#"<tr><td>{}</td><td>{}</td><td><button class="btn btn-delete btn-remove-enroll" data-enroll-id="{}">{}</button></td></tr>"#,
                        escape(&s.name),
                        escape(s.contact.as_deref().unwrap_or("")),
                        s.enrollment_id,
                        escape(t.get("remove"))
                    )
                })
                .collect()
        };

        format!(
            concat!(
                r#"<div class="profile-header"><button id="back-to-classes" class="btn">{back}</button><h2>{manage}: {class}</h2></div>"#,
                r#"<div class="form-container"><h3>{add}</h3><div class="enroll-controls"><select id="student-to-enroll"><option value="">-- {select} --</option>{options}</select>"#,
                r#"<button id="btn-add-enroll" class="btn btn-submit">{add}</button></div></div>"#,
                r#"<div class="content-panel"><h3>{enrolled}</h3><div class="table-responsive"><table><thead><tr><th>{name}</th><th>{contact}</th><th>{actions}</th></tr></thead><tbody>{rows}</tbody></table></div></div>"#
            ),
            back = escape(t.get("back_to_classes")),
            manage = escape(t.get("manage_students")),
            class = escape(&enrollment.class_name),
            add = escape(t.get("add_student_to_class")),
            select = escape(t.get("please_select")),
            options = options,
            enrolled = escape(t.get("enrolled_students")),
            name = escape(t.get("student_name")),
            contact = escape(t.get("student_contact")),
            actions = escape(t.get("actions")),
            rows = rows,
        )
    }

    pub fn render(&self) -> String {
        match self.enrollment() {
            Some(enrollment) => self.render_enrollment(&enrollment),
            None => self.list.render(),
        }
    }
}

#[async_trait]
impl ModuleView for ClassModule {
    async fn open(&self) {
        if self.state().is_admin() && self.load_form_options().await.is_err() {
            return;
        }
        self.list.load(1).await;
    }

    fn render(&self) -> String {
        ClassModule::render(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unassigned_selects_become_null() {
        let form = FormData::new()
            .text("name", "Grade 5A")
            .text("academic_year", "2024-2025")
            .text("teacher_id", "3")
            .text("subject_id", "");
        let (method, path, body) = Class::submit_request(Some(9), &form).unwrap();
        assert_eq!((method, path.as_str()), (Method::Put, "/api/classes/9"));
        assert_eq!(
            body,
            Body::Json(json!({
                "name": "Grade 5A",
                "academic_year": "2024-2025",
                "teacher_id": 3,
                "subject_id": null
            }))
        );
    }
}
