use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{info, warn};

use super::ModuleView;
use crate::api::{Body, FetchOptions, FormData, Method};
use crate::error::AppError;
use crate::models::Teacher;
use crate::resource::{Entity, Field, FieldKind, ResourceModule};
use crate::state::AppState;
use crate::ui::html::{escape, or_na};

impl Entity for Teacher {
    const BASE_PATH: &'static str = "/api/teachers";
    const KEY: &'static str = "teacher";
    const LABEL: &'static str = "Teacher";
    const PLURAL: &'static str = "teachers";
    const TITLE_KEY: &'static str = "teacher_list";
    const EMPTY_MESSAGE: &'static str = "No teachers found.";

    fn id(&self) -> i64 {
        self.id
    }

    fn columns() -> Vec<&'static str> {
        vec!["photo", "teacher_name", "teacher_email", "teacher_specialty"]
    }

    fn cells(&self, state: &AppState) -> Vec<String> {
        let photo = match self.photo_filename.as_deref() {
            Some(file) if !file.is_empty() => format!(
                r#"<img src="{}{}" alt="{}" class="photo-cell">"#,
                escape(&state.api.uploads_url()),
                escape(file),
                escape(&self.name)
            ),
            _ => r#"<div class="photo-cell-placeholder"></div>"#.to_string(),
        };
        vec![
            photo,
            format!(
                r##"<a href="#" class="link-teacher-profile" data-id="{}">{}</a>"##,
                self.id,
                escape(&self.name)
            ),
            escape(self.email.as_deref().unwrap_or("")),
            escape(self.specialty.as_deref().unwrap_or("")),
        ]
    }

    fn form_fields(_editing: bool) -> Vec<Field> {
        vec![
            Field::new("name", "teacher_name", FieldKind::Text).required(),
            Field::new("email", "teacher_email", FieldKind::Email).required(),
            Field::new("contact", "teacher_contact", FieldKind::Text).required(),
            Field::new("specialty", "teacher_specialty", FieldKind::Text),
            Field::new("hire_date", "teacher_hire_date", FieldKind::Date),
            Field::new("photo", "photo", FieldKind::File),
        ]
    }

    fn prefill(&self) -> FormData {
        FormData::new()
            .text("name", self.name.as_str())
            .text("email", self.email.clone().unwrap_or_default())
            .text("contact", self.contact.clone().unwrap_or_default())
            .text("specialty", self.specialty.clone().unwrap_or_default())
            .text(
                "hire_date",
                self.hire_date
                    .as_deref()
                    .map(|d| d.chars().take(10).collect::<String>())
                    .unwrap_or_default(),
            )
    }

    fn submit_request(id: Option<i64>, form: &FormData) -> Result<(Method, String, Body), AppError> {
        let body = Body::Multipart(form.clone());
        Ok(match id {
            Some(id) => (Method::Put, format!("{}/{}", Self::BASE_PATH, id), body),
            None => (Method::Post, Self::BASE_PATH.to_string(), body),
        })
    }
}

/// Teacher list with a read-only profile page.
pub struct TeacherModule {
    list: ResourceModule<Teacher>,
    profile: Mutex<Option<Teacher>>,
}

impl TeacherModule {
    pub fn new(state: AppState) -> Self {
        Self {
            list: ResourceModule::new(state),
            profile: Mutex::new(None),
        }
    }

    pub fn list(&self) -> &ResourceModule<Teacher> {
        &self.list
    }

    pub fn profile(&self) -> Option<Teacher> {
        self.profile.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_profile(&self, teacher: Option<Teacher>) {
        *self.profile.lock().unwrap_or_else(|e| e.into_inner()) = teacher;
    }

    pub async fn open_profile(&self, id: i64) -> bool {
        let state = self.list.state();
        let result = state
            .api
            .get_json::<Teacher>(&format!("/api/teachers/{}", id), FetchOptions::get(), "Teacher not found.")
            .await;
        match result {
            Ok(teacher) => {
                info!("opened profile of teacher {}", id);
                self.set_profile(Some(teacher));
                true
            }
            Err(e) => {
                warn!("teacher {} profile: {}", id, e);
                state.notifier.error(&e.user_message());
                self.set_profile(None);
                if !matches!(e, AppError::Unauthorized) {
                    self.list.load(1).await;
                }
                false
            }
        }
    }

    pub async fn back_to_list(&self) {
        self.set_profile(None);
        self.list.load(1).await;
    }

    fn render_profile(&self, teacher: &Teacher) -> String {
        let state = self.list.state();
        let t = state.t();
        let photo = match teacher.photo_filename.as_deref() {
            Some(file) if !file.is_empty() => format!(
                r#"<img src="{}{}" alt="{}" class="profile-photo-large">"#,
                escape(&state.api.uploads_url()),
                escape(file),
                escape(&teacher.name)
            ),
            _ => r#"<div class="profile-photo-large-placeholder"></div>"#.to_string(),
        };

        let classes = if teacher.assigned_classes.is_empty() {
            format!("<p>{}</p>", escape(t.get("no_classes_assigned")))
        } else {
            let rows: String = teacher
                .assigned_classes
                .iter()
                .map(|c| {
                    format!(
                        "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                        escape(&c.name),
                        escape(c.academic_year.as_deref().unwrap_or("")),
                        escape(or_na(c.subject_name.as_deref()))
                    )
                })
                .collect();
            format!(
                r#"<div class="table-responsive"><table class="profile-table"><thead><tr><th>{}</th><th>{}</th><th>{}</th></tr></thead><tbody>{}</tbody></table></div>"#,
                escape(t.get("class_name")),
                escape(t.get("academic_year")),
                escape(t.get("subject")),
                rows
            )
        };

        format!(
            concat!(
                r#"<div class="profile-header"><button id="back-to-list" class="btn">{back}</button><h2>{title}</h2></div>"#,
                r#"<div class="profile-container"><div class="profile-sidebar">{photo}<h3>{name}</h3><p><strong>{specialty_label}:</strong> {specialty}</p></div>"#,
                r#"<div class="profile-main"><table class="profile-table">"#,
                r#"<tr><td><strong>{email_label}:</strong></td><td>{email}</td></tr>"#,
                r#"<tr><td><strong>{contact_label}:</strong></td><td>{contact}</td></tr>"#,
                r#"<tr><td><strong>{hire_label}:</strong></td><td>{hire}</td></tr></table><hr>"#,
                r#"<h4>{classes_title}</h4>{classes}</div></div>"#
            ),
            back = escape(t.get("profile_back_to_list")),
            title = escape(t.get("teacher_profile_title")),
            photo = photo,
            name = escape(&teacher.name),
            specialty_label = escape(t.get("teacher_specialty")),
            specialty = escape(or_na(teacher.specialty.as_deref())),
            email_label = escape(t.get("teacher_email")),
            email = escape(teacher.email.as_deref().unwrap_or("")),
            contact_label = escape(t.get("teacher_contact")),
            contact = escape(teacher.contact.as_deref().unwrap_or("")),
            hire_label = escape(t.get("teacher_hire_date")),
            hire = escape(teacher.hire_date.as_deref().unwrap_or("")),
            classes_title = escape(t.get("assigned_classes")),
            classes = classes,
        )
    }

    pub fn render(&self) -> String {
        match self.profile() {
            Some(teacher) => self.render_profile(&teacher),
            None => self.list.render(),
        }
    }
}

#[async_trait]
impl ModuleView for TeacherModule {
    async fn open(&self) {
        self.list.load(1).await;
    }

    fn render(&self) -> String {
        TeacherModule::render(self)
    }
}
