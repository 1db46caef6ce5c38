use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{ModuleView, class_options, fetch_all};
use crate::api::{Body, FetchOptions, FormData, Method};
use crate::download::export_to_file;
use crate::error::AppError;
use crate::models::{Class, ExamType, ReportCard, Student, display_number};
use crate::resource::{Entity, Field, FieldKind, ResourceModule};
use crate::state::AppState;
use crate::ui::html::{error_paragraph, escape, option};

impl Entity for Student {
    const BASE_PATH: &'static str = "/api/students";
    const KEY: &'static str = "student";
    const LABEL: &'static str = "Student";
    const PLURAL: &'static str = "students";
    const TITLE_KEY: &'static str = "student_list";
    const EMPTY_MESSAGE: &'static str = "No students found.";

    fn id(&self) -> i64 {
        self.id
    }

    fn columns() -> Vec<&'static str> {
        vec![
            "photo",
            "student_name_km",
            "student_name_en",
            "student_name_jp",
            "class_name",
        ]
    }

    fn cells(&self, state: &AppState) -> Vec<String> {
        let photo = match self.photo_filename.as_deref() {
            Some(file) if !file.is_empty() => format!(
                r#"<img src="{}{}" alt="{}" class="photo-cell">"#,
                escape(&state.api.uploads_url()),
                escape(file),
                escape(self.display_name())
            ),
            _ => r#"<div class="photo-cell-placeholder"></div>"#.to_string(),
        };
        vec![
            photo,
            format!(
                r##"<a href="#" class="link-student-profile" data-id="{}">{}</a>"##,
                self.id,
                escape(self.name_km.as_deref().unwrap_or(""))
            ),
            escape(self.name_en.as_deref().unwrap_or("")),
            escape(self.name_jp.as_deref().unwrap_or("")),
            escape(self.class_name.as_deref().unwrap_or("N/A")),
        ]
    }

    fn form_fields(_editing: bool) -> Vec<Field> {
        vec![
            Field::new("name_km", "student_name_km", FieldKind::Text).required(),
            Field::new("name_en", "student_name_en", FieldKind::Text),
            Field::new("name_jp", "student_name_jp", FieldKind::Text),
            Field::new("dob", "student_dob", FieldKind::Date).required(),
            Field::new("contact", "student_contact", FieldKind::Text).required(),
            Field::new("address", "student_address", FieldKind::TextArea),
            Field::new("parent_name", "parent_name", FieldKind::Text),
            Field::new("parent_contact", "parent_contact", FieldKind::Text),
            Field::new("class_id", "assign_class", FieldKind::Select),
            Field::new("photo", "photo", FieldKind::File),
        ]
    }

    fn prefill(&self) -> FormData {
        FormData::new()
            .text("name_km", self.display_name())
            .text("name_en", self.name_en.clone().unwrap_or_default())
            .text("name_jp", self.name_jp.clone().unwrap_or_default())
            .text("dob", self.dob_date())
            .text("contact", self.contact.clone().unwrap_or_default())
            .text("address", self.address.clone().unwrap_or_default())
            .text("parent_name", self.parent_name.clone().unwrap_or_default())
            .text("parent_contact", self.parent_contact.clone().unwrap_or_default())
            .text(
                "class_id",
                self.class_id.map(|id| id.to_string()).unwrap_or_default(),
            )
    }

    /// Sent as multipart so a photo can ride along.
    fn submit_request(id: Option<i64>, form: &FormData) -> Result<(Method, String, Body), AppError> {
        let body = Body::Multipart(form.clone());
        Ok(match id {
            Some(id) => (Method::Put, format!("{}/{}", Self::BASE_PATH, id), body),
            None => (Method::Post, Self::BASE_PATH.to_string(), body),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Excel,
    Pdf,
}

impl ExportFormat {
    pub fn path_segment(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "excel",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportState {
    Empty,
    Loaded(ExamType, ReportCard),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StudentView {
    List,
    Profile { student: Student, report: ReportState },
}

/// Student list plus the profile page and its report card.
pub struct StudentModule {
    list: ResourceModule<Student>,
    view: Mutex<StudentView>,
}

impl StudentModule {
    pub fn new(state: AppState) -> Self {
        Self {
            list: ResourceModule::new(state),
            view: Mutex::new(StudentView::List),
        }
    }

    pub fn list(&self) -> &ResourceModule<Student> {
        &self.list
    }

    fn state(&self) -> &AppState {
        self.list.state()
    }

    pub fn view(&self) -> StudentView {
        self.view.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_view(&self, view: StudentView) {
        *self.view.lock().unwrap_or_else(|e| e.into_inner()) = view;
    }

    /// Class choices for the admin form.
    /// Only a lost session is returned; other failures are reported here.
    async fn load_class_options(&self) -> Result<(), AppError> {
        let state = self.state();
        match fetch_all::<Class>(&state.api, "/api/classes", "Failed to load classes for form.").await {
            Ok(classes) => self.list.set_options("class_id", class_options(&classes)),
            Err(AppError::Unauthorized) => {
                state.notifier.error(&AppError::Unauthorized.user_message());
                return Err(AppError::Unauthorized);
            }
            Err(e) => {
                warn!("class options: {}", e);
                state.notifier.error("Failed to load classes for form.");
            }
        }
        Ok(())
    }

    pub async fn open_profile(&self, id: i64) -> bool {
        let state = self.state();
        let result = state
            .api
            .get_json::<Student>(&format!("/api/students/{}", id), FetchOptions::get(), "Student not found.")
            .await;
        match result {
            Ok(student) => {
                info!("opened profile of student {}", id);
                self.set_view(StudentView::Profile {
                    student,
                    report: ReportState::Empty,
                });
                true
            }
            Err(e) => {
                warn!("student {} profile: {}", id, e);
                state.notifier.error(&e.user_message());
                if matches!(e, AppError::Unauthorized) {
                    self.set_view(StudentView::List);
                } else {
                    self.back_to_list().await;
                }
                false
            }
        }
    }

    pub async fn back_to_list(&self) {
        self.set_view(StudentView::List);
        self.list.load(1).await;
    }

    /// Report card of the profiled student for one exam.
    pub async fn generate_report_card(&self, exam: ExamType) -> bool {
        let student_id = match self.view() {
            StudentView::Profile { student, .. } => student.id,
            StudentView::List => return false,
        };

        let state = self.state();
        let result = state
            .api
            .get_json::<ReportCard>(
                &format!("/api/results/student-report/{}", student_id),
                FetchOptions::get().query("exam_type", exam.as_str()),
                "Failed to generate report card.",
            )
            .await;

        let (report, ok) = match result {
            Ok(card) => (ReportState::Loaded(exam, card), true),
            Err(e) => {
                let message = e.user_message();
                state.notifier.error(&message);
                (ReportState::Failed(message), false)
            }
        };
        if let StudentView::Profile { report: slot, .. } =
            &mut *self.view.lock().unwrap_or_else(|e| e.into_inner())
        {
            *slot = report;
        }
        ok
    }

    pub async fn export(&self, format: ExportFormat) -> Option<PathBuf> {
        let state = self.state();
        let lang = state.lang.code();
        export_to_file(
            &state.api,
            state.notifier.as_ref(),
            state.downloader.as_ref(),
            &format!("/api/students/export/{}", format.path_segment()),
            FetchOptions::get().query("lang", lang),
            &format!("students_export_{}.{}", lang, format.extension()),
        )
        .await
    }

    fn render_export_buttons(&self) -> String {
        let t = self.state().t();
        format!(
            r#"<div class="export-controls"><button id="btn-export-excel" class="btn">{}</button><button id="btn-export-pdf" class="btn">{}</button></div>"#,
            escape(t.get("export_excel")),
            escape(t.get("export_pdf"))
        )
    }

    fn render_profile(&self, student: &Student, report: &ReportState) -> String {
        let state = self.state();
        let t = state.t();
        let photo = match student.photo_filename.as_deref() {
            Some(file) if !file.is_empty() => format!(
                r#"<img src="{}{}" alt="{}" class="profile-photo-large">"#,
                escape(&state.api.uploads_url()),
                escape(file),
                escape(student.display_name())
            ),
            _ => r#"<div class="profile-photo-large-placeholder"></div>"#.to_string(),
        };
        let row = |label: &str, value: &str| {
            format!(
                "<tr><td><strong>{}</strong></td><td>{}</td></tr>",
                escape(label),
                escape(value)
            )
        };
        let exam_options: String = ExamType::ALL
            .iter()
            .map(|e| option(e.as_str(), e.as_str(), false))
            .collect();

        format!(
            concat!(
                r#"<div class="profile-header"><button id="back-to-list" class="btn">{back}</button><h2>{title}</h2></div>"#,
                r#"<div class="profile-container"><div class="profile-sidebar">{photo}<h3>{name}</h3><p><strong>{class_label}</strong> {class}</p></div>"#,
                r#"<div class="profile-main"><h4>{personal}</h4><table class="profile-table">{personal_rows}</table><hr>"#,
                r#"<h4>{parent}</h4><table class="profile-table">{parent_rows}</table><hr>"#,
                r#"<div class="form-container"><h3>{generate_title}</h3><div class="attendance-selector"><div class="form-group"><label>{exam_label}:</label><select id="exam-type-report-card">{exam_options}</select></div>"#,
                r#"<button id="btn-generate-report-card" class="btn btn-submit">{generate}</button></div></div>"#,
                r#"<div id="report-card-container">{report}</div></div></div>"#
            ),
            back = escape(t.get("profile_back_to_list")),
            title = escape(t.get("profile_title")),
            photo = photo,
            name = escape(student.display_name()),
            class_label = escape(t.get("profile_class")),
            class = escape(student.class_name.as_deref().unwrap_or(t.get("not_assigned"))),
            personal = escape(t.get("profile_personal_info")),
            personal_rows = [
                row("Name (EN):", student.name_en.as_deref().unwrap_or("")),
                row("Name (JP):", student.name_jp.as_deref().unwrap_or("")),
                row(&format!("{}:", t.get("student_dob")), &student.dob_date()),
                row(&format!("{}:", t.get("student_contact")), student.contact.as_deref().unwrap_or("")),
                row(&format!("{}:", t.get("student_address")), student.address.as_deref().unwrap_or("")),
            ]
            .concat(),
            parent = escape(t.get("profile_parent_info")),
            parent_rows = [
                row("Name:", student.parent_name.as_deref().unwrap_or("")),
                row("Contact:", student.parent_contact.as_deref().unwrap_or("")),
            ]
            .concat(),
            generate_title = escape(t.get("profile_generate_report")),
            exam_label = escape(t.get("exam_type")),
            exam_options = exam_options,
            generate = escape(t.get("generate")),
            report = self.render_report(report),
        )
    }

    fn render_report(&self, report: &ReportState) -> String {
        let t = self.state().t();
        let (exam, card) = match report {
            ReportState::Empty => return String::new(),
            ReportState::Failed(message) => return error_paragraph(message),
            ReportState::Loaded(exam, card) => (exam, card),
        };
        let info = &card.student_info;
        let opt = |v: &Option<String>| escape(v.as_deref().unwrap_or(""));

        let grade_rows = if card.grades.is_empty() {
            format!(
                r#"<tr><td colspan="2">{}</td></tr>"#,
                escape(t.get("report_card_no_grades"))
            )
        } else {
            card.grades
                .iter()
                .map(|g| {
                    format!(
                        "<tr><td>{}</td><td>{}</td></tr>",
                        escape(&g.subject_name),
                        g.score.map(display_number).unwrap_or_else(|| "N/A".to_string())
                    )
                })
                .collect()
        };
        let summary_row = |label: &str, value: String| {
            format!("<tr><td>{}</td><td>{}</td></tr>", escape(label), value)
        };
        let days = t.get("report_card_days");

        format!(
            concat!(
                r#"<div class="report-card" id="printable-report-card"><div class="report-card-header"><h3>{title}</h3><p>{year}</p></div>"#,
                r#"<div class="report-card-student-info"><div><p><strong>{name_label}</strong></p><div class="report-card-student-names">"#,
                r#"<div class="name-km">{km}</div><div class="name-en">{en}</div><div class="name-jp">{jp}</div></div>"#,
                r#"<p><strong>{dob_label}</strong> {dob}</p></div><div><p><strong>{class_label}</strong> {class}</p><p><strong>{teacher_label}</strong> {teacher}</p></div></div>"#,
                r#"<div class="report-card-body"><div class="report-card-section"><h4>{performance} ({exam})</h4><table><thead><tr><th>{subject}</th><th>{score}</th></tr></thead><tbody>{grade_rows}</tbody></table></div>"#,
                r#"<div class="report-card-section"><h4>{summary}</h4><table class="summary-table">{summary_rows}</table><hr><h4>{attendance}</h4><table class="summary-table">{attendance_rows}</table></div></div></div>"#
            ),
            title = escape(t.get("report_card_title")),
            year = opt(&info.academic_year),
            name_label = escape(t.get("report_card_student_name")),
            km = opt(&info.name_km),
            en = opt(&info.name_en),
            jp = opt(&info.name_jp),
            dob_label = escape(t.get("report_card_dob")),
            dob = opt(&info.dob),
            class_label = escape(t.get("report_card_class")),
            class = opt(&info.class_name),
            teacher_label = escape(t.get("report_card_teacher")),
            teacher = escape(info.teacher_name.as_deref().unwrap_or("N/A")),
            performance = escape(t.get("report_card_performance")),
            exam = exam,
            subject = escape(t.get("report_card_subject")),
            score = escape(t.get("report_card_score")),
            grade_rows = grade_rows,
            summary = escape(t.get("report_card_summary")),
            summary_rows = [
                summary_row(
                    t.get("report_card_total_score"),
                    card.total_score.map(display_number).unwrap_or_default()
                ),
                summary_row(
                    t.get("report_card_average"),
                    card.average.map(display_number).unwrap_or_default()
                ),
                summary_row(t.get("report_card_rank"), card.rank_label()),
                summary_row(
                    t.get("report_card_result"),
                    format!(
                        r#"<span class="result-summary-box {}">{}</span>"#,
                        if card.passed() { "result-pass" } else { "result-fail" },
                        escape(&card.result)
                    )
                ),
            ]
            .concat(),
            attendance = escape(t.get("report_card_attendance")),
            attendance_rows = [
                summary_row(t.get("report_card_present"), format!("{} {}", card.attendance.present, escape(days))),
                summary_row(t.get("report_card_absent"), format!("{} {}", card.attendance.absent, escape(days))),
                summary_row(t.get("report_card_late"), format!("{} {}", card.attendance.late, escape(days))),
            ]
            .concat(),
        )
    }

    pub fn render(&self) -> String {
        match self.view() {
            StudentView::List => self.list.render_with(&self.render_export_buttons()),
            StudentView::Profile { student, report } => self.render_profile(&student, &report),
        }
    }
}

#[async_trait]
impl ModuleView for StudentModule {
    async fn open(&self) {
        if self.state().is_admin() && self.load_class_options().await.is_err() {
            return;
        }
        self.list.load(1).await;
    }

    fn render(&self) -> String {
        StudentModule::render(self)
    }
}
