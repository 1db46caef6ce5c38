use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{info, warn};

use super::{ModuleView, class_options, fetch_all, subject_options};
use crate::api::{Body, FetchOptions};
use crate::download::export_to_file;
use crate::models::{
    Class, ExamType, GradeEntry, GradeExport, GradeExportRow, GradeRow, GradeSave, Subject,
    display_number,
};
use crate::state::AppState;
use crate::ui::html::{escape, option, select};

/// The four inputs that identify one grade sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetKey {
    pub class_id: i64,
    pub subject_id: i64,
    pub exam_type: ExamType,
    pub grade_date: String,
}

#[derive(Debug, Default)]
struct Inner {
    classes: Vec<Class>,
    subjects: Vec<Subject>,
    sheet: Option<SheetKey>,
    rows: Vec<GradeRow>,
    /// Raw score input per student; empty means no grade.
    scores: HashMap<i64, String>,
}

pub struct GradeModule {
    state: AppState,
    inner: Mutex<Inner>,
}

impl GradeModule {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn sheet(&self) -> Option<SheetKey> {
        self.lock().sheet.clone()
    }

    pub fn rows(&self) -> Vec<GradeRow> {
        self.lock().rows.clone()
    }

    pub fn score_of(&self, student_id: i64) -> Option<String> {
        self.lock().scores.get(&student_id).cloned()
    }

    async fn load_options(&self) {
        let api = &self.state.api;
        let result = tokio::try_join!(
            fetch_all::<Class>(api, "/api/classes", "Failed to load classes."),
            fetch_all::<Subject>(api, "/api/subjects", "Failed to load subjects."),
        );
        match result {
            Ok((classes, subjects)) => {
                let mut inner = self.lock();
                inner.classes = classes;
                inner.subjects = subjects;
            }
            Err(e) => {
                warn!("gradebook options: {}", e);
                self.state.notifier.error("Failed to load classes or subjects.");
            }
        }
    }

    pub async fn load_sheet(
        &self,
        class_id: Option<i64>,
        subject_id: Option<i64>,
        exam_type: Option<ExamType>,
        grade_date: &str,
    ) -> bool {
        let (Some(class_id), Some(subject_id), Some(exam_type)) = (class_id, subject_id, exam_type)
        else {
            self.state.notifier.warning("Please select all fields to load students.");
            return false;
        };
        if grade_date.is_empty() {
            self.state.notifier.warning("Please select all fields to load students.");
            return false;
        }

        let options = FetchOptions::get()
            .query("class_id", class_id)
            .query("subject_id", subject_id)
            .query("exam_type", exam_type)
            .query("grade_date", grade_date);
        let result = self
            .state
            .api
            .get_json::<Vec<GradeRow>>("/api/grades/class-view", options, "Failed to load students.")
            .await;

        match result {
            Ok(rows) => {
                info!("loaded grade sheet for class {} subject {} ({} rows)", class_id, subject_id, rows.len());
                let scores = rows
                    .iter()
                    .map(|r| (r.student_id, r.score.map(display_number).unwrap_or_default()))
                    .collect();
                let mut inner = self.lock();
                inner.sheet = Some(SheetKey {
                    class_id,
                    subject_id,
                    exam_type,
                    grade_date: grade_date.to_string(),
                });
                inner.rows = rows;
                inner.scores = scores;
                true
            }
            Err(e) => {
                warn!("grade sheet load failed: {}", e);
                self.state.notifier.error(&e.user_message());
                let mut inner = self.lock();
                inner.sheet = None;
                inner.rows.clear();
                inner.scores.clear();
                false
            }
        }
    }

    /// Returns false when the student is not on the loaded sheet.
    pub fn set_score(&self, student_id: i64, raw: &str) -> bool {
        let mut inner = self.lock();
        match inner.scores.get_mut(&student_id) {
            Some(score) => {
                *score = raw.trim().to_string();
                true
            }
            None => false,
        }
    }

    fn entries(inner: &Inner) -> Vec<GradeEntry> {
        inner
            .rows
            .iter()
            .map(|r| GradeEntry {
                student_id: r.student_id,
                score: inner.scores.get(&r.student_id).cloned().unwrap_or_default(),
            })
            .collect()
    }

    pub async fn save(&self) -> bool {
        let payload = {
            let inner = self.lock();
            inner.sheet.as_ref().map(|sheet| GradeSave {
                class_id: sheet.class_id,
                subject_id: sheet.subject_id,
                exam_type: sheet.exam_type.to_string(),
                grade_date: sheet.grade_date.clone(),
                grades: Self::entries(&inner),
            })
        };
        let Some(payload) = payload else {
            self.state.notifier.warning("Please load a grade sheet first.");
            return false;
        };
        let body = match Body::json(&payload) {
            Ok(body) => body,
            Err(e) => {
                self.state.notifier.error(&e.user_message());
                return false;
            }
        };

        match self
            .state
            .api
            .fetch_with_auth("/api/grades", FetchOptions::post(body))
            .await
        {
            Ok(response) if response.ok() => {
                info!("saved {} grades for class {}", payload.grades.len(), payload.class_id);
                let message = response
                    .message()
                    .unwrap_or_else(|| "Grades saved successfully!".to_string());
                self.state.notifier.success(&message);
                true
            }
            Ok(response) => {
                self.state
                    .notifier
                    .error(&response.error_message("Failed to save grades."));
                false
            }
            Err(e) => {
                warn!("grade save failed: {}", e);
                self.state.notifier.error(&e.user_message());
                false
            }
        }
    }

    pub async fn export(&self) -> Option<PathBuf> {
        let payload = {
            let inner = self.lock();
            inner.sheet.as_ref().map(|sheet| {
                let class_name = inner
                    .classes
                    .iter()
                    .find(|c| c.id == sheet.class_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_default();
                let subject_name = inner
                    .subjects
                    .iter()
                    .find(|s| s.id == sheet.subject_id)
                    .map(|s| s.name.clone())
                    .unwrap_or_default();
                let grades = inner
                    .rows
                    .iter()
                    .map(|r| GradeExportRow {
                        student_id: r.student_id,
                        student_name_km: r.student_name_km.clone(),
                        student_name_en: r.student_name_en.clone(),
                        score: inner.scores.get(&r.student_id).cloned().unwrap_or_default(),
                    })
                    .collect();
                GradeExport {
                    grades,
                    class_name,
                    subject_name,
                    exam_type: sheet.exam_type.to_string(),
                    lang: self.state.lang.code().to_string(),
                }
            })
        };
        let Some(payload) = payload else {
            self.state.notifier.warning("Please load a grade sheet first.");
            return None;
        };
        let body = match Body::json(&payload) {
            Ok(body) => body,
            Err(e) => {
                self.state.notifier.error(&e.user_message());
                return None;
            }
        };

        export_to_file(
            &self.state.api,
            self.state.notifier.as_ref(),
            self.state.downloader.as_ref(),
            "/api/grades/export/excel",
            FetchOptions::post(body),
            &format!("Grade_Sheet_{}.xlsx", payload.class_name),
        )
        .await
    }

    fn render_sheet(&self, inner: &Inner) -> String {
        let t = self.state.t();
        if inner.sheet.is_none() {
            return String::new();
        }
        if inner.rows.is_empty() {
            return format!("<p>{}</p>", escape(t.get("no_students_in_class")));
        }

        let rows: String = inner
            .rows
            .iter()
            .map(|r| {
                format!(
                    r#"<tr data-student-id="{id}"><td>{km}</td><td>{en}</td><td><input type="number" class="score-input" data-student-id="{id}" min="0" max="100" value="{score}"></td></tr>"#,
                    id = r.student_id,
                    km = escape(r.student_name_km.as_deref().unwrap_or("")),
                    en = escape(r.student_name_en.as_deref().unwrap_or("")),
                    score = escape(inner.scores.get(&r.student_id).map(String::as_str).unwrap_or("")),
                )
            })
            .collect();

        format!(
            concat!(
                r#"<div class="table-responsive"><table><thead><tr><th>{km}</th><th>{en}</th><th>{score}</th></tr></thead><tbody>{rows}</tbody></table></div>"#,
                r#"<div class="page-actions"><button id="btn-save-grades" class="btn btn-submit">{save}</button>"#,
                r#"<button id="btn-export-grades" class="btn">{export}</button></div>"#
            ),
            km = escape(t.get("student_name_km")),
            en = escape(t.get("student_name_en")),
            score = escape(t.get("report_card_score")),
            rows = rows,
            save = escape(t.get("save_grades")),
            export = escape(t.get("export_excel")),
        )
    }

    pub fn render(&self) -> String {
        let t = self.state.t();
        let inner = self.lock();
        let sheet = inner.sheet.as_ref();
        let class_selected = sheet.map(|s| s.class_id.to_string()).unwrap_or_default();
        let subject_selected = sheet.map(|s| s.subject_id.to_string()).unwrap_or_default();
        let exam_options: String = ExamType::ALL
            .iter()
            .map(|e| option(e.as_str(), e.as_str(), sheet.is_some_and(|s| s.exam_type == *e)))
            .collect();

        format!(
            concat!(
                r#"<h2>{title}</h2><div class="gradebook-controls">{classes}{subjects}"#,
                r#"<select name="exam_type"><option value="">-- {exam} --</option>{exam_options}</select>"#,
                r#"<input type="date" id="grade-date" value="{date}">"#,
                r#"<button id="btn-load-grades" class="btn">{load}</button></div>"#,
                r#"<div id="gradebook-container" class="content-panel">{sheet}</div>"#
            ),
            title = escape(t.get("module_gradebook")),
            classes = select("class_id", t.get("select_class"), &class_options(&inner.classes), &class_selected),
            subjects = select("subject_id", t.get("select_subject"), &subject_options(&inner.subjects), &subject_selected),
            exam = escape(t.get("exam_type")),
            exam_options = exam_options,
            date = escape(sheet.map(|s| s.grade_date.as_str()).unwrap_or("")),
            load = escape(t.get("load_students")),
            sheet = self.render_sheet(&inner),
        )
    }
}

#[async_trait]
impl ModuleView for GradeModule {
    async fn open(&self) {
        self.load_options().await;
    }

    fn render(&self) -> String {
        GradeModule::render(self)
    }
}
