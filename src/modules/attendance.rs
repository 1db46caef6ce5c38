use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{info, warn};

use super::{ModuleView, class_options, fetch_all};
use crate::api::{Body, FetchOptions};
use crate::download::export_to_file;
use crate::models::{
    AttendanceRecord, AttendanceSave, AttendanceStatus, Class, MonthlyReport, RosterEntry,
};
use crate::state::AppState;
use crate::ui::html::{escape, select};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttendanceView {
    #[default]
    Roster,
    Reports,
}

#[derive(Debug, Default)]
struct Roster {
    class_id: Option<i64>,
    date: String,
    entries: Vec<RosterEntry>,
    marks: HashMap<i64, AttendanceStatus>,
    loaded: bool,
}

#[derive(Debug, Default)]
struct Report {
    class_id: Option<i64>,
    month: String,
    data: Option<MonthlyReport>,
}

#[derive(Debug, Default)]
struct Inner {
    classes: Vec<Class>,
    view: AttendanceView,
    roster: Roster,
    report: Report,
}

/// Daily roll call per class plus the monthly report grid.
pub struct AttendanceModule {
    state: AppState,
    inner: Mutex<Inner>,
}

impl AttendanceModule {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn view(&self) -> AttendanceView {
        self.lock().view
    }

    pub fn classes(&self) -> Vec<Class> {
        self.lock().classes.clone()
    }

    pub fn roster(&self) -> Vec<RosterEntry> {
        self.lock().roster.entries.clone()
    }

    pub fn status_of(&self, student_id: i64) -> Option<AttendanceStatus> {
        self.lock().roster.marks.get(&student_id).copied()
    }

    pub fn report(&self) -> Option<MonthlyReport> {
        self.lock().report.data.clone()
    }

    async fn load_classes(&self) {
        match fetch_all::<Class>(&self.state.api, "/api/classes", "Failed to load classes.").await {
            Ok(classes) => self.lock().classes = classes,
            Err(e) => {
                warn!("attendance classes: {}", e);
                self.state.notifier.error("Failed to load classes.");
            }
        }
    }

    /// Fetches the roster of `class_id` for `date`. Students without a
    /// saved mark default to present.
    pub async fn load_roster(&self, class_id: Option<i64>, date: &str) -> bool {
        let Some(class_id) = class_id.filter(|_| !date.is_empty()) else {
            self.state.notifier.error("Please select a class and a date.");
            return false;
        };

        let path = format!("/api/classes/{}/attendance", class_id);
        let result = self
            .state
            .api
            .get_json::<Vec<RosterEntry>>(
                &path,
                FetchOptions::get().query("date", date),
                "Failed to load students.",
            )
            .await;

        match result {
            Ok(entries) => {
                info!("loaded {} roster rows for class {} on {}", entries.len(), class_id, date);
                let marks = entries
                    .iter()
                    .map(|e| (e.id, e.saved_status().unwrap_or_default()))
                    .collect();
                self.lock().roster = Roster {
                    class_id: Some(class_id),
                    date: date.to_string(),
                    entries,
                    marks,
                    loaded: true,
                };
                true
            }
            Err(e) => {
                warn!("attendance roster for class {}: {}", class_id, e);
                self.state.notifier.error(&e.user_message());
                let mut inner = self.lock();
                inner.roster.entries.clear();
                inner.roster.marks.clear();
                inner.roster.loaded = false;
                false
            }
        }
    }

    /// Returns false when the student is not on the loaded roster.
    pub fn set_status(&self, student_id: i64, status: AttendanceStatus) -> bool {
        let mut inner = self.lock();
        match inner.roster.marks.get_mut(&student_id) {
            Some(mark) => {
                *mark = status;
                true
            }
            None => false,
        }
    }

    /// Marks in roster order.
    pub fn records(&self) -> Vec<AttendanceRecord> {
        let inner = self.lock();
        inner
            .roster
            .entries
            .iter()
            .filter_map(|e| {
                inner.roster.marks.get(&e.id).map(|status| AttendanceRecord {
                    student_id: e.id,
                    status: *status,
                })
            })
            .collect()
    }

    pub async fn save(&self) -> bool {
        let (class_id, date) = {
            let inner = self.lock();
            (inner.roster.class_id, inner.roster.date.clone())
        };
        let Some(class_id) = class_id.filter(|_| !date.is_empty()) else {
            self.state.notifier.error("Please select a class and a date.");
            return false;
        };
        let records = self.records();
        if records.is_empty() {
            self.state.notifier.error("No attendance data to save.");
            return false;
        }

        let payload = AttendanceSave {
            date,
            class_id,
            records,
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
            .fetch_with_auth("/api/attendance", FetchOptions::post(body))
            .await
        {
            Ok(response) if response.ok() => {
                info!("saved {} attendance records for class {}", payload.records.len(), class_id);
                let message = response
                    .message()
                    .unwrap_or_else(|| "Attendance saved successfully!".to_string());
                self.state.notifier.success(&message);
                true
            }
            Ok(response) => {
                self.state
                    .notifier
                    .error(&response.error_message("Failed to save attendance."));
                false
            }
            Err(e) => {
                warn!("attendance save failed: {}", e);
                self.state.notifier.error(&e.user_message());
                false
            }
        }
    }

    pub fn show_reports(&self) {
        self.lock().view = AttendanceView::Reports;
    }

    pub fn back_to_attendance(&self) {
        self.lock().view = AttendanceView::Roster;
    }

    /// `month` is `YYYY-MM`.
    pub async fn generate_report(&self, class_id: Option<i64>, month: &str) -> bool {
        let Some(class_id) = class_id.filter(|_| !month.is_empty()) else {
            self.state.notifier.warning("Please select a class and a month.");
            return false;
        };

        let options = FetchOptions::get()
            .query("class_id", class_id)
            .query("month", month);
        let result = self
            .state
            .api
            .get_json::<MonthlyReport>("/api/attendance/report", options, "Failed to generate report.")
            .await;

        let data = match result {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("attendance report for class {} {}: {}", class_id, month, e);
                self.state.notifier.error(&e.user_message());
                None
            }
        };
        let ok = data.is_some();
        let mut inner = self.lock();
        inner.view = AttendanceView::Reports;
        inner.report = Report {
            class_id: Some(class_id),
            month: month.to_string(),
            data,
        };
        ok
    }

    pub async fn export_report(&self) -> Option<PathBuf> {
        let (class_id, month) = {
            let inner = self.lock();
            (inner.report.class_id, inner.report.month.clone())
        };
        let Some(class_id) = class_id.filter(|_| !month.is_empty()) else {
            self.state.notifier.warning("Please select a class and a month.");
            return None;
        };

        let options = FetchOptions::get()
            .query("class_id", class_id)
            .query("month", &month);
        export_to_file(
            &self.state.api,
            self.state.notifier.as_ref(),
            self.state.downloader.as_ref(),
            "/api/attendance/report/export",
            options,
            &format!("attendance_report_{}_{}.xlsx", class_id, month),
        )
        .await
    }

    fn render_roster(&self, inner: &Inner) -> String {
        let t = self.state.t();
        let selected = inner.roster.class_id.map(|id| id.to_string()).unwrap_or_default();
        let controls = format!(
            concat!(
                r#"<div class="attendance-controls">{select}"#,
                r#"<input type="date" id="attendance-date" value="{date}">"#,
                r#"<button id="btn-load-students" class="btn">{load}</button>"#,
                r#"<button id="btn-view-reports" class="btn">{reports}</button></div>"#
            ),
            select = select("class_id", t.get("select_class"), &class_options(&inner.classes), &selected),
            date = escape(&inner.roster.date),
            load = escape(t.get("load_students")),
            reports = escape(t.get("view_reports")),
        );

        let body = if !inner.roster.loaded {
            String::new()
        } else if inner.roster.entries.is_empty() {
            format!("<p>{}</p>", escape(t.get("no_students_in_class")))
        } else {
            let rows: String = inner
                .roster
                .entries
                .iter()
                .map(|entry| {
                    let current = inner.roster.marks.get(&entry.id).copied().unwrap_or_default();
                    let radios: String = AttendanceStatus::ALL
                        .iter()
                        .map(|status| {
                            format!(
                                r#"<label><input type="radio" name="status-{id}" value="{value}"{checked}> {label}</label>"#,
                                id = entry.id,
                                value = status.as_str(),
                                checked = if *status == current { " checked" } else { "" },
                                label = escape(t.get(status.as_str())),
                            )
                        })
                        .collect();
                    format!(
                        r#"<tr data-student-id="{}"><td>{}</td><td class="attendance-status">{}</td></tr>"#,
                        entry.id,
                        escape(&entry.name),
                        radios
                    )
                })
                .collect();
            format!(
                r#"<div class="table-responsive"><table><thead><tr><th>{}</th><th>{}</th></tr></thead><tbody>{}</tbody></table></div><button id="btn-save-attendance" class="btn btn-submit">{}</button>"#,
                escape(t.get("student_name")),
                escape(t.get("status")),
                rows,
                escape(t.get("save_attendance"))
            )
        };

        format!(
            r#"<h2>{}</h2>{}<div id="attendance-container" class="content-panel">{}</div>"#,
            escape(t.get("module_attendance")),
            controls,
            body
        )
    }

    fn render_grid(&self, report: &MonthlyReport) -> String {
        let t = self.state.t();
        let days = report.month_details.num_days;
        let header: String = (1..=days).map(|d| format!("<th>{}</th>", d)).collect();
        let rows: String = report
            .report_data
            .iter()
            .map(|student| {
                let cells: String = (1..=days)
                    .map(|day| match student.status_on(day) {
                        Some(status) => format!(
                            r#"<td style="color:{};">{}</td>"#,
                            status.color(),
                            status.letter()
                        ),
                        None => "<td></td>".to_string(),
                    })
                    .collect();
                format!("<tr><td>{}</td>{}</tr>", escape(&student.student_name), cells)
            })
            .collect();
        let legend: String = AttendanceStatus::ALL
            .iter()
            .map(|status| {
                format!(
                    r#"<span style="color:{};">{} = {}</span> "#,
                    status.color(),
                    status.letter(),
                    escape(t.get(status.as_str()))
                )
            })
            .collect();

        format!(
            concat!(
                r#"<div class="table-responsive"><table class="report-grid"><thead><tr><th>{name}</th>{header}</tr></thead>"#,
                r#"<tbody>{rows}</tbody></table></div><p class="legend"><strong>{legend_label}:</strong> {legend}</p>"#
            ),
            name = escape(t.get("student_name")),
            header = header,
            rows = rows,
            legend_label = escape(t.get("legend")),
            legend = legend.trim_end(),
        )
    }

    fn render_reports(&self, inner: &Inner) -> String {
        let t = self.state.t();
        let selected = inner.report.class_id.map(|id| id.to_string()).unwrap_or_default();
        let controls = format!(
            concat!(
                r#"<div class="report-controls">{select}"#,
                r#"<input type="month" id="report-month" value="{month}">"#,
                r#"<button id="btn-generate-report" class="btn btn-submit">{generate}</button>"#,
                r#"<button id="btn-export-report" class="btn">{export}</button></div>"#
            ),
            select = select("class_id", t.get("select_class"), &class_options(&inner.classes), &selected),
            month = escape(&inner.report.month),
            generate = escape(t.get("generate_report")),
            export = escape(t.get("export_excel")),
        );

        let body = match &inner.report.data {
            Some(report) if report.report_data.is_empty() => {
                format!("<p>{}</p>", escape(t.get("no_students_in_class")))
            }
            Some(report) => format!(
                "<h3>{} {}</h3>{}",
                escape(t.get("attendance_report_for")),
                escape(&inner.report.month),
                self.render_grid(report)
            ),
            None => String::new(),
        };

        format!(
            concat!(
                r#"<div class="profile-header"><button id="back-to-attendance" class="btn">{back}</button><h2>{title}</h2></div>"#,
                r#"{controls}<div id="report-container" class="content-panel">{body}</div>"#
            ),
            back = escape(t.get("back_to_attendance")),
            title = escape(t.get("attendance_reports")),
            controls = controls,
            body = body,
        )
    }

    pub fn render(&self) -> String {
        let inner = self.lock();
        match inner.view {
            AttendanceView::Roster => self.render_roster(&inner),
            AttendanceView::Reports => self.render_reports(&inner),
        }
    }
}

#[async_trait]
impl ModuleView for AttendanceModule {
    async fn open(&self) {
        self.load_classes().await;
    }

    fn render(&self) -> String {
        AttendanceModule::render(self)
    }
}
