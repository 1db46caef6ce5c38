use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{ModuleView, class_options, fetch_all, subject_options, teacher_options};
use crate::api::{Body, FetchOptions};
use crate::download::export_to_file;
use crate::models::{Class, NewTimetableEntry, Subject, TIME_SLOTS, Teacher, TimetableEntry};
use crate::state::AppState;
use crate::ui::html::{error_paragraph, escape, option, select};

/// Form input for a new slot; the class comes from the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleInput {
    pub teacher_id: i64,
    pub subject_id: i64,
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Default)]
struct Inner {
    classes: Vec<Class>,
    teachers: Vec<Teacher>,
    subjects: Vec<Subject>,
    load_error: Option<String>,
    selected: Option<i64>,
    entries: Vec<TimetableEntry>,
}

/// Weekly schedule of one class.
pub struct TimetableModule {
    state: AppState,
    inner: Mutex<Inner>,
}

impl TimetableModule {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn selected_class(&self) -> Option<i64> {
        self.lock().selected
    }

    pub fn entries(&self) -> Vec<TimetableEntry> {
        self.lock().entries.clone()
    }

    /// Entries placed in the grid cell of `day_of_week` and slot `start`.
    pub fn entries_at(&self, day_of_week: u8, start: &str) -> Vec<TimetableEntry> {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.day_of_week == day_of_week && e.start_hhmm() == start)
            .cloned()
            .collect()
    }

    async fn load_options(&self) {
        let api = &self.state.api;
        let fallback = "Failed to load initial data for timetable.";
        let result = tokio::try_join!(
            fetch_all::<Class>(api, "/api/classes", fallback),
            fetch_all::<Teacher>(api, "/api/teachers", fallback),
            fetch_all::<Subject>(api, "/api/subjects", fallback),
        );
        let mut inner = self.lock();
        match result {
            Ok((classes, teachers, subjects)) => {
                inner.classes = classes;
                inner.teachers = teachers;
                inner.subjects = subjects;
                inner.load_error = None;
            }
            Err(e) => {
                warn!("timetable options: {}", e);
                self.state.notifier.error(fallback);
                inner.load_error = Some(fallback.to_string());
            }
        }
    }

    /// Selecting no class clears the grid.
    pub async fn select_class(&self, class_id: Option<i64>) -> bool {
        let Some(class_id) = class_id else {
            let mut inner = self.lock();
            inner.selected = None;
            inner.entries.clear();
            return true;
        };
        self.lock().selected = Some(class_id);

        let path = format!("/api/timetables/class/{}", class_id);
        match fetch_all::<TimetableEntry>(&self.state.api, &path, "Failed to load timetable.").await {
            Ok(entries) => {
                debug!("class {} has {} timetable entries", class_id, entries.len());
                let mut inner = self.lock();
                if inner.selected == Some(class_id) {
                    inner.entries = entries;
                }
                true
            }
            Err(e) => {
                warn!("timetable for class {}: {}", class_id, e);
                self.state.notifier.error(&e.user_message());
                self.lock().entries.clear();
                false
            }
        }
    }

    pub async fn add_entry(&self, input: ScheduleInput) -> bool {
        let Some(class_id) = self.selected_class() else {
            self.state.notifier.error("Please select a class first.");
            return false;
        };
        let payload = NewTimetableEntry {
            class_id,
            teacher_id: input.teacher_id,
            subject_id: input.subject_id,
            day_of_week: input.day_of_week,
            start_time: input.start_time,
            end_time: input.end_time,
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
            .fetch_with_auth("/api/timetables", FetchOptions::post(body))
            .await
        {
            Ok(response) if response.ok() => {
                info!("schedule entry added to class {}", class_id);
                self.state.notifier.success("Schedule added successfully!");
                self.select_class(Some(class_id)).await;
                true
            }
            Ok(_) => {
                self.state.notifier.error("Failed to save schedule.");
                false
            }
            Err(e) => {
                warn!("timetable add failed: {}", e);
                self.state.notifier.error("Failed to save schedule.");
                false
            }
        }
    }

    pub async fn delete_entry(&self, entry_id: i64) -> bool {
        if !self
            .state
            .prompt
            .confirm("Are you sure you want to delete this schedule entry?")
        {
            return false;
        }

        let path = format!("/api/timetables/{}", entry_id);
        match self.state.api.fetch_with_auth(&path, FetchOptions::delete()).await {
            Ok(response) if response.ok() => {
                info!("schedule entry {} deleted", entry_id);
                self.state.notifier.success("Deleted successfully.");
                let selected = self.selected_class();
                self.select_class(selected).await;
                true
            }
            Ok(_) => {
                self.state.notifier.error("Failed to delete.");
                false
            }
            Err(e) => {
                warn!("timetable delete {} failed: {}", entry_id, e);
                self.state.notifier.error("Failed to delete.");
                false
            }
        }
    }

    pub async fn export_pdf(&self) -> Option<PathBuf> {
        let (class_id, class_name) = {
            let inner = self.lock();
            let name = inner
                .selected
                .and_then(|id| inner.classes.iter().find(|c| c.id == id))
                .map(|c| c.name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "timetable".to_string());
            (inner.selected, name)
        };
        let Some(class_id) = class_id else {
            self.state.notifier.error("Please select a class first.");
            return None;
        };

        let options = FetchOptions::get()
            .query("class_id", class_id)
            .query("lang", self.state.lang.code());
        export_to_file(
            &self.state.api,
            self.state.notifier.as_ref(),
            self.state.downloader.as_ref(),
            "/api/timetables/export/pdf",
            options,
            &format!("{}_timetable.pdf", class_name),
        )
        .await
    }

    fn render_grid(&self, inner: &Inner) -> String {
        let t = self.state.t();
        let header: String = (1..=7u8)
            .map(|day| format!("<th>{}</th>", escape(t.weekday(day))))
            .collect();
        let body: String = TIME_SLOTS
            .iter()
            .map(|(start, end)| {
                let cells: String = (1..=7u8)
                    .map(|day| {
                        let entries: String = inner
                            .entries
                            .iter()
                            .filter(|e| e.day_of_week == day && e.start_hhmm() == *start)
                            .map(|e| {
                                format!(
                                    r#"<div class="schedule-entry"><strong>{}</strong><p>{}</p><button class="btn-delete-entry" data-id="{}">&times;</button></div>"#,
                                    escape(e.subject_name.as_deref().unwrap_or("")),
                                    escape(e.teacher_name.as_deref().unwrap_or("")),
                                    e.id
                                )
                            })
                            .collect();
                        format!(r#"<td data-day="{}" data-time="{}">{}</td>"#, day, start, entries)
                    })
                    .collect();
                format!(
                    r#"<tr><td class="time-slot-label">{} - {}</td>{}</tr>"#,
                    start, end, cells
                )
            })
            .collect();

        format!(
            r#"<div class="table-responsive"><table class="timetable-grid"><thead><tr><th>{}</th>{}</tr></thead><tbody>{}</tbody></table></div>"#,
            escape(t.get("timetable_header")),
            header,
            body
        )
    }

    fn render_add_form(&self, inner: &Inner) -> String {
        let t = self.state.t();
        let days: String = (1..=7u8)
            .map(|day| option(&day.to_string(), t.weekday(day), false))
            .collect();
        format!(
            concat!(
                r#"<div id="add-schedule-form-container" class="form-container"><h3>{title}</h3><form id="add-schedule-form">"#,
                r#"<div class="form-group"><label>{day}:</label><select name="day_of_week" required>{days}</select></div>"#,
                r#"<div class="form-group"><label>{start}:</label><input type="time" name="start_time" required></div>"#,
                r#"<div class="form-group"><label>{end}:</label><input type="time" name="end_time" required></div>"#,
                r#"<div class="form-group"><label>{subject}:</label>{subjects}</div>"#,
                r#"<div class="form-group"><label>{teacher}:</label>{teachers}</div>"#,
                r#"<button type="submit" class="btn btn-submit">{save}</button></form></div>"#
            ),
            title = escape(t.get("timetable_add_entry")),
            day = escape(t.get("day")),
            days = days,
            start = escape(t.get("start_time")),
            end = escape(t.get("end_time")),
            subject = escape(t.get("subject")),
            subjects = select("subject_id", t.get("please_select"), &subject_options(&inner.subjects), ""),
            teacher = escape(t.get("teacher")),
            teachers = select("teacher_id", t.get("please_select"), &teacher_options(&inner.teachers), ""),
            save = escape(t.get("save")),
        )
    }

    pub fn render(&self) -> String {
        let t = self.state.t();
        let inner = self.lock();
        if let Some(message) = &inner.load_error {
            return error_paragraph(message);
        }

        let selected = inner.selected.map(|id| id.to_string()).unwrap_or_default();
        let classes: Vec<(String, String)> = inner
            .classes
            .iter()
            .map(|c| (c.id.to_string(), c.name.clone()))
            .collect();
        let (actions, grid, form) = match inner.selected {
            Some(_) => (
                format!(
                    r#"<div id="timetable-actions"><button id="btn-export-timetable-pdf" class="btn">{}</button></div>"#,
                    escape(t.get("export_pdf"))
                ),
                self.render_grid(&inner),
                self.render_add_form(&inner),
            ),
            None => (
                String::new(),
                format!("<p>{}</p>", escape(t.get("timetable_select_class_hint"))),
                String::new(),
            ),
        };

        format!(
            concat!(
                r#"<h2>{title}</h2><div class="form-container"><div class="attendance-selector">"#,
                r#"<div class="form-group"><label>{label}:</label>{classes}</div>{actions}</div></div>"#,
                r#"<div id="timetable-grid-container" class="content-panel">{grid}</div>{form}"#
            ),
            title = escape(t.get("module_timetable")),
            label = escape(t.get("select_class")),
            classes = select("class_id", t.get("please_select"), &classes, &selected),
            actions = actions,
            grid = grid,
            form = form,
        )
    }
}

#[async_trait]
impl ModuleView for TimetableModule {
    async fn open(&self) {
        self.load_options().await;
    }

    fn render(&self) -> String {
        TimetableModule::render(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_keys_match_trimmed_start_times() {
        let entry = TimetableEntry {
            id: 1,
            day_of_week: 2,
            start_time: "08:00:00".to_string(),
            ..Default::default()
        };
        assert!(TIME_SLOTS.iter().any(|(start, _)| *start == entry.start_hhmm()));
    }
}
