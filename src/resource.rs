use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::api::dto::{ListPayload, Paginated};
use crate::api::{Body, FetchOptions, FormData, Method};
use crate::debounce::Debouncer;
use crate::error::AppError;
use crate::i18n::Translations;
use crate::modules::ModuleView;
use crate::state::AppState;
use crate::ui::html::{escape, error_paragraph, select};
use crate::ui::{loader, render_pagination};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Password,
    Date,
    TextArea,
    Select,
    File,
    Checkbox,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    /// Translation key, or literal text when no entry exists.
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl Field {
    pub fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

pub type SelectOptions = Vec<(String, String)>;

/// Describes one server-paged CRUD resource.
pub trait Entity: DeserializeOwned + Clone + Send + Sync + 'static {
    const BASE_PATH: &'static str;
    /// Lowercase name used in element ids and translation keys.
    const KEY: &'static str;
    /// Capitalised name used in notifications.
    const LABEL: &'static str;
    const PLURAL: &'static str;
    const TITLE_KEY: &'static str;
    const EMPTY_MESSAGE: &'static str;
    const SEARCHABLE: bool = true;

    fn id(&self) -> i64;

    /// Header translation keys, without the actions column.
    fn columns() -> Vec<&'static str>;

    /// Already-escaped cell markup, one per column.
    fn cells(&self, state: &AppState) -> Vec<String>;

    fn form_fields(editing: bool) -> Vec<Field>;

    fn prefill(&self) -> FormData;

    fn select_options(_field: &str) -> Option<SelectOptions> {
        None
    }

    /// JSON body by default: POST to the collection, PUT to the item.
    fn submit_request(id: Option<i64>, form: &FormData) -> Result<(Method, String, Body), AppError> {
        let body = Body::Json(form.to_json());
        Ok(match id {
            Some(id) => (Method::Put, format!("{}/{}", Self::BASE_PATH, id), body),
            None => (Method::Post, Self::BASE_PATH.to_string(), body),
        })
    }

    fn saved_message(editing: bool, _server_message: Option<String>) -> String {
        if editing {
            format!("{} updated successfully!", Self::LABEL)
        } else {
            format!("{} added successfully!", Self::LABEL)
        }
    }

    fn accessible(_state: &AppState) -> bool {
        true
    }

    fn access_denied_message() -> &'static str {
        "Access Denied."
    }

    /// Whether the create/edit form and row actions exist at all.
    fn can_manage(state: &AppState) -> bool {
        state.is_admin()
    }

    fn row_actions_visible(&self, state: &AppState) -> bool {
        Self::can_manage(state)
    }

    fn extra_row_actions(&self, _state: &AppState) -> String {
        String::new()
    }

    fn form_title(editing: Option<&Self>, t: &Translations) -> String {
        match editing {
            Some(_) => t.get(&format!("form_title_edit_{}", Self::KEY)).to_string(),
            None => Self::add_label(t),
        }
    }

    fn add_label(t: &Translations) -> String {
        t.get(&format!("form_title_add_{}", Self::KEY)).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormState {
    pub open: bool,
    pub editing: Option<i64>,
    pub values: FormData,
}

struct ListState<E> {
    items: Vec<E>,
    current_page: u32,
    total_pages: u32,
    search: String,
    status: LoadStatus,
    form: FormState,
    options: HashMap<&'static str, SelectOptions>,
}

impl<E> Default for ListState<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            total_pages: 0,
            search: String::new(),
            status: LoadStatus::Idle,
            form: FormState::default(),
            options: HashMap::new(),
        }
    }
}

struct Inner<E> {
    state: AppState,
    list: Mutex<ListState<E>>,
    tickets: AtomicU64,
}

impl<E: Entity> Inner<E> {
    fn lock(&self) -> MutexGuard<'_, ListState<E>> {
        self.list.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn fetch_page(&self, page: u32, search: &str) -> Result<Paginated<E>, AppError> {
        let mut options = FetchOptions::get();
        if E::SEARCHABLE {
            options = options.query("search", search);
        }
        options = options.query("page", page);
        let fallback = format!("Failed to load {}.", E::PLURAL);
        let payload: ListPayload<E> = self.state.api.get_json(E::BASE_PATH, options, &fallback).await?;
        Ok(payload.into_page())
    }

    /// Only the most recently issued load may write to the list.
    async fn load(&self, page: u32) -> bool {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        let search = {
            let mut list = self.lock();
            list.status = LoadStatus::Loading;
            list.search.clone()
        };

        let result = self.fetch_page(page, &search).await;

        if self.tickets.load(Ordering::SeqCst) != ticket {
            debug!("discarding stale {} response (page {}, ticket {})", E::KEY, page, ticket);
            return false;
        }

        match result {
            Ok(paged) => {
                debug!(
                    "loaded {} {} (page {}/{})",
                    paged.data.len(),
                    E::PLURAL,
                    paged.current_page,
                    paged.total_pages
                );
                let mut list = self.lock();
                list.items = paged.data;
                list.current_page = paged.current_page;
                list.total_pages = paged.total_pages;
                list.status = LoadStatus::Loaded;
                true
            }
            Err(e) => {
                warn!("loading {} failed: {}", E::PLURAL, e);
                let message = format!("Failed to load {}.", E::PLURAL);
                self.state.notifier.error(&message);
                self.lock().status = LoadStatus::Failed(message);
                false
            }
        }
    }
}

/// List, paginate, search, create/edit and delete for one entity.
pub struct ResourceModule<E: Entity> {
    inner: Arc<Inner<E>>,
    debouncer: Debouncer,
}

impl<E: Entity> ResourceModule<E> {
    pub fn new(state: AppState) -> Self {
        let debouncer = Debouncer::new(state.search_debounce);
        Self {
            inner: Arc::new(Inner {
                state,
                list: Mutex::new(ListState::default()),
                tickets: AtomicU64::new(0),
            }),
            debouncer,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.inner.state
    }

    pub async fn load(&self, page: u32) -> bool {
        self.inner.load(page).await
    }

    /// Schedules one `load(1)` with `term` after the debounce window. The
    /// term becomes the list's search only when that load fires.
    pub fn search_input(&self, term: &str) {
        if !E::SEARCHABLE {
            return;
        }
        let term = term.to_string();
        let inner = self.inner.clone();
        self.debouncer.call(async move {
            inner.lock().search = term;
            inner.load(1).await;
        });
    }

    pub fn search_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn open_create(&self) {
        self.inner.lock().form = FormState {
            open: true,
            editing: None,
            values: FormData::new(),
        };
    }

    pub fn close_form(&self) {
        self.inner.lock().form = FormState::default();
    }

    pub fn toggle_form(&self) {
        let open = self.inner.lock().form.open;
        if open {
            self.close_form();
        } else {
            self.open_create();
        }
    }

    /// Opens the form prefilled from the loaded page. False when the id is not on it.
    pub fn edit(&self, id: i64) -> bool {
        let mut list = self.inner.lock();
        let Some(item) = list.items.iter().find(|item| item.id() == id) else {
            return false;
        };
        let values = item.prefill();
        list.form = FormState {
            open: true,
            editing: Some(id),
            values,
        };
        true
    }

    pub async fn submit(&self, form: FormData) -> bool {
        let state = &self.inner.state;
        let editing = self.inner.lock().form.editing;

        let missing: Vec<&str> = E::form_fields(editing.is_some())
            .into_iter()
            .filter(|f| f.required && f.kind != FieldKind::File && form.get(f.name).trim().is_empty())
            .map(|f| f.name)
            .collect();
        if !missing.is_empty() {
            debug!("{} form missing {:?}", E::KEY, missing);
            state.notifier.warning("Please fill in all required fields.");
            self.keep_form_open(form);
            return false;
        }

        let (method, path, body) = match E::submit_request(editing, &form) {
            Ok(request) => request,
            Err(e) => {
                state.notifier.error(&e.user_message());
                self.keep_form_open(form);
                return false;
            }
        };

        let result = state
            .api
            .fetch_with_auth(&path, FetchOptions::with_method(method, Some(body)))
            .await;

        match result {
            Ok(response) if response.ok() => {
                info!("{} saved via {} {}", E::LABEL, method, path);
                state
                    .notifier
                    .success(&E::saved_message(editing.is_some(), response.message()));
                self.close_form();
                self.inner.load(1).await;
                true
            }
            Ok(response) => {
                state.notifier.error(&response.error_message("An error occurred."));
                self.keep_form_open(form);
                false
            }
            Err(e) => {
                warn!("{} {} failed: {}", method, path, e);
                state.notifier.error("Operation failed. Please try again.");
                self.keep_form_open(form);
                false
            }
        }
    }

    fn keep_form_open(&self, values: FormData) {
        let mut list = self.inner.lock();
        list.form.open = true;
        list.form.values = values;
    }

    /// Asks for confirmation first; a declined prompt sends nothing.
    pub async fn delete(&self, id: i64) -> bool {
        let state = &self.inner.state;
        let t = state.t();
        if !state.prompt.confirm(t.get("confirm_delete")) {
            debug!("delete of {} {} declined", E::KEY, id);
            return false;
        }

        let path = format!("{}/{}", E::BASE_PATH, id);
        let fallback = format!("Failed to delete {}.", E::KEY);
        match state.api.fetch_with_auth(&path, FetchOptions::delete()).await {
            Ok(response) if response.ok() => {
                info!("{} {} deleted", E::LABEL, id);
                state
                    .notifier
                    .success(&format!("{} deleted successfully!", E::LABEL));
                self.inner.load(1).await;
                true
            }
            Ok(response) => {
                state.notifier.error(&response.error_message(&fallback));
                false
            }
            Err(e) => {
                warn!("DELETE {} failed: {}", path, e);
                state.notifier.error(&fallback);
                false
            }
        }
    }

    pub fn set_options(&self, field: &'static str, options: SelectOptions) {
        self.inner.lock().options.insert(field, options);
    }

    pub fn items(&self) -> Vec<E> {
        self.inner.lock().items.clone()
    }

    pub fn find(&self, id: i64) -> Option<E> {
        self.inner.lock().items.iter().find(|item| item.id() == id).cloned()
    }

    pub fn current_page(&self) -> u32 {
        self.inner.lock().current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.inner.lock().total_pages
    }

    pub fn search_term(&self) -> String {
        self.inner.lock().search.clone()
    }

    pub fn status(&self) -> LoadStatus {
        self.inner.lock().status.clone()
    }

    pub fn form(&self) -> FormState {
        self.inner.lock().form.clone()
    }

    pub fn render_table(&self) -> String {
        let state = &self.inner.state;
        let t = state.t();
        let list = self.inner.lock();

        match &list.status {
            LoadStatus::Loading => return loader(t.get("loading")),
            LoadStatus::Failed(message) => return error_paragraph(message),
            LoadStatus::Idle | LoadStatus::Loaded => {}
        }
        if list.items.is_empty() {
            return format!("<p>{}</p>", escape(E::EMPTY_MESSAGE));
        }

        let mut head = String::new();
        for column in E::columns() {
            head.push_str(&format!("<th>{}</th>", escape(t.get(column))));
        }
        head.push_str(&format!("<th>{}</th>", escape(t.get("actions"))));

        let mut rows = String::new();
        for item in &list.items {
            let mut row = format!(r#"<tr data-id="{}">"#, item.id());
            for cell in item.cells(state) {
                row.push_str(&format!("<td>{}</td>", cell));
            }
            let mut actions = String::new();
            if item.row_actions_visible(state) {
                actions.push_str(&format!(
                    r#"<button class="btn btn-edit" data-id="{id}">{edit}</button><button class="btn btn-delete" data-id="{id}">{delete}</button>"#,
                    id = item.id(),
                    edit = escape(t.get("edit")),
                    delete = escape(t.get("delete")),
                ));
            }
            actions.push_str(&item.extra_row_actions(state));
            row.push_str(&format!(r#"<td><div class="action-buttons">{}</div></td></tr>"#, actions));
            rows.push_str(&row);
        }

        format!(
            r#"<div class="table-responsive"><table id="{}-table"><thead><tr>{}</tr></thead><tbody>{}</tbody></table></div>"#,
            E::KEY,
            head,
            rows
        )
    }

    pub fn render_form(&self) -> String {
        let state = &self.inner.state;
        let t = state.t();
        let list = self.inner.lock();
        let form = &list.form;
        if !form.open || !E::can_manage(state) {
            return String::new();
        }

        let editing_item = form
            .editing
            .and_then(|id| list.items.iter().find(|item| item.id() == id));
        let fields = E::form_fields(form.editing.is_some());
        let multipart = fields.iter().any(|f| f.kind == FieldKind::File);

        let mut html = format!(
            r#"<div id="form-container-{key}" class="form-container"><h3 id="form-title-{key}">{title}</h3><form id="{key}-form"{enctype}><input type="hidden" name="{key}Id" value="{id}">"#,
            key = E::KEY,
            title = escape(&E::form_title(editing_item, &t)),
            enctype = if multipart { r#" enctype="multipart/form-data""# } else { "" },
            id = form.editing.map(|id| id.to_string()).unwrap_or_default(),
        );

        for field in &fields {
            let value = form.values.get(field.name);
            let required = if field.required { " required" } else { "" };
            let input = match field.kind {
                FieldKind::Text | FieldKind::Email | FieldKind::Date => format!(
                    r#"<input type="{}" id="{name}" name="{name}" value="{}"{}>"#,
                    match field.kind {
                        FieldKind::Email => "email",
                        FieldKind::Date => "date",
                        _ => "text",
                    },
                    escape(value),
                    required,
                    name = field.name,
                ),
                FieldKind::Password => format!(
                    r#"<input type="password" id="{name}" name="{name}"{}>"#,
                    required,
                    name = field.name
                ),
                FieldKind::TextArea => format!(
                    r#"<textarea id="{name}" name="{name}"{}>{}</textarea>"#,
                    required,
                    escape(value),
                    name = field.name
                ),
                FieldKind::Select => {
                    let options = list
                        .options
                        .get(field.name)
                        .cloned()
                        .or_else(|| E::select_options(field.name))
                        .unwrap_or_default();
                    select(field.name, t.get("please_select"), &options, value)
                }
                FieldKind::File => format!(
                    r#"<input type="file" id="{name}" name="{name}" accept="image/*">"#,
                    name = field.name
                ),
                FieldKind::Checkbox => format!(
                    r#"<input type="checkbox" id="{name}" name="{name}"{}>"#,
                    if matches!(value, "true" | "on" | "1") { " checked" } else { "" },
                    name = field.name
                ),
            };
            html.push_str(&format!(
                r#"<div class="form-group"><label for="{}">{}:</label>{}</div>"#,
                field.name,
                escape(t.get(field.label)),
                input
            ));
        }

        html.push_str(&format!(
            r#"<button type="submit" class="btn btn-submit">{}</button></form></div>"#,
            escape(t.get(if form.editing.is_some() { "update" } else { "submit" }))
        ));
        html
    }

    pub fn render_pagination(&self) -> String {
        let t = self.inner.state.t();
        let list = self.inner.lock();
        if list.status != LoadStatus::Loaded {
            return String::new();
        }
        render_pagination(list.current_page, list.total_pages, t.get("previous"), t.get("next"))
    }

    /// Full list page; `extra_actions` is appended to the action bar.
    pub fn render_with(&self, extra_actions: &str) -> String {
        let state = &self.inner.state;
        let t = state.t();
        if !E::accessible(state) {
            return format!("<p>{}</p>", escape(E::access_denied_message()));
        }

        let mut actions = String::new();
        if E::can_manage(state) {
            let label = if self.form().open {
                t.get("cancel").to_string()
            } else {
                E::add_label(&t)
            };
            actions.push_str(&format!(
                r#"<button id="btn-toggle-form" class="btn btn-submit">{}</button>"#,
                escape(&label)
            ));
        }
        if E::SEARCHABLE {
            actions.push_str(&format!(
                r#"<div class="search-controls"><input type="text" id="search-{}-input" placeholder="{}" value="{}"></div>"#,
                E::KEY,
                escape(t.get("search_placeholder")),
                escape(&self.search_term())
            ));
        }
        actions.push_str(extra_actions);

        format!(
            r#"<h2>{title}</h2><div class="page-actions">{actions}</div>{form}<div id="{key}-table-container" class="content-panel">{table}</div><div id="pagination-container" class="pagination-container">{pagination}</div>"#,
            title = escape(t.get(E::TITLE_KEY)),
            actions = actions,
            form = self.render_form(),
            key = E::KEY,
            table = self.render_table(),
            pagination = self.render_pagination(),
        )
    }

    pub fn render(&self) -> String {
        self.render_with("")
    }
}

#[async_trait]
impl<E: Entity> ModuleView for ResourceModule<E> {
    async fn open(&self) {
        if E::accessible(self.state()) {
            self.load(1).await;
        }
    }

    fn render(&self) -> String {
        ResourceModule::render(self)
    }
}
