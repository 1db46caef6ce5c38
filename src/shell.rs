use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::auth::AuthService;
use crate::error::AppError;
use crate::i18n::Language;
use crate::modules::{
    AnnouncementModule, AttendanceModule, ClassModule, DashboardModule, GradeModule, ModuleView,
    StudentModule, SubjectModule, TeacherModule, TimetableModule, UserModule,
};
use crate::state::AppState;
use crate::storage::{LANG_KEY, SessionStore};
use crate::ui::html::escape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleName {
    Dashboard,
    Announcements,
    Student,
    Hr,
    Subjects,
    Academic,
    Users,
    Attendance,
    Gradebook,
    Timetable,
}

impl ModuleName {
    /// Navigation order.
    pub const ALL: [ModuleName; 10] = [
        ModuleName::Dashboard,
        ModuleName::Announcements,
        ModuleName::Student,
        ModuleName::Hr,
        ModuleName::Subjects,
        ModuleName::Academic,
        ModuleName::Users,
        ModuleName::Attendance,
        ModuleName::Gradebook,
        ModuleName::Timetable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleName::Dashboard => "dashboard",
            ModuleName::Announcements => "announcements",
            ModuleName::Student => "student",
            ModuleName::Hr => "hr",
            ModuleName::Subjects => "subjects",
            ModuleName::Academic => "academic",
            ModuleName::Users => "users",
            ModuleName::Attendance => "attendance",
            ModuleName::Gradebook => "gradebook",
            ModuleName::Timetable => "timetable",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        ModuleName::ALL.into_iter().find(|m| m.as_str() == raw)
    }

    pub fn title_key(&self) -> String {
        format!("module_{}", self.as_str())
    }

    /// Navigation entries tagged for admins only.
    pub fn admin_only(&self) -> bool {
        matches!(self, ModuleName::Users)
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn build_view(name: ModuleName, state: AppState) -> Arc<dyn ModuleView> {
    match name {
        ModuleName::Dashboard => Arc::new(DashboardModule::new(state)),
        ModuleName::Announcements => Arc::new(AnnouncementModule::new(state)),
        ModuleName::Student => Arc::new(StudentModule::new(state)),
        ModuleName::Hr => Arc::new(TeacherModule::new(state)),
        ModuleName::Subjects => Arc::new(SubjectModule::new(state)),
        ModuleName::Academic => Arc::new(ClassModule::new(state)),
        ModuleName::Users => Arc::new(UserModule::new(state)),
        ModuleName::Attendance => Arc::new(AttendanceModule::new(state)),
        ModuleName::Gradebook => Arc::new(GradeModule::new(state)),
        ModuleName::Timetable => Arc::new(TimetableModule::new(state)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub module: ModuleName,
    pub label: String,
    pub admin_only: bool,
    pub visible: bool,
    pub active: bool,
}

struct Current {
    name: String,
    view: Option<Arc<dyn ModuleView>>,
}

/// Top-level shell: owns the language, the selected module and its view.
pub struct App {
    state: Mutex<AppState>,
    current: Mutex<Current>,
}

impl App {
    /// Reads the session (role, user id) and the saved language from the store.
    pub fn new(state: AppState) -> Self {
        let store = state.api.store().clone();
        let lang = store
            .get(LANG_KEY)
            .and_then(|code| Language::from_code(&code))
            .unwrap_or_default();
        let session = AuthService::new(state.api.clone()).bootstrap();
        let (role, user_id) = match session.session() {
            Some(s) => (s.role.clone(), s.user_id),
            None => (Default::default(), None),
        };
        debug!("shell starting with lang={} role={}", lang, role);

        Self {
            state: Mutex::new(state.with_lang(lang).with_role(role).with_user_id(user_id)),
            current: Mutex::new(Current {
                name: ModuleName::Dashboard.as_str().to_string(),
                view: None,
            }),
        }
    }

    pub fn state(&self) -> AppState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn language(&self) -> Language {
        self.state().lang
    }

    pub fn current_module(&self) -> String {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).name.clone()
    }

    /// View of the module rendered last; `None` for placeholder pages.
    pub fn current_view(&self) -> Option<Arc<dyn ModuleView>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).view.clone()
    }

    /// Builds a fresh view for `name`, opens it and returns its markup.
    pub async fn render_module(&self, name: &str) -> String {
        let state = self.state();
        let Some(module) = ModuleName::parse(name) else {
            info!("no module named {}", name);
            let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
            current.name = name.to_string();
            current.view = None;
            return self.placeholder(&state, name);
        };

        info!("rendering module {}", module);
        let view = build_view(module, state);
        {
            let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
            current.name = module.as_str().to_string();
            current.view = Some(view.clone());
        }
        view.open().await;
        view.render()
    }

    /// Markup of the current view without fetching again.
    pub fn rerender(&self) -> String {
        match self.current_view() {
            Some(view) => view.render(),
            None => self.placeholder(&self.state(), &self.current_module()),
        }
    }

    fn placeholder(&self, state: &AppState, name: &str) -> String {
        let t = state.t();
        let key = format!("module_{}", name);
        let title = t.lookup(&key).unwrap_or(name);
        format!(
            "<h2>{}</h2><p>{}</p>",
            escape(title),
            escape(t.get("under_construction"))
        )
    }

    /// Persists the language and re-renders the current module with it.
    pub async fn set_language(&self, lang: Language) -> Result<String, AppError> {
        let store = self.state().api.store().clone();
        store.set(LANG_KEY, lang.code())?;
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            *state = state.clone().with_lang(lang);
        }
        info!("language switched to {}", lang);
        let name = self.current_module();
        Ok(self.render_module(&name).await)
    }

    pub fn logout(&self) -> Result<(), AppError> {
        let state = self.state();
        if let Err(e) = AuthService::new(state.api.clone()).logout() {
            warn!("logout failed: {}", e);
            return Err(e);
        }
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *guard = guard.clone().with_role(Default::default()).with_user_id(None);
        Ok(())
    }

    pub fn nav_items(&self) -> Vec<NavItem> {
        let state = self.state();
        let t = state.t();
        let current = self.current_module();
        ModuleName::ALL
            .iter()
            .map(|m| NavItem {
                module: *m,
                label: t.get(&m.title_key()).to_string(),
                admin_only: m.admin_only(),
                visible: !m.admin_only() || state.is_admin(),
                active: m.as_str() == current,
            })
            .collect()
    }

    pub fn render_nav(&self) -> String {
        let items: String = self
            .nav_items()
            .iter()
            .map(|item| {
                format!(
                    r#"<li class="module-card{}" data-module="{}"{}{}>{}</li>"#,
                    if item.active { " active" } else { "" },
                    item.module,
                    if item.admin_only { r#" data-role="admin""# } else { "" },
                    if item.visible { "" } else { r#" style="display:none;""# },
                    escape(&item.label)
                )
            })
            .collect();
        format!(r#"<ul id="modules-list">{}</ul>"#, items)
    }

    pub fn render_lang_switch(&self) -> String {
        let lang = self.language();
        let buttons: String = Language::ALL
            .iter()
            .map(|l| {
                format!(
                    r#"<button data-lang="{}"{}>{}</button>"#,
                    l.code(),
                    if *l == lang { r#" class="active""# } else { "" },
                    l.code().to_uppercase()
                )
            })
            .collect();
        format!(r#"<div class="lang-switch">{}</div>"#, buttons)
    }

    /// Whole document around `content`.
    pub fn render_page(&self, content: &str) -> String {
        let state = self.state();
        let t = state.t();
        format!(
            concat!(
                r#"<!DOCTYPE html><html lang="{lang}"><head><meta charset="utf-8"><title>{title}</title></head><body>"#,
                r#"<header><h1>{title}</h1>{switch}<button id="btn-logout" class="btn">{logout}</button></header>"#,
                r#"<nav>{nav}</nav><main id="content">{content}</main></body></html>"#
            ),
            lang = state.lang.code(),
            title = escape(t.get("title")),
            switch = self.render_lang_switch(),
            logout = escape(t.get("logout")),
            nav = self.render_nav(),
            content = content,
        )
    }
}
