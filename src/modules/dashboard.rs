use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::{ModuleView, fetch_all};
use crate::api::FetchOptions;
use crate::error::AppError;
use crate::models::{Announcement, ClassSize, RoleCount, Stats};
use crate::resource::LoadStatus;
use crate::state::AppState;
use crate::ui::html::{error_paragraph, escape, truncate_chars};
use crate::ui::loader;

pub const RECENT_ANNOUNCEMENTS: usize = 5;
pub const EXCERPT_CHARS: usize = 150;
const LOAD_FAILED: &str = "Failed to load some dashboard data.";

/// Chart description handed to the front end as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub label: String,
    pub labels: Vec<String>,
    pub data: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardData {
    pub stats: Stats,
    pub class_sizes: Vec<ClassSize>,
    pub user_roles: Vec<RoleCount>,
    /// At most [`RECENT_ANNOUNCEMENTS`], in server order.
    pub recent: Vec<Announcement>,
}

#[derive(Debug, Default)]
struct Inner {
    status: LoadStatus,
    data: Option<DashboardData>,
}

pub struct DashboardModule {
    state: AppState,
    inner: Mutex<Inner>,
}

impl DashboardModule {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn data(&self) -> Option<DashboardData> {
        self.lock().data.clone()
    }

    pub fn status(&self) -> LoadStatus {
        self.lock().status.clone()
    }

    async fn fetch(&self) -> Result<DashboardData, AppError> {
        let api = &self.state.api;
        let (stats, class_sizes, user_roles, announcements) = tokio::try_join!(
            api.get_json::<Stats>("/api/dashboard/stats", FetchOptions::get(), LOAD_FAILED),
            api.get_json::<Vec<ClassSize>>("/api/dashboard/class-sizes", FetchOptions::get(), LOAD_FAILED),
            api.get_json::<Vec<RoleCount>>("/api/dashboard/user-roles", FetchOptions::get(), LOAD_FAILED),
            fetch_all::<Announcement>(api, "/api/announcements", LOAD_FAILED),
        )?;
        Ok(DashboardData {
            stats,
            class_sizes,
            user_roles,
            recent: announcements.into_iter().take(RECENT_ANNOUNCEMENTS).collect(),
        })
    }

    pub async fn load(&self) -> bool {
        self.lock().status = LoadStatus::Loading;
        let result = self.fetch().await;
        let mut inner = self.lock();
        match result {
            Ok(data) => {
                info!(
                    "dashboard loaded: {} students, {} teachers, {} classes",
                    data.stats.students, data.stats.teachers, data.stats.classes
                );
                inner.data = Some(data);
                inner.status = LoadStatus::Loaded;
                true
            }
            Err(e) => {
                warn!("dashboard load failed: {}", e);
                let message = match e {
                    AppError::Unauthorized => e.user_message(),
                    _ => LOAD_FAILED.to_string(),
                };
                self.state.notifier.error(&message);
                inner.data = None;
                inner.status = LoadStatus::Failed(message);
                false
            }
        }
    }

    pub fn class_size_chart(&self, data: &DashboardData) -> ChartSpec {
        let t = self.state.t();
        ChartSpec {
            kind: "bar",
            title: t.get("dashboard_chart_class_size_title").to_string(),
            label: t.get("dashboard_chart_class_size_label").to_string(),
            labels: data.class_sizes.iter().map(|c| c.class_name.clone()).collect(),
            data: data.class_sizes.iter().map(|c| c.student_count).collect(),
        }
    }

    pub fn user_role_chart(&self, data: &DashboardData) -> ChartSpec {
        let t = self.state.t();
        ChartSpec {
            kind: "doughnut",
            title: t.get("dashboard_chart_user_role_title").to_string(),
            label: t.get("dashboard_chart_user_role_label").to_string(),
            labels: data.user_roles.iter().map(|r| r.role.clone()).collect(),
            data: data.user_roles.iter().map(|r| r.count).collect(),
        }
    }

    fn render_chart(id: &str, spec: &ChartSpec) -> String {
        let json = serde_json::to_string(spec).unwrap_or_else(|_| "{}".to_string());
        format!(
            r#"<div class="card"><canvas id="{}"></canvas><script type="application/json" data-chart="{}">{}</script></div>"#,
            id,
            id,
            json.replace("</", "<\\/")
        )
    }

    fn render_recent(&self, recent: &[Announcement]) -> String {
        let t = self.state.t();
        if recent.is_empty() {
            return format!("<p>{}</p>", escape(t.get("dashboard_no_announcements")));
        }
        let items: String = recent
            .iter()
            .map(|a| {
                format!(
                    concat!(
                        r#"<li class="announcement-item"><div class="announcement-item-header"><strong>{}</strong>"#,
                        r#"<span class="announcement-item-meta">{} - {}</span></div>"#,
                        r#"<p class="announcement-item-content">{}</p></li>"#
                    ),
                    escape(&a.title),
                    escape(a.author_name.as_deref().unwrap_or("")),
                    escape(&a.posted_on()),
                    escape(&truncate_chars(&a.content, EXCERPT_CHARS))
                )
            })
            .collect();
        format!(r#"<ul class="announcement-list">{}</ul>"#, items)
    }

    fn render_data(&self, data: &DashboardData) -> String {
        let t = self.state.t();
        let cards: String = [
            ("stats-students", data.stats.students, "dashboard_total_students"),
            ("stats-teachers", data.stats.teachers, "dashboard_total_teachers"),
            ("stats-classes", data.stats.classes, "dashboard_total_classes"),
            ("stats-users", data.stats.active_users, "dashboard_active_users"),
        ]
        .iter()
        .map(|(id, value, key)| {
            format!(
                r#"<div class="stat-card"><div class="info"><h3 id="{}">{}</h3><p>{}</p></div></div>"#,
                id,
                value,
                escape(t.get(key))
            )
        })
        .collect();

        format!(
            concat!(
                r#"<div class="dashboard-stats">{cards}</div><div class="dashboard-main-grid">"#,
                r#"<div class="dashboard-announcements card"><h3>{recent_title}</h3><div id="recent-announcements-container">{recent}</div></div>"#,
                r#"<div class="charts-grid">{class_chart}{role_chart}</div></div>"#
            ),
            cards = cards,
            recent_title = escape(t.get("dashboard_recent_announcements")),
            recent = self.render_recent(&data.recent),
            class_chart = Self::render_chart("class-size-chart", &self.class_size_chart(data)),
            role_chart = Self::render_chart("user-roles-chart", &self.user_role_chart(data)),
        )
    }

    pub fn render(&self) -> String {
        let t = self.state.t();
        let inner = self.lock();
        match (&inner.status, &inner.data) {
            (LoadStatus::Failed(message), _) => error_paragraph(message),
            (LoadStatus::Loaded, Some(data)) => self.render_data(data),
            _ => loader(t.get("loading")),
        }
    }
}

#[async_trait]
impl ModuleView for DashboardModule {
    async fn open(&self) {
        self.load().await;
    }

    fn render(&self) -> String {
        DashboardModule::render(self)
    }
}
