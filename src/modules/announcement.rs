use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{info, warn};

use super::{ModuleView, fetch_all};
use crate::api::{Body, FetchOptions};
use crate::models::{Announcement, NewAnnouncement};
use crate::resource::LoadStatus;
use crate::state::AppState;
use crate::ui::html::{error_paragraph, escape, multiline};
use crate::ui::loader;

#[derive(Debug, Default)]
struct Inner {
    items: Vec<Announcement>,
    status: LoadStatus,
}

/// Announcement board: everyone reads, admins and teachers post, admins delete.
pub struct AnnouncementModule {
    state: AppState,
    inner: Mutex<Inner>,
}

impl AnnouncementModule {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn items(&self) -> Vec<Announcement> {
        self.lock().items.clone()
    }

    pub fn status(&self) -> LoadStatus {
        self.lock().status.clone()
    }

    pub fn can_post(&self) -> bool {
        self.state.role.can_post_announcements()
    }

    pub async fn load(&self) -> bool {
        self.lock().status = LoadStatus::Loading;
        let result = fetch_all::<Announcement>(
            &self.state.api,
            "/api/announcements",
            "Failed to load announcements.",
        )
        .await;

        let mut inner = self.lock();
        match result {
            Ok(items) => {
                info!("loaded {} announcements", items.len());
                inner.items = items;
                inner.status = LoadStatus::Loaded;
                true
            }
            Err(e) => {
                warn!("announcements load failed: {}", e);
                let message = e.user_message();
                self.state.notifier.error(&message);
                inner.status = LoadStatus::Failed(message);
                false
            }
        }
    }

    pub async fn post(&self, title: &str, content: &str) -> bool {
        if !self.can_post() {
            return false;
        }
        if title.trim().is_empty() || content.trim().is_empty() {
            self.state.notifier.warning("Please fill in all required fields.");
            return false;
        }
        let body = match Body::json(&NewAnnouncement {
            title: title.to_string(),
            content: content.to_string(),
        }) {
            Ok(body) => body,
            Err(e) => {
                self.state.notifier.error(&e.user_message());
                return false;
            }
        };

        match self
            .state
            .api
            .fetch_with_auth("/api/announcements", FetchOptions::post(body))
            .await
        {
            Ok(response) if response.ok() => {
                self.state.notifier.success("Announcement posted successfully!");
                self.load().await;
                true
            }
            Ok(response) => {
                self.state
                    .notifier
                    .error(&response.error_message("Failed to post announcement."));
                false
            }
            Err(e) => {
                warn!("announcement post failed: {}", e);
                self.state.notifier.error(&e.user_message());
                false
            }
        }
    }

    pub async fn delete(&self, id: i64) -> bool {
        if !self.state.is_admin() {
            return false;
        }
        if !self.state.prompt.confirm(self.state.t().get("confirm_delete")) {
            return false;
        }

        let path = format!("/api/announcements/{}", id);
        match self.state.api.fetch_with_auth(&path, FetchOptions::delete()).await {
            Ok(response) if response.ok() => {
                self.state.notifier.success("Announcement deleted!");
                self.load().await;
                true
            }
            Ok(_) => {
                self.state.notifier.error("Failed to delete.");
                false
            }
            Err(e) => {
                warn!("announcement delete {} failed: {}", id, e);
                self.state.notifier.error("Failed to delete.");
                false
            }
        }
    }

    fn render_card(&self, item: &Announcement) -> String {
        let delete = if self.state.is_admin() {
            format!(r#"<button class="btn btn-delete btn-sm" data-id="{}">&times;</button>"#, item.id)
        } else {
            String::new()
        };
        format!(
            concat!(
                r#"<div class="announcement-card"><div class="announcement-header"><h3>{title}</h3>{delete}</div>"#,
                r#"<div class="announcement-body"><p>{content}</p></div>"#,
                r#"<div class="announcement-footer"><span>By: {author}</span><span>{posted}</span></div></div>"#
            ),
            title = escape(&item.title),
            delete = delete,
            content = multiline(&item.content),
            author = escape(item.author_name.as_deref().unwrap_or("")),
            posted = escape(&item.posted_at()),
        )
    }

    fn render_form(&self) -> String {
        let t = self.state.t();
        format!(
            concat!(
                r#"<div class="form-container"><h3>{new}</h3><form id="announcement-form">"#,
                r#"<div class="form-group"><label for="announcement-title">{title}</label><input type="text" id="announcement-title" name="title" required></div>"#,
                r#"<div class="form-group"><label for="announcement-content">{content}</label><textarea id="announcement-content" name="content" rows="4" required></textarea></div>"#,
                r#"<button type="submit" class="btn btn-submit">{post}</button></form></div>"#
            ),
            new = escape(t.get("module_announcements_new")),
            title = escape(t.get("module_announcements_title")),
            content = escape(t.get("module_announcements_content")),
            post = escape(t.get("module_announcements_post")),
        )
    }

    pub fn render(&self) -> String {
        let t = self.state.t();
        let inner = self.lock();
        let list = match &inner.status {
            LoadStatus::Idle | LoadStatus::Loading => loader(t.get("loading")),
            LoadStatus::Failed(message) => error_paragraph(message),
            LoadStatus::Loaded if inner.items.is_empty() => "<p>No announcements found.</p>".to_string(),
            LoadStatus::Loaded => inner.items.iter().map(|a| self.render_card(a)).collect(),
        };
        let form = if self.can_post() { self.render_form() } else { String::new() };

        format!(
            r#"<h2>{}</h2>{}<div id="announcements-list-container" class="content-panel">{}</div>"#,
            escape(t.get("module_announcements")),
            form,
            list
        )
    }
}

#[async_trait]
impl ModuleView for AnnouncementModule {
    async fn open(&self) {
        self.load().await;
    }

    fn render(&self) -> String {
        AnnouncementModule::render(self)
    }
}
