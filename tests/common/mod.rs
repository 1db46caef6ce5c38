#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};

use ems_client::AppState;
use ems_client::api::{ApiClient, MockTransport, ReloadCounter};
use ems_client::auth::Role;
use ems_client::download::MemoryDownloader;
use ems_client::storage::{MemoryStore, ROLE_KEY, TOKEN_KEY, USERNAME_KEY};
use ems_client::ui::{Notification, NotificationBar, NotificationKind, ScriptedPrompt};

pub const BASE_URL: &str = "http://ems.test";

pub fn token(id: i64, username: &str, role: &str) -> String {
    let payload = json!({ "id": id, "username": username, "role": role, "exp": 4102444800i64 });
    format!(
        "eyJhbGciOiJIUzI1NiJ9.{}.signature",
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub store: Arc<MemoryStore>,
    pub reload: Arc<ReloadCounter>,
    pub notifier: Arc<NotificationBar>,
    pub prompt: Arc<ScriptedPrompt>,
    pub downloader: Arc<MemoryDownloader>,
    pub state: AppState,
}

impl Harness {
    pub fn last(&self) -> Option<Notification> {
        self.notifier.last()
    }

    pub fn last_message(&self) -> String {
        self.last().map(|n| n.message).unwrap_or_default()
    }

    pub fn last_kind(&self) -> Option<NotificationKind> {
        self.last().map(|n| n.kind)
    }
}

/// Logged-in session for `role` with user id 1; `confirm` scripts every prompt.
pub fn harness(role: &str, confirm: bool) -> Harness {
    let transport = Arc::new(MockTransport::new());
    let store = Arc::new(MemoryStore::with_entries([
        (TOKEN_KEY, token(1, "sokha", role)),
        (ROLE_KEY, role.to_string()),
        (USERNAME_KEY, "sokha".to_string()),
    ]));
    let reload = Arc::new(ReloadCounter::new());
    let notifier = Arc::new(NotificationBar::new());
    let prompt = Arc::new(ScriptedPrompt::new(confirm));
    let downloader = Arc::new(MemoryDownloader::new());

    let api = ApiClient::new(BASE_URL, transport.clone(), store.clone(), reload.clone());
    let state = AppState::new(api, notifier.clone(), prompt.clone(), downloader.clone())
        .with_role(Role::parse(role))
        .with_user_id(Some(1))
        .with_search_debounce(Duration::from_millis(300));

    Harness {
        transport,
        store,
        reload,
        notifier,
        prompt,
        downloader,
        state,
    }
}

pub fn page(data: Value, current_page: u32, total_pages: u32) -> Value {
    json!({ "data": data, "current_page": current_page, "total_pages": total_pages })
}

pub fn students(ids: &[i64]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| {
                json!({
                    "id": id,
                    "name_km": format!("សិស្ស {}", id),
                    "name_en": format!("Student {}", id),
                    "class_name": "Grade 5A"
                })
            })
            .collect(),
    )
}
