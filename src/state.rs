use std::sync::Arc;
use std::time::Duration;

use crate::api::ApiClient;
use crate::auth::Role;
use crate::config::DEFAULT_SEARCH_DEBOUNCE_MS;
use crate::download::Downloader;
use crate::i18n::{Language, Translations};
use crate::ui::{ConfirmPrompt, Notifier};

/// Everything a module view needs, cloned into each view when it is opened.
#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub notifier: Arc<dyn Notifier>,
    pub prompt: Arc<dyn ConfirmPrompt>,
    pub downloader: Arc<dyn Downloader>,
    pub lang: Language,
    pub role: Role,
    /// `id` claim of the stored token.
    pub user_id: Option<i64>,
    pub search_debounce: Duration,
}

impl AppState {
    pub fn new(
        api: ApiClient,
        notifier: Arc<dyn Notifier>,
        prompt: Arc<dyn ConfirmPrompt>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        Self {
            api,
            notifier,
            prompt,
            downloader,
            lang: Language::default(),
            role: Role::default(),
            user_id: None,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_lang(mut self, lang: Language) -> Self {
        self.lang = lang;
        self
    }

    pub fn with_user_id(mut self, user_id: Option<i64>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce = delay;
        self
    }

    pub fn t(&self) -> Translations {
        Translations::new(self.lang)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
