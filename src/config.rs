use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub session_file: PathBuf,
    pub download_dir: PathBuf,
    pub search_debounce: Duration,
}

impl ClientConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let api_base_url = env::var("EMS_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(AppError::Url(format!(
                "EMS_API_BASE_URL must be an http(s) URL, got {}",
                api_base_url
            )));
        }

        let session_file = env::var("EMS_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("ems-session.json"));
        let download_dir = env::var("EMS_DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let debounce_ms = match env::var("EMS_SEARCH_DEBOUNCE_MS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                AppError::Validation(format!("EMS_SEARCH_DEBOUNCE_MS is not a number: {}", raw))
            })?,
            Err(_) => DEFAULT_SEARCH_DEBOUNCE_MS,
        };

        Ok(Self {
            api_base_url,
            session_file,
            download_dir,
            search_debounce: Duration::from_millis(debounce_ms),
        })
    }
}
