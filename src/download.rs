use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{info, warn};

use crate::api::{ApiClient, FetchOptions};
use crate::error::AppError;
use crate::ui::Notifier;

/// Where exported files end up.
pub trait Downloader: Send + Sync {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, AppError>;
}

/// Keeps path separators and control characters out of server-influenced names.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}

pub struct DirectoryDownloader {
    dir: PathBuf,
}

impl DirectoryDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Downloader for DirectoryDownloader {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(sanitize_filename(filename));
        fs::write(&path, bytes)?;
        info!("saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// Keeps downloads in memory.
#[derive(Default)]
pub struct MemoryDownloader {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.files().into_iter().map(|(name, _)| name).collect()
    }
}

impl Downloader for MemoryDownloader {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
        let name = sanitize_filename(filename);
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((name.clone(), bytes.to_vec()));
        Ok(PathBuf::from(name))
    }
}

/// Fetches an export endpoint and hands the bytes to the downloader.
/// Outcome is reported through the notifier; the saved path is returned on success.
pub async fn export_to_file(
    api: &ApiClient,
    notifier: &dyn Notifier,
    downloader: &dyn Downloader,
    path: &str,
    options: FetchOptions,
    filename: &str,
) -> Option<PathBuf> {
    let result = async {
        let response = api
            .fetch_with_auth(path, options)
            .await?
            .into_result("Export failed.")?;
        downloader.save(filename, &response.body)
    }
    .await;

    match result {
        Ok(saved) => {
            notifier.success("Export successful!");
            Some(saved)
        }
        Err(e) => {
            warn!("export {} failed: {}", path, e);
            notifier.error(&e.user_message());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_path_components() {
        assert_eq!(sanitize_filename("../Grade 5/A_timetable.pdf"), "_Grade 5_A_timetable.pdf");
        assert_eq!(sanitize_filename("students_export_km.xlsx"), "students_export_km.xlsx");
        assert_eq!(sanitize_filename(".."), "download");
    }

    #[test]
    fn directory_downloader_writes_file() {
        let dir = std::env::temp_dir().join(format!("ems-dl-{}", uuid::Uuid::new_v4()));
        let downloader = DirectoryDownloader::new(&dir);
        let path = downloader.save("report.xlsx", b"PK\x03\x04").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"PK\x03\x04");
        let _ = fs::remove_dir_all(dir);
    }
}
