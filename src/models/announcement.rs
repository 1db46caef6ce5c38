use serde::{Deserialize, Serialize};

use super::format_timestamp;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Announcement {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Announcement {
    pub fn posted_on(&self) -> String {
        self.created_at
            .as_deref()
            .map(|ts| format_timestamp(ts, "%Y-%m-%d"))
            .unwrap_or_default()
    }

    pub fn posted_at(&self) -> String {
        self.created_at
            .as_deref()
            .map(|ts| format_timestamp(ts, "%Y-%m-%d %H:%M"))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
}
