use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_km: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_jp: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub parent_contact: Option<String>,
    #[serde(default)]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub photo_filename: Option<String>,
}

impl Student {
    /// Khmer name first, then the legacy single name.
    pub fn display_name(&self) -> &str {
        self.name_km
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.name.as_deref())
            .unwrap_or("")
    }

    /// `YYYY-MM-DD` part of the date of birth, whatever timestamp shape the server sent.
    pub fn dob_date(&self) -> String {
        self.dob
            .as_deref()
            .map(|d| d.chars().take(10).collect())
            .unwrap_or_default()
    }
}
