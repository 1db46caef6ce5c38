use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Class {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub teacher_id: Option<i64>,
    #[serde(default)]
    pub teacher_name: Option<String>,
    #[serde(default)]
    pub subject_id: Option<i64>,
    #[serde(default)]
    pub subject_name: Option<String>,
}

impl Class {
    /// "Grade 5A - 2024-2025", or just the name when the year is unknown.
    pub fn label(&self) -> String {
        match self.academic_year.as_deref() {
            Some(year) if !year.is_empty() => format!("{} - {}", self.name, year),
            _ => self.name.clone(),
        }
    }
}

/// Row of `GET /api/classes/:id/students`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnrolledStudent {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
    pub enrollment_id: i64,
}
