use serde::{Deserialize, Serialize};

/// Fixed one-hour rows of the weekly grid, as (start, end).
pub const TIME_SLOTS: [(&str, &str); 9] = [
    ("07:00", "08:00"),
    ("08:00", "09:00"),
    ("09:00", "10:00"),
    ("10:00", "11:00"),
    ("11:00", "12:00"),
    ("13:00", "14:00"),
    ("14:00", "15:00"),
    ("15:00", "16:00"),
    ("16:00", "17:00"),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TimetableEntry {
    pub id: i64,
    #[serde(default)]
    pub class_id: Option<i64>,
    /// 1 = Monday .. 7 = Sunday.
    pub day_of_week: u8,
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub subject_id: Option<i64>,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub teacher_id: Option<i64>,
    #[serde(default)]
    pub teacher_name: Option<String>,
}

impl TimetableEntry {
    /// `HH:MM`, dropping any seconds the server appends.
    pub fn start_hhmm(&self) -> &str {
        self.start_time.get(..5).unwrap_or(&self.start_time)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTimetableEntry {
    pub class_id: i64,
    pub teacher_id: i64,
    pub subject_id: i64,
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
}
