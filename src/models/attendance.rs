use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 3] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "present" => Some(AttendanceStatus::Present),
            "absent" => Some(AttendanceStatus::Absent),
            "late" => Some(AttendanceStatus::Late),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
        }
    }

    /// Single-letter code used in the monthly grid.
    pub fn letter(&self) -> char {
        match self {
            AttendanceStatus::Present => 'P',
            AttendanceStatus::Absent => 'A',
            AttendanceStatus::Late => 'L',
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "green",
            AttendanceStatus::Absent => "red",
            AttendanceStatus::Late => "orange",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row of `GET /api/classes/:id/attendance?date=`; `status` is the mark
/// already saved for that date, if any.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RosterEntry {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl RosterEntry {
    pub fn saved_status(&self) -> Option<AttendanceStatus> {
        self.status.as_deref().and_then(AttendanceStatus::parse)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceRecord {
    pub student_id: i64,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceSave {
    pub date: String,
    pub class_id: i64,
    pub records: Vec<AttendanceRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StudentMonth {
    #[serde(default)]
    pub student_name: String,
    /// Day of month (as a string key) to status.
    #[serde(default)]
    pub attendance: HashMap<String, Option<String>>,
}

impl StudentMonth {
    pub fn status_on(&self, day: u32) -> Option<AttendanceStatus> {
        self.attendance
            .get(&day.to_string())
            .and_then(|s| s.as_deref())
            .and_then(AttendanceStatus::parse)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MonthDetails {
    #[serde(default)]
    pub num_days: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MonthlyReport {
    #[serde(default)]
    pub report_data: Vec<StudentMonth>,
    #[serde(default)]
    pub month_details: MonthDetails,
}
