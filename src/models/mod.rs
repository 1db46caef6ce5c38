pub mod announcement;
pub mod attendance;
pub mod class;
pub mod dashboard;
pub mod grade;
pub mod report;
pub mod student;
pub mod subject;
pub mod teacher;
pub mod timetable;
pub mod user;

pub use announcement::{Announcement, NewAnnouncement};
pub use attendance::{
    AttendanceRecord, AttendanceSave, AttendanceStatus, MonthDetails, MonthlyReport, RosterEntry,
    StudentMonth,
};
pub use class::{Class, EnrolledStudent};
pub use dashboard::{ClassSize, RoleCount, Stats};
pub use grade::{ExamType, GradeEntry, GradeExport, GradeExportRow, GradeRow, GradeSave};
pub use report::{AttendanceSummary, ReportCard, StudentInfo, SubjectScore};
pub use student::Student;
pub use subject::Subject;
pub use teacher::{AssignedClass, Teacher};
pub use timetable::{NewTimetableEntry, TIME_SLOTS, TimetableEntry};
pub use user::{RegisterRequest, User, UserUpdate};

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Reformats a server timestamp (RFC 3339, RFC 2822 or naive ISO). Unparsable
/// input is returned unchanged.
pub fn format_timestamp(raw: &str, fmt: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(fmt).to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.format(fmt).to_string();
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .map(|dt| dt.format(fmt).to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Accepts a JSON number, a numeric string or null.
pub(crate) fn flexible_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// `85` rather than `85.0`; other values as-is.
pub fn display_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "flexible_f64")]
        score: Option<f64>,
    }

    #[test]
    fn flexible_numbers() {
        let parse = |raw: &str| serde_json::from_str::<Probe>(raw).unwrap().score;
        assert_eq!(parse(r#"{"score": 87.5}"#), Some(87.5));
        assert_eq!(parse(r#"{"score": "90"}"#), Some(90.0));
        assert_eq!(parse(r#"{"score": null}"#), None);
        assert_eq!(parse(r#"{}"#), None);
        assert_eq!(display_number(90.0), "90");
        assert_eq!(display_number(87.5), "87.5");
    }

    #[test]
    fn timestamps_in_several_shapes() {
        assert_eq!(format_timestamp("2024-10-15T08:30:00+07:00", "%Y-%m-%d %H:%M"), "2024-10-15 08:30");
        assert_eq!(format_timestamp("2024-10-15 08:30:00", "%Y-%m-%d"), "2024-10-15");
        assert_eq!(format_timestamp("yesterday", "%Y-%m-%d"), "yesterday");
    }
}
