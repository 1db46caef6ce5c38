use serde::{Deserialize, Serialize};

use super::flexible_f64;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StudentInfo {
    #[serde(default)]
    pub name_km: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_jp: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub teacher_name: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubjectScore {
    #[serde(default)]
    pub subject_name: String,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AttendanceSummary {
    #[serde(default)]
    pub present: u32,
    #[serde(default)]
    pub absent: u32,
    #[serde(default)]
    pub late: u32,
}

/// `GET /api/results/student-report/:id?exam_type=`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportCard {
    #[serde(default)]
    pub student_info: StudentInfo,
    #[serde(default)]
    pub grades: Vec<SubjectScore>,
    #[serde(default)]
    pub attendance: AttendanceSummary,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub total_score: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub average: Option<f64>,
    /// `-1` when the student is unranked.
    #[serde(default)]
    pub rank: i64,
    #[serde(default)]
    pub result: String,
}

impl ReportCard {
    pub fn rank_label(&self) -> String {
        if self.rank > 0 {
            self.rank.to_string()
        } else {
            "N/A".to_string()
        }
    }

    pub fn passed(&self) -> bool {
        self.result == "Pass"
    }
}
