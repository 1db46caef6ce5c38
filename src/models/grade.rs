use std::fmt;

use serde::{Deserialize, Serialize};

use super::flexible_f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExamType {
    #[default]
    Monthly,
    MidTerm,
    Final,
}

impl ExamType {
    pub const ALL: [ExamType; 3] = [ExamType::Monthly, ExamType::MidTerm, ExamType::Final];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Monthly => "Monthly",
            ExamType::MidTerm => "Mid-Term",
            ExamType::Final => "Final",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        ExamType::ALL.into_iter().find(|e| e.as_str() == raw)
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row of `GET /api/grades/class-view`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GradeRow {
    pub student_id: i64,
    #[serde(default)]
    pub student_name_km: Option<String>,
    #[serde(default)]
    pub student_name_en: Option<String>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub score: Option<f64>,
}

/// Scores travel as the raw input text; an empty string clears the grade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeEntry {
    pub student_id: i64,
    pub score: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeSave {
    pub class_id: i64,
    pub subject_id: i64,
    pub exam_type: String,
    pub grade_date: String,
    pub grades: Vec<GradeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeExportRow {
    pub student_id: i64,
    pub student_name_km: Option<String>,
    pub student_name_en: Option<String>,
    pub score: String,
}

/// Body of `POST /api/grades/export/excel`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradeExport {
    pub grades: Vec<GradeExportRow>,
    pub class_name: String,
    pub subject_name: String,
    pub exam_type: String,
    pub lang: String,
}
