use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssignedClass {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub subject_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Teacher {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub hire_date: Option<String>,
    #[serde(default)]
    pub photo_filename: Option<String>,
    /// Only present on the single-teacher endpoint.
    #[serde(default)]
    pub assigned_classes: Vec<AssignedClass>,
}
