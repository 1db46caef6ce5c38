use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Stats {
    #[serde(default)]
    pub students: u64,
    #[serde(default)]
    pub teachers: u64,
    #[serde(default)]
    pub classes: u64,
    #[serde(default)]
    pub active_users: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClassSize {
    pub class_name: String,
    #[serde(default)]
    pub student_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RoleCount {
    pub role: String,
    #[serde(default)]
    pub count: u64,
}
