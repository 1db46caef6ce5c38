use crate::api::FormData;
use crate::models::Subject;
use crate::resource::{Entity, Field, FieldKind, ResourceModule};
use crate::state::AppState;
use crate::ui::html::escape;

pub type SubjectModule = ResourceModule<Subject>;

impl Entity for Subject {
    const BASE_PATH: &'static str = "/api/subjects";
    const KEY: &'static str = "subject";
    const LABEL: &'static str = "Subject";
    const PLURAL: &'static str = "subjects";
    const TITLE_KEY: &'static str = "subject_list";
    const EMPTY_MESSAGE: &'static str = "No subjects found.";
    const SEARCHABLE: bool = false;

    fn id(&self) -> i64 {
        self.id
    }

    fn columns() -> Vec<&'static str> {
        vec!["subject_name", "subject_description"]
    }

    fn cells(&self, _state: &AppState) -> Vec<String> {
        vec![
            escape(&self.name),
            escape(self.description.as_deref().unwrap_or("")),
        ]
    }

    fn form_fields(_editing: bool) -> Vec<Field> {
        vec![
            Field::new("name", "subject_name", FieldKind::Text).required(),
            Field::new("description", "subject_description", FieldKind::TextArea),
        ]
    }

    fn prefill(&self) -> FormData {
        FormData::new()
            .text("name", self.name.as_str())
            .text("description", self.description.clone().unwrap_or_default())
    }
}
