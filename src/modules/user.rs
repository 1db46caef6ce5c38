use crate::api::{Body, FormData, Method};
use crate::error::AppError;
use crate::i18n::Translations;
use crate::models::{RegisterRequest, User, UserUpdate, format_timestamp};
use crate::resource::{Entity, Field, FieldKind, ResourceModule, SelectOptions};
use crate::state::AppState;
use crate::ui::html::escape;

pub type UserModule = ResourceModule<User>;

fn checkbox_on(value: &str) -> bool {
    matches!(value, "true" | "on" | "1")
}

impl Entity for User {
    const BASE_PATH: &'static str = "/api/users";
    const KEY: &'static str = "user";
    const LABEL: &'static str = "User";
    const PLURAL: &'static str = "users";
    const TITLE_KEY: &'static str = "module_users";
    const EMPTY_MESSAGE: &'static str = "No users found.";
    const SEARCHABLE: bool = false;

    fn id(&self) -> i64 {
        self.id
    }

    fn columns() -> Vec<&'static str> {
        vec!["full_name", "username", "role", "status", "last_login"]
    }

    fn cells(&self, state: &AppState) -> Vec<String> {
        let t = state.t();
        let (status, color) = if self.is_active {
            (t.get("active"), "var(--ok)")
        } else {
            (t.get("inactive"), "var(--err)")
        };
        vec![
            escape(self.full_name.as_deref().unwrap_or("")),
            escape(&self.username),
            escape(&self.role),
            format!(
                r#"<span style="color: {}; font-weight: bold;">{}</span>"#,
                color,
                escape(status)
            ),
            escape(
                &self
                    .last_login
                    .as_deref()
                    .map(|ts| format_timestamp(ts, "%Y-%m-%d %H:%M"))
                    .unwrap_or_else(|| "N/A".to_string()),
            ),
        ]
    }

    /// Once registered, only role and activation are editable.
    fn form_fields(editing: bool) -> Vec<Field> {
        if editing {
            vec![
                Field::new("role", "role", FieldKind::Select).required(),
                Field::new("is_active", "active", FieldKind::Checkbox),
            ]
        } else {
            vec![
                Field::new("full_name", "full_name", FieldKind::Text).required(),
                Field::new("email", "email", FieldKind::Email).required(),
                Field::new("username", "username", FieldKind::Text).required(),
                Field::new("password", "password", FieldKind::Password).required(),
                Field::new("role", "role", FieldKind::Select).required(),
            ]
        }
    }

    fn select_options(field: &str) -> Option<SelectOptions> {
        (field == "role").then(|| {
            vec![
                ("teacher".to_string(), "Teacher".to_string()),
                ("admin".to_string(), "Admin".to_string()),
            ]
        })
    }

    fn prefill(&self) -> FormData {
        FormData::new()
            .text("full_name", self.full_name.clone().unwrap_or_default())
            .text("email", self.email.clone().unwrap_or_default())
            .text("username", self.username.as_str())
            .text("role", self.role.as_str())
            .text("is_active", self.is_active.to_string())
    }

    fn submit_request(id: Option<i64>, form: &FormData) -> Result<(Method, String, Body), AppError> {
        match id {
            None => {
                let register = RegisterRequest {
                    username: form.get("username").to_string(),
                    password: form.get("password").to_string(),
                    email: form.get("email").to_string(),
                    full_name: form.get("full_name").to_string(),
                    role: form.get("role").to_string(),
                };
                Ok((Method::Post, "/api/register".to_string(), Body::json(&register)?))
            }
            Some(id) => {
                let update = UserUpdate {
                    role: form.get("role").to_string(),
                    is_active: checkbox_on(form.get("is_active")),
                };
                Ok((Method::Put, format!("{}/{}", Self::BASE_PATH, id), Body::json(&update)?))
            }
        }
    }

    fn saved_message(editing: bool, server_message: Option<String>) -> String {
        if editing {
            "User updated successfully!".to_string()
        } else {
            server_message.unwrap_or_else(|| "User registered successfully!".to_string())
        }
    }

    fn accessible(state: &AppState) -> bool {
        state.is_admin()
    }

    fn access_denied_message() -> &'static str {
        "Access Denied. You must be an admin to manage users."
    }

    /// Admins cannot edit or delete their own account from the list.
    fn row_actions_visible(&self, state: &AppState) -> bool {
        state.is_admin() && state.user_id != Some(self.id)
    }

    fn form_title(editing: Option<&Self>, t: &Translations) -> String {
        match editing {
            Some(user) => format!("Edit User: {}", user.username),
            None => Self::add_label(t),
        }
    }

    fn add_label(t: &Translations) -> String {
        t.get("register").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_goes_to_register_and_edit_sends_role_only() {
        let form = FormData::new()
            .text("full_name", "Sok Dara")
            .text("email", "dara@example.com")
            .text("username", "dara")
            .text("password", "secret")
            .text("role", "teacher");
        let (method, path, body) = User::submit_request(None, &form).unwrap();
        assert_eq!((method, path.as_str()), (Method::Post, "/api/register"));
        assert_eq!(
            body,
            Body::Json(json!({
                "username": "dara",
                "password": "secret",
                "email": "dara@example.com",
                "full_name": "Sok Dara",
                "role": "teacher"
            }))
        );

        let form = FormData::new().text("role", "admin").text("is_active", "on");
        let (method, path, body) = User::submit_request(Some(4), &form).unwrap();
        assert_eq!((method, path.as_str()), (Method::Put, "/api/users/4"));
        assert_eq!(body, Body::Json(json!({"role": "admin", "is_active": true})));
    }
}
