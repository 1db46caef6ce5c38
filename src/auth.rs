use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use tracing::{info, warn};

use crate::api::dto::{LoginRequest, LoginResponse};
use crate::api::{ApiClient, Body, FetchOptions};
use crate::error::AppError;
use crate::storage::{self, ROLE_KEY, TOKEN_KEY, USERNAME_KEY};

/// Role read from the token payload. Only ever used to decide what to render;
/// the API enforces the real permissions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Role {
    Admin,
    Teacher,
    #[default]
    Guest,
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "admin" => Role::Admin,
            "teacher" => Role::Teacher,
            "" => Role::Guest,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Guest => "",
            Role::Other(name) => name,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_post_announcements(&self) -> bool {
        matches!(self, Role::Admin | Role::Teacher)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Claims {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Decodes the payload segment of a JWT without checking its signature.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub username: Option<String>,
    pub role: Role,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    LoggedOut,
    LoggedIn(Session),
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::LoggedIn(session) => Some(session),
            AuthState::LoggedOut => None,
        }
    }
}

pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Startup state: logged in iff a token is stored. Nothing is verified
    /// against the server before the shell renders.
    pub fn bootstrap(&self) -> AuthState {
        let store = self.api.store();
        match store.get(TOKEN_KEY) {
            Some(token) if !token.is_empty() => {
                let user_id = decode_claims(&token).and_then(|c| c.id);
                AuthState::LoggedIn(Session {
                    username: store.get(USERNAME_KEY),
                    role: Role::parse(&store.get(ROLE_KEY).unwrap_or_default()),
                    user_id,
                    token,
                })
            }
            _ => AuthState::LoggedOut,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AppError> {
        let body = Body::json(&LoginRequest { username, password })?;
        let response = self.api.fetch("/api/login", FetchOptions::post(body)).await?;

        if !response.ok() {
            let message = response.error_message("Login failed.");
            warn!("login rejected for {}: {}", username, message);
            return Err(AppError::Http {
                status: response.status,
                message,
            });
        }

        let login: LoginResponse = response.json()?;
        let store = self.api.store();
        store.set(TOKEN_KEY, &login.token)?;
        self.api.restore_session();

        let claims = decode_claims(&login.token);
        match &claims {
            Some(claims) => {
                if let Some(role) = &claims.role {
                    store.set(ROLE_KEY, role)?;
                }
                if let Some(name) = &claims.username {
                    store.set(USERNAME_KEY, name)?;
                }
            }
            None => warn!("login token payload could not be decoded"),
        }

        let session = Session {
            token: login.token,
            username: claims.as_ref().and_then(|c| c.username.clone()),
            role: Role::parse(claims.as_ref().and_then(|c| c.role.as_deref()).unwrap_or("")),
            user_id: claims.as_ref().and_then(|c| c.id),
        };
        info!(
            "logged in as {} ({})",
            session.username.as_deref().unwrap_or(username),
            session.role
        );
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), AppError> {
        storage::clear_session(self.api.store().as_ref())?;
        info!("logged out");
        self.api.reload_hook().reload();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> String {
        format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn decodes_unverified_payload() {
        let token = token_with(r#"{"id":7,"username":"sokha","role":"admin","exp":1}"#);
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.id, Some(7));
        assert_eq!(claims.username.as_deref(), Some("sokha"));
        assert_eq!(Role::parse(claims.role.as_deref().unwrap()), Role::Admin);
    }

    #[test]
    fn malformed_tokens_decode_to_none() {
        assert_eq!(decode_claims("not-a-jwt"), None);
        assert_eq!(decode_claims("a.%%%.c"), None);
        assert_eq!(decode_claims(&token_with("[1,2]")), None);
    }

    #[test]
    fn roles_gate_announcement_posting() {
        assert!(Role::Admin.can_post_announcements());
        assert!(Role::Teacher.can_post_announcements());
        assert!(!Role::Guest.can_post_announcements());
        assert!(!Role::parse("parent").is_admin());
    }
}
