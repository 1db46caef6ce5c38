mod common;

use serde_json::json;

use common::{harness, page, token};
use ems_client::App;
use ems_client::api::{FetchOptions, Method};
use ems_client::auth::{AuthService, AuthState, Role};
use ems_client::i18n::Language;
use ems_client::shell::ModuleName;
use ems_client::storage::{LANG_KEY, ROLE_KEY, SessionStore, TOKEN_KEY, USERNAME_KEY};

#[tokio::test]
async fn unknown_module_renders_placeholder() {
    let h = harness("admin", true);
    let app = App::new(h.state.clone());

    let html = app.render_module("library").await;
    assert_eq!(
        html,
        "<h2>library</h2><p>This module is under construction.</p>"
    );
    assert_eq!(app.current_module(), "library");
    assert!(app.current_view().is_none());
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn language_defaults_to_khmer_and_persists_switch() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Get, "/api/subjects", 200, page(json!([]), 1, 1));
    let app = App::new(h.state.clone());
    assert_eq!(app.language(), Language::Km);

    app.render_module("subjects").await;
    let html = app.set_language(Language::En).await.unwrap();

    assert_eq!(h.store.get(LANG_KEY).as_deref(), Some("en"));
    assert!(html.contains("<h2>Subject List</h2>"));
    assert_eq!(h.transport.count(Method::Get, "/api/subjects"), 2);
    assert!(app.render_lang_switch().contains(r#"<button data-lang="en" class="active">"#));
}

#[tokio::test]
async fn stored_language_is_used_on_startup() {
    let h = harness("admin", true);
    h.store.set(LANG_KEY, "jp").unwrap();
    let app = App::new(h.state.clone());
    assert_eq!(app.language(), Language::Jp);
}

#[tokio::test]
async fn admin_only_navigation_is_hidden_from_teachers() {
    let teacher = App::new(harness("teacher", true).state);
    let users = teacher
        .nav_items()
        .into_iter()
        .find(|item| item.module == ModuleName::Users)
        .unwrap();
    assert!(users.admin_only);
    assert!(!users.visible);
    assert!(teacher.render_nav().contains(r#"data-module="users" data-role="admin" style="display:none;""#));

    let admin = App::new(harness("admin", true).state);
    assert!(admin.nav_items().iter().all(|item| item.visible));
}

#[tokio::test]
async fn active_card_follows_rendered_module() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Get, "/api/announcements", 200, json!([]));
    let app = App::new(h.state.clone());

    app.render_module("announcements").await;
    let active: Vec<ModuleName> = app
        .nav_items()
        .into_iter()
        .filter(|item| item.active)
        .map(|item| item.module)
        .collect();
    assert_eq!(active, vec![ModuleName::Announcements]);
    assert!(app.rerender().contains("No announcements found."));
}

#[tokio::test]
async fn login_stores_token_and_decoded_claims() {
    let h = harness("admin", true);
    h.store.remove(TOKEN_KEY).unwrap();
    let jwt = token(5, "dara", "teacher");
    h.transport
        .on_json(Method::Post, "/api/login", 200, json!({ "token": jwt }));
    let auth = AuthService::new(h.state.api.clone());

    let session = auth.login("dara", "secret").await.unwrap();

    assert_eq!(session.role, Role::Teacher);
    assert_eq!(session.user_id, Some(5));
    assert_eq!(h.store.get(TOKEN_KEY), Some(jwt));
    assert_eq!(h.store.get(ROLE_KEY).as_deref(), Some("teacher"));
    assert_eq!(h.store.get(USERNAME_KEY).as_deref(), Some("dara"));
    let request = &h.transport.requests_to(Method::Post, "/api/login")[0];
    assert_eq!(request.header("Authorization"), None);
}

#[tokio::test]
async fn rejected_login_carries_server_message() {
    let h = harness("admin", true);
    h.transport.on_json(
        Method::Post,
        "/api/login",
        401,
        json!({ "message": "Invalid credentials" }),
    );
    let auth = AuthService::new(h.state.api.clone());

    let err = auth.login("dara", "wrong").await.unwrap_err();
    assert_eq!(err.user_message(), "Invalid credentials");
    assert_eq!(h.reload.count(), 0);
}

#[tokio::test]
async fn logout_clears_session_but_keeps_language() {
    let h = harness("admin", true);
    h.store.set(LANG_KEY, "en").unwrap();
    let app = App::new(h.state.clone());

    app.logout().unwrap();

    assert_eq!(h.store.get(TOKEN_KEY), None);
    assert_eq!(h.store.get(ROLE_KEY), None);
    assert_eq!(h.store.get(LANG_KEY).as_deref(), Some("en"));
    assert_eq!(h.reload.count(), 1);
    assert_eq!(AuthService::new(h.state.api.clone()).bootstrap(), AuthState::LoggedOut);
    assert!(!app.state().is_admin());
}

#[tokio::test]
async fn lost_session_blocks_requests_until_next_login() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Get, "/api/subjects", 401, json!({ "message": "Token expired" }))
        .on_json(Method::Get, "/api/subjects", 200, page(json!([]), 1, 1))
        .on_json(Method::Post, "/api/login", 200, json!({ "token": token(1, "sokha", "admin") }));
    let api = h.state.api.clone();

    assert!(api.fetch_with_auth("/api/subjects", FetchOptions::get()).await.is_err());
    let again = api.fetch_with_auth("/api/subjects", FetchOptions::get()).await;
    assert!(matches!(again, Err(ems_client::AppError::Unauthorized)));
    assert_eq!(h.transport.count(Method::Get, "/api/subjects"), 1);
    assert_eq!(h.reload.count(), 1);
    assert!(api.session_lost());

    AuthService::new(api.clone()).login("sokha", "secret").await.unwrap();
    let response = api
        .fetch_with_auth("/api/subjects", FetchOptions::get())
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert!(!api.session_lost());
    assert_eq!(h.reload.count(), 1);
}
