mod common;

use std::time::Duration;

use serde_json::json;

use common::{BASE_URL, harness, page, students};
use ems_client::api::{FormData, Method};
use ems_client::models::{Class, Student, Subject, User};
use ems_client::modules::{SubjectModule, UserModule};
use ems_client::resource::{LoadStatus, ResourceModule};
use ems_client::storage::{SessionStore, TOKEN_KEY};
use ems_client::ui::NotificationKind;

#[tokio::test]
async fn renders_one_row_per_student_and_page_buttons() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Get, "/api/students", 200, page(students(&[1, 2, 3]), 2, 3));
    let module: ResourceModule<Student> = ResourceModule::new(h.state.clone());

    assert!(module.load(2).await);

    let table = module.render_table();
    assert_eq!(table.matches("<tr data-id=").count(), 3);
    assert_eq!(table.matches("btn-edit").count(), 3);

    let pagination = module.render_pagination();
    assert_eq!(pagination.matches("page-number").count(), 3);
    assert_eq!((module.current_page(), module.total_pages()), (2, 3));

    let request = &h.transport.requests_to(Method::Get, "/api/students")[0];
    assert_eq!(request.query_value("page").as_deref(), Some("2"));
    assert_eq!(request.query_value("search").as_deref(), Some(""));
}

#[tokio::test]
async fn single_page_renders_no_pagination() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Get, "/api/students", 200, page(students(&[1]), 1, 1));
    let module: ResourceModule<Student> = ResourceModule::new(h.state.clone());

    module.load(1).await;
    assert_eq!(module.render_pagination(), "");
}

#[tokio::test]
async fn teachers_see_rows_without_edit_buttons() {
    let h = harness("teacher", true);
    h.transport
        .on_json(Method::Get, "/api/students", 200, page(students(&[1, 2]), 1, 1));
    let module: ResourceModule<Student> = ResourceModule::new(h.state.clone());

    module.load(1).await;
    let html = module.render();
    assert_eq!(html.matches("<tr data-id=").count(), 2);
    assert!(!html.contains("btn-edit"));
    assert!(!html.contains("btn-toggle-form"));
}

#[tokio::test]
async fn subjects_load_without_search_parameter() {
    let h = harness("admin", true);
    h.transport.on_json(
        Method::Get,
        "/api/subjects",
        200,
        page(json!([{ "id": 1, "name": "Math" }]), 1, 1),
    );
    let module = SubjectModule::new(h.state.clone());

    module.load(1).await;
    let request = &h.transport.requests_to(Method::Get, "/api/subjects")[0];
    assert_eq!(request.query_value("search"), None);
    assert_eq!(module.items()[0].name, "Math");
}

#[tokio::test]
async fn bare_array_is_a_single_page() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Get, "/api/subjects", 200, json!([{ "id": 4, "name": "Khmer" }]));
    let module = SubjectModule::new(h.state.clone());

    assert!(module.load(1).await);
    assert_eq!(module.total_pages(), 1);
    assert_eq!(module.items().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn search_keystrokes_fire_one_load_after_pause() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Get, "/api/students", 200, page(students(&[7]), 1, 1));
    let module: ResourceModule<Student> = ResourceModule::new(h.state.clone());

    for term in ["s", "so", "sok"] {
        module.search_input(term);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(h.transport.count(Method::Get, "/api/students"), 0);
    assert!(module.search_pending());

    tokio::time::sleep(Duration::from_millis(400)).await;

    let requests = h.transport.requests_to(Method::Get, "/api/students");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query_value("search").as_deref(), Some("sok"));
    assert_eq!(requests[0].query_value("page").as_deref(), Some("1"));
    assert_eq!(module.items().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stale_response_is_discarded() {
    let h = harness("admin", true);
    h.transport
        .on_delayed(
            Method::Get,
            "/api/students",
            Duration::from_millis(500),
            200,
            page(students(&[1]), 1, 2),
        )
        .on_json(Method::Get, "/api/students", 200, page(students(&[8, 9]), 2, 2));
    let module: ResourceModule<Student> = ResourceModule::new(h.state.clone());

    let (first, second) = tokio::join!(module.load(1), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        module.load(2).await
    });

    assert!(!first);
    assert!(second);
    let ids: Vec<i64> = module.items().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![8, 9]);
    assert_eq!(module.current_page(), 2);
}

#[tokio::test]
async fn successful_submit_closes_form_and_reloads_once() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Post, "/api/subjects", 201, json!({ "message": "created" }))
        .on_json(Method::Get, "/api/subjects", 200, page(json!([]), 1, 1));
    let module = SubjectModule::new(h.state.clone());

    module.open_create();
    assert!(module.submit(FormData::new().text("name", "Physics")).await);

    let form = module.form();
    assert!(!form.open);
    assert!(form.values.is_empty());
    assert_eq!(form.editing, None);
    assert_eq!(h.transport.count(Method::Get, "/api/subjects"), 1);
    assert_eq!(h.last_message(), "Subject added successfully!");
    let body = h.transport.requests_to(Method::Post, "/api/subjects")[0]
        .json_body()
        .unwrap();
    assert_eq!(body["name"], "Physics");
}

#[tokio::test]
async fn editing_puts_to_the_item() {
    let h = harness("admin", true);
    h.transport
        .on_json(
            Method::Get,
            "/api/subjects",
            200,
            page(json!([{ "id": 3, "name": "Math", "description": "Numbers" }]), 1, 1),
        )
        .on_json(Method::Put, "/api/subjects/3", 200, json!({}));
    let module: ResourceModule<Subject> = ResourceModule::new(h.state.clone());

    module.load(1).await;
    assert!(module.edit(3));
    assert_eq!(module.form().values.get("description"), "Numbers");

    assert!(module.submit(FormData::new().text("name", "Maths")).await);
    assert_eq!(h.transport.count(Method::Put, "/api/subjects/3"), 1);
    assert_eq!(h.last_message(), "Subject updated successfully!");
}

#[tokio::test]
async fn rejected_submit_keeps_form_open_with_server_message() {
    let h = harness("admin", true);
    h.transport.on_json(
        Method::Post,
        "/api/subjects",
        400,
        json!({ "message": "Subject already exists" }),
    );
    let module = SubjectModule::new(h.state.clone());

    module.open_create();
    assert!(!module.submit(FormData::new().text("name", "Math")).await);

    assert!(module.form().open);
    assert_eq!(module.form().values.get("name"), "Math");
    assert_eq!(h.last_message(), "Subject already exists");
    assert_eq!(h.last_kind(), Some(NotificationKind::Error));
    assert_eq!(h.transport.count(Method::Get, "/api/subjects"), 0);
}

#[tokio::test]
async fn transport_failure_reports_generic_message() {
    let h = harness("admin", true);
    h.transport
        .on_network_error(Method::Post, "/api/subjects", "connection refused");
    let module = SubjectModule::new(h.state.clone());

    module.open_create();
    assert!(!module.submit(FormData::new().text("name", "Math")).await);
    assert_eq!(h.last_message(), "Operation failed. Please try again.");
}

#[tokio::test]
async fn missing_required_field_sends_nothing() {
    let h = harness("admin", true);
    let module = SubjectModule::new(h.state.clone());

    module.open_create();
    assert!(!module.submit(FormData::new().text("description", "x")).await);
    assert!(h.transport.requests().is_empty());
    assert_eq!(h.last_kind(), Some(NotificationKind::Warning));
}

#[tokio::test]
async fn declined_delete_sends_no_request() {
    let h = harness("admin", false);
    let module = SubjectModule::new(h.state.clone());

    assert!(!module.delete(5).await);
    assert!(h.transport.requests().is_empty());
    assert_eq!(h.prompt.asked().len(), 1);
}

#[tokio::test]
async fn confirmed_delete_removes_and_reloads() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Delete, "/api/subjects/5", 200, json!({}))
        .on_json(Method::Get, "/api/subjects", 200, page(json!([]), 1, 1));
    let module = SubjectModule::new(h.state.clone());

    assert!(module.delete(5).await);
    assert_eq!(h.transport.count(Method::Delete, "/api/subjects/5"), 1);
    assert_eq!(h.transport.count(Method::Get, "/api/subjects"), 1);
    assert_eq!(h.last_message(), "Subject deleted successfully!");
}

#[tokio::test]
async fn unauthorized_wipes_session_and_reloads_once() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Get, "/api/students", 401, json!({ "message": "Token expired" }));
    let module: ResourceModule<Student> = ResourceModule::new(h.state.clone());

    assert!(!module.load(1).await);
    assert_eq!(h.reload.count(), 1);
    assert_eq!(h.store.get(TOKEN_KEY), None);
    assert!(matches!(module.status(), LoadStatus::Failed(_)));
}

#[tokio::test]
async fn user_list_hides_actions_on_own_row() {
    let h = harness("admin", true);
    h.transport.on_json(
        Method::Get,
        "/api/users",
        200,
        json!([
            { "id": 1, "username": "sokha", "role": "admin", "is_active": true },
            { "id": 2, "username": "dara", "role": "teacher", "is_active": false }
        ]),
    );
    let module = UserModule::new(h.state.clone());

    module.load(1).await;
    let table = module.render_table();
    assert_eq!(table.matches("btn-delete").count(), 1);
    assert!(table.contains(r#"<button class="btn btn-delete" data-id="2">"#));
}

#[tokio::test]
async fn users_page_is_denied_to_teachers() {
    let h = harness("teacher", true);
    let module: ResourceModule<User> = ResourceModule::new(h.state.clone());

    assert!(module.render().contains("Access Denied"));
}

#[tokio::test]
async fn class_list_renders_single_row_without_pagination() {
    let h = harness("admin", true);
    h.transport.on_json(
        Method::Get,
        "/api/classes",
        200,
        page(
            json!([{
                "id": 1,
                "name": "Grade 5",
                "academic_year": "2024",
                "teacher_name": "Mr. X",
                "subject_name": "Math"
            }]),
            1,
            1,
        ),
    );
    let module: ResourceModule<Class> = ResourceModule::new(h.state.clone());

    assert!(module.load(1).await);

    let table = module.render_table();
    assert_eq!(table.matches("<tr data-id=").count(), 1);
    for value in ["Grade 5", "2024", "Mr. X", "Math"] {
        assert!(table.contains(&format!("<td>{}</td>", value)), "missing {}", value);
    }
    assert_eq!(module.render_pagination(), "");
}

#[tokio::test(start_paused = true)]
async fn typed_search_term_is_url_encoded() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Get, "/api/students", 200, page(students(&[2]), 1, 1));
    let module: ResourceModule<Student> = ResourceModule::new(h.state.clone());

    module.search_input("Grade 5 & 6");
    tokio::time::sleep(Duration::from_millis(400)).await;

    let request = &h.transport.requests_to(Method::Get, "/api/students")[0];
    assert_eq!(
        request.url,
        format!("{}/api/students?search=Grade+5+%26+6&page=1", BASE_URL)
    );
    assert_eq!(request.query_value("search").as_deref(), Some("Grade 5 & 6"));
}

#[tokio::test(start_paused = true)]
async fn paging_during_debounce_keeps_previous_term() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Get, "/api/students", 200, page(students(&[1, 2]), 2, 3));
    let module: ResourceModule<Student> = ResourceModule::new(h.state.clone());

    module.search_input("dara");
    module.load(2).await;
    assert_eq!(module.search_term(), "");

    tokio::time::sleep(Duration::from_millis(400)).await;

    let requests = h.transport.requests_to(Method::Get, "/api/students");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].query_value("search").as_deref(), Some(""));
    assert_eq!(requests[0].query_value("page").as_deref(), Some("2"));
    assert_eq!(requests[1].query_value("search").as_deref(), Some("dara"));
    assert_eq!(module.search_term(), "dara");
}
