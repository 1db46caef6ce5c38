mod common;

use serde_json::json;

use common::{harness, page, students};
use ems_client::api::Method;
use ems_client::models::{AttendanceStatus, ExamType};
use ems_client::modules::student::ExportFormat;
use ems_client::modules::timetable::ScheduleInput;
use ems_client::modules::{
    AnnouncementModule, AttendanceModule, ClassModule, DashboardModule, GradeModule, ModuleView,
    StudentModule, TimetableModule,
};
use ems_client::ui::NotificationKind;

#[tokio::test]
async fn enrollment_manager_lists_only_unenrolled_students() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Get, "/api/teachers", 200, json!([{ "id": 4, "name": "Dara" }]))
        .on_json(Method::Get, "/api/subjects", 200, json!([{ "id": 5, "name": "Math" }]))
        .on_json(
            Method::Get,
            "/api/classes",
            200,
            page(json!([{ "id": 3, "name": "Grade 5A", "academic_year": "2024-2025" }]), 1, 1),
        )
        .on_json(
            Method::Get,
            "/api/classes/3/students",
            200,
            json!([{ "id": 1, "name": "Student 1", "contact": "012", "enrollment_id": 10 }]),
        )
        .on_json(Method::Get, "/api/students", 200, page(students(&[1, 2, 3]), 1, 1))
        .on_json(Method::Post, "/api/enrollments", 201, json!({ "message": "ok" }));
    let module = ClassModule::new(h.state.clone());

    module.open().await;
    let list = module.render();
    assert!(list.contains("btn-manage-students"));
    assert!(list.contains("btn-edit"));

    assert!(module.manage_students(3).await);
    let enrollment = module.enrollment().unwrap();
    assert_eq!(enrollment.class_name, "Grade 5A");
    let available: Vec<i64> = enrollment.available.iter().map(|s| s.id).collect();
    assert_eq!(available, vec![2, 3]);

    assert!(module.enroll(2).await);
    let body = h.transport.requests_to(Method::Post, "/api/enrollments")[0]
        .json_body()
        .unwrap();
    assert_eq!(body, json!({ "student_id": 2, "class_id": 3 }));
    assert_eq!(h.transport.count(Method::Get, "/api/classes/3/students"), 2);

    module.back_to_classes().await;
    assert!(module.enrollment().is_none());
}

#[tokio::test]
async fn teachers_only_get_manage_button_on_classes() {
    let h = harness("teacher", true);
    h.transport.on_json(
        Method::Get,
        "/api/classes",
        200,
        page(json!([{ "id": 3, "name": "Grade 5A" }]), 1, 1),
    );
    let module = ClassModule::new(h.state.clone());

    module.open().await;
    let html = module.render();
    assert!(html.contains("btn-manage-students"));
    assert!(!html.contains("btn-edit"));
    assert_eq!(h.transport.count(Method::Get, "/api/teachers"), 0);
}

#[tokio::test]
async fn attendance_defaults_to_present_and_saves_marks() {
    let h = harness("teacher", true);
    h.transport
        .on_json(
            Method::Get,
            "/api/classes/3/attendance",
            200,
            json!([
                { "id": 1, "name": "Sokha", "status": "absent" },
                { "id": 2, "name": "Dara", "status": null }
            ]),
        )
        .on_json(Method::Post, "/api/attendance", 200, json!({ "message": "Attendance saved." }));
    let module = AttendanceModule::new(h.state.clone());

    assert!(module.load_roster(Some(3), "2024-05-01").await);
    assert_eq!(module.status_of(1), Some(AttendanceStatus::Absent));
    assert_eq!(module.status_of(2), Some(AttendanceStatus::Present));
    let request = &h.transport.requests_to(Method::Get, "/api/classes/3/attendance")[0];
    assert_eq!(request.query_value("date").as_deref(), Some("2024-05-01"));

    assert!(module.set_status(2, AttendanceStatus::Late));
    assert!(!module.set_status(99, AttendanceStatus::Late));
    assert!(module.save().await);

    let body = h.transport.requests_to(Method::Post, "/api/attendance")[0]
        .json_body()
        .unwrap();
    assert_eq!(
        body,
        json!({
            "date": "2024-05-01",
            "class_id": 3,
            "records": [
                { "student_id": 1, "status": "absent" },
                { "student_id": 2, "status": "late" }
            ]
        })
    );
    assert_eq!(h.last_message(), "Attendance saved.");
}

#[tokio::test]
async fn attendance_refuses_empty_roster_and_missing_inputs() {
    let h = harness("teacher", true);
    h.transport
        .on_json(Method::Get, "/api/classes/3/attendance", 200, json!([]));
    let module = AttendanceModule::new(h.state.clone());

    assert!(!module.load_roster(None, "2024-05-01").await);
    assert_eq!(h.last_message(), "Please select a class and a date.");

    assert!(module.load_roster(Some(3), "2024-05-01").await);
    assert!(!module.save().await);
    assert_eq!(h.last_message(), "No attendance data to save.");
    assert_eq!(h.transport.count(Method::Post, "/api/attendance"), 0);
}

#[tokio::test]
async fn monthly_report_renders_letter_grid_and_exports() {
    let h = harness("admin", true);
    h.transport
        .on_json(
            Method::Get,
            "/api/attendance/report",
            200,
            json!({
                "report_data": [
                    { "student_name": "Sokha", "attendance": { "1": "present", "2": "late", "3": null } }
                ],
                "month_details": { "num_days": 3 }
            }),
        )
        .on_bytes(Method::Get, "/api/attendance/report/export", b"xlsx");
    let module = AttendanceModule::new(h.state.clone());

    assert!(!module.generate_report(Some(3), "").await);
    assert_eq!(h.last_kind(), Some(NotificationKind::Warning));

    assert!(module.generate_report(Some(3), "2024-05").await);
    let html = module.render();
    assert!(html.contains(r#"<td style="color:green;">P</td>"#));
    assert!(html.contains(r#"<td style="color:orange;">L</td>"#));

    module.export_report().await.unwrap();
    assert_eq!(h.downloader.names(), vec!["attendance_report_3_2024-05.xlsx"]);
    assert_eq!(h.last_message(), "Export successful!");
}

#[tokio::test]
async fn grade_sheet_needs_every_selector() {
    let h = harness("teacher", true);
    let module = GradeModule::new(h.state.clone());

    assert!(
        !module
            .load_sheet(Some(1), None, Some(ExamType::Monthly), "2024-05-01")
            .await
    );
    assert_eq!(h.last_message(), "Please select all fields to load students.");
    assert!(h.transport.requests().is_empty());

    assert!(module.export().await.is_none());
    assert_eq!(h.last_message(), "Please load a grade sheet first.");
}

#[tokio::test]
async fn grade_sheet_loads_saves_and_exports() {
    let h = harness("teacher", true);
    h.transport
        .on_json(Method::Get, "/api/classes", 200, json!([{ "id": 1, "name": "Grade 5A" }]))
        .on_json(Method::Get, "/api/subjects", 200, json!([{ "id": 2, "name": "Math" }]))
        .on_json(
            Method::Get,
            "/api/grades/class-view",
            200,
            json!([
                { "student_id": 7, "student_name_km": "សុខា", "student_name_en": "Sokha", "score": "85.0" },
                { "student_id": 8, "student_name_km": "ដារា", "student_name_en": "Dara", "score": null }
            ]),
        )
        .on_json(Method::Post, "/api/grades", 200, json!({}))
        .on_bytes(Method::Post, "/api/grades/export/excel", b"xlsx");
    let module = GradeModule::new(h.state.clone());

    module.open().await;
    assert!(
        module
            .load_sheet(Some(1), Some(2), Some(ExamType::MidTerm), "2024-05-01")
            .await
    );
    let request = &h.transport.requests_to(Method::Get, "/api/grades/class-view")[0];
    assert_eq!(request.query_value("exam_type").as_deref(), Some("Mid-Term"));
    assert_eq!(module.score_of(7).as_deref(), Some("85"));
    assert_eq!(module.score_of(8).as_deref(), Some(""));

    assert!(module.set_score(8, " 72.5 "));
    assert!(module.save().await);
    let saved = h.transport.requests_to(Method::Post, "/api/grades")[0]
        .json_body()
        .unwrap();
    assert_eq!(saved["grades"][1], json!({ "student_id": 8, "score": "72.5" }));
    assert_eq!(h.last_message(), "Grades saved successfully!");

    module.export().await.unwrap();
    let export = h.transport.requests_to(Method::Post, "/api/grades/export/excel")[0]
        .json_body()
        .unwrap();
    assert_eq!(export["className"], "Grade 5A");
    assert_eq!(export["subjectName"], "Math");
    assert_eq!(export["examType"], "Mid-Term");
    assert_eq!(export["lang"], "km");
    assert_eq!(h.downloader.names(), vec!["Grade_Sheet_Grade 5A.xlsx"]);
}

#[tokio::test]
async fn timetable_requires_class_and_places_entries_by_slot() {
    let h = harness("admin", false);
    h.transport.on_json(
        Method::Get,
        "/api/timetables/class/3",
        200,
        json!([{
            "id": 9, "day_of_week": 1, "start_time": "07:00:00", "end_time": "08:00:00",
            "subject_name": "Math", "teacher_name": "Dara"
        }]),
    );
    let module = TimetableModule::new(h.state.clone());
    let input = ScheduleInput {
        teacher_id: 4,
        subject_id: 5,
        day_of_week: 2,
        start_time: "08:00".to_string(),
        end_time: "09:00".to_string(),
    };

    assert!(!module.add_entry(input.clone()).await);
    assert_eq!(h.last_message(), "Please select a class first.");
    assert!(h.transport.requests().is_empty());

    assert!(module.select_class(Some(3)).await);
    assert_eq!(module.entries_at(1, "07:00").len(), 1);
    assert!(module.entries_at(2, "07:00").is_empty());
    assert!(module.render().contains(r#"data-day="1" data-time="07:00"><div class="schedule-entry">"#));

    assert!(!module.delete_entry(9).await);
    assert_eq!(h.transport.count(Method::Delete, "/api/timetables/9"), 0);
    assert_eq!(
        h.prompt.asked(),
        vec!["Are you sure you want to delete this schedule entry?".to_string()]
    );
}

#[tokio::test]
async fn timetable_add_posts_selected_class() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Get, "/api/timetables/class/3", 200, json!([]))
        .on_json(Method::Post, "/api/timetables", 201, json!({}));
    let module = TimetableModule::new(h.state.clone());

    module.select_class(Some(3)).await;
    let added = module
        .add_entry(ScheduleInput {
            teacher_id: 4,
            subject_id: 5,
            day_of_week: 2,
            start_time: "08:00".to_string(),
            end_time: "09:00".to_string(),
        })
        .await;

    assert!(added);
    let body = h.transport.requests_to(Method::Post, "/api/timetables")[0]
        .json_body()
        .unwrap();
    assert_eq!(body["class_id"], 3);
    assert_eq!(body["day_of_week"], 2);
    assert_eq!(h.transport.count(Method::Get, "/api/timetables/class/3"), 2);
    assert_eq!(h.last_message(), "Schedule added successfully!");
}

#[tokio::test]
async fn teachers_post_but_cannot_delete_announcements() {
    let h = harness("teacher", true);
    h.transport
        .on_json(Method::Post, "/api/announcements", 201, json!({}))
        .on_json(
            Method::Get,
            "/api/announcements",
            200,
            json!([{ "id": 1, "title": "Exam week", "content": "Line one\nLine two", "author_name": "Dara" }]),
        );
    let module = AnnouncementModule::new(h.state.clone());

    assert!(module.post("Exam week", "Line one\nLine two").await);
    assert_eq!(h.last_message(), "Announcement posted successfully!");
    let html = module.render();
    assert!(html.contains("Line one<br>Line two"));
    assert!(html.contains("announcement-form"));
    assert!(!html.contains("btn-delete"));

    assert!(!module.delete(1).await);
    assert_eq!(h.transport.count(Method::Delete, "/api/announcements/1"), 0);
}

#[tokio::test]
async fn dashboard_shows_five_recent_with_truncated_content() {
    let h = harness("admin", true);
    let long = "x".repeat(200);
    let announcements: Vec<_> = (1..=7)
        .map(|id| {
            json!({
                "id": id,
                "title": format!("Notice {}", id),
                "content": if id == 1 { long.clone() } else { "short".to_string() },
                "author_name": "Admin",
                "created_at": "2024-05-01T08:30:00Z"
            })
        })
        .collect();
    h.transport
        .on_json(
            Method::Get,
            "/api/dashboard/stats",
            200,
            json!({ "students": 120, "teachers": 9, "classes": 6, "active_users": 11 }),
        )
        .on_json(
            Method::Get,
            "/api/dashboard/class-sizes",
            200,
            json!([{ "class_name": "Grade 5A", "student_count": 30 }]),
        )
        .on_json(
            Method::Get,
            "/api/dashboard/user-roles",
            200,
            json!([{ "role": "admin", "count": 2 }, { "role": "teacher", "count": 9 }]),
        )
        .on_json(Method::Get, "/api/announcements", 200, json!(announcements));
    let module = DashboardModule::new(h.state.clone());

    module.open().await;
    let data = module.data().unwrap();
    assert_eq!(data.recent.len(), 5);
    assert_eq!(data.stats.students, 120);

    let html = module.render();
    assert_eq!(html.matches(r#"<li class="announcement-item">"#).count(), 5);
    assert!(html.contains(&format!("{}...", "x".repeat(150))));
    assert!(!html.contains(&"x".repeat(151)));
    assert!(html.contains("2024-05-01"));
    assert!(html.contains(r#""type":"doughnut""#));

    let chart = module.class_size_chart(&data);
    assert_eq!(chart.labels, vec!["Grade 5A".to_string()]);
    assert_eq!(chart.data, vec![30]);
}

#[tokio::test]
async fn dashboard_failure_renders_inline_error() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Get, "/api/dashboard/stats", 500, json!({ "message": "boom" }))
        .on_json(Method::Get, "/api/dashboard/class-sizes", 200, json!([]))
        .on_json(Method::Get, "/api/dashboard/user-roles", 200, json!([]))
        .on_json(Method::Get, "/api/announcements", 200, json!([]));
    let module = DashboardModule::new(h.state.clone());

    module.open().await;
    assert!(module.data().is_none());
    assert_eq!(h.last_message(), "Failed to load some dashboard data.");
    assert!(module.render().contains(r#"<p style="color:red;">Failed to load some dashboard data.</p>"#));
}

#[tokio::test]
async fn student_export_uses_language_in_filename() {
    let h = harness("admin", true);
    h.transport
        .on_bytes(Method::Get, "/api/students/export/pdf", b"%PDF");
    let module = StudentModule::new(h.state.clone());

    let saved = module.export(ExportFormat::Pdf).await;
    assert!(saved.is_some());
    let request = &h.transport.requests_to(Method::Get, "/api/students/export/pdf")[0];
    assert_eq!(request.query_value("lang").as_deref(), Some("km"));
    assert_eq!(h.downloader.files(), vec![("students_export_km.pdf".to_string(), b"%PDF".to_vec())]);
}

#[tokio::test]
async fn failed_export_reports_server_message() {
    let h = harness("admin", true);
    h.transport.on_json(
        Method::Get,
        "/api/students/export/excel",
        500,
        json!({ "message": "Export service down" }),
    );
    let module = StudentModule::new(h.state.clone());

    assert!(module.export(ExportFormat::Excel).await.is_none());
    assert_eq!(h.last_message(), "Export service down");
    assert!(h.downloader.names().is_empty());
}

#[tokio::test]
async fn expired_session_stops_student_open_after_one_reload() {
    let h = harness("admin", true);
    h.transport
        .on_json(Method::Get, "/api/classes", 401, json!({ "message": "Token expired" }))
        .on_json(Method::Get, "/api/students", 401, json!({ "message": "Token expired" }));
    let module = StudentModule::new(h.state.clone());

    module.open().await;

    assert_eq!(h.reload.count(), 1);
    assert_eq!(h.transport.count(Method::Get, "/api/classes"), 1);
    assert_eq!(h.transport.count(Method::Get, "/api/students"), 0);
    assert_eq!(h.last_message(), "Session expired. Please log in again.");
}

#[tokio::test]
async fn expired_session_stops_class_open_after_one_reload() {
    let h = harness("admin", true);
    for path in ["/api/teachers", "/api/subjects", "/api/classes"] {
        h.transport
            .on_json(Method::Get, path, 401, json!({ "message": "Token expired" }));
    }
    let module = ClassModule::new(h.state.clone());

    module.open().await;

    assert_eq!(h.reload.count(), 1);
    assert_eq!(h.transport.count(Method::Get, "/api/classes"), 0);
    assert!(h
        .transport
        .requests()
        .iter()
        .all(|r| r.header("Authorization").is_some()));
}
