#![allow(dead_code)]

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use secrecy::Secret;
use serde_json::{json, Value};
use student_registry::controllers::SessionContext;
use student_registry::core::config::SupabaseConfig;
use student_registry::core::{get_subscriber, init_subscriber};
use student_registry::models::students::{FamilyStatus, StudentDraft};
use student_registry::models::users::{Permissions, Role, UserProfile};
use wiremock::{MockServer, Request};

// Set `TEST_LOG` to see the bunyan output of a test run.
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub fn init_tracing() {
    Lazy::force(&TRACING);
}

pub fn supabase_config(server: &MockServer) -> SupabaseConfig {
    SupabaseConfig {
        url: server.uri(),
        anon_key: Secret::new("anon".to_string()),
        service_role_key: Some(Secret::new("service".to_string())),
        request_timeout_secs: 2,
    }
}

pub fn profile(id: &str, role: Role, permissions: Permissions) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        full_name: format!("User {}", id),
        role,
        permissions,
        is_active: true,
        created_at: None,
    }
}

pub fn session(role: Role, permissions: Permissions) -> SessionContext {
    SessionContext::new(&profile("u1", role, permissions), "session-token")
}

pub fn admin_session() -> SessionContext {
    SessionContext::new(&profile("admin", Role::Admin, Permissions::default()), "admin-token")
}

pub fn student_json(id: &str, name: &str, family_status: &str, updated_at: &str) -> Value {
    json!({
        "id": id,
        "student_name": name,
        "birth_date": "2006-09-14",
        "residence": "Kano",
        "nationality": "Nigerian",
        "guardian_name": "Yusuf",
        "previous_courses": "",
        "quran_memorized": "10 juz",
        "computer_proficiency": true,
        "certificate": "",
        "family_status": family_status,
        "books_read": "",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": updated_at,
    })
}

pub fn profile_json(id: &str, role: &str, is_active: bool) -> Value {
    json!({
        "id": id,
        "email": format!("{}@example.com", id),
        "full_name": format!("User {}", id),
        "role": role,
        "permissions": {
            "can_view": true,
            "can_add": false,
            "can_edit": true,
            "can_delete": false
        },
        "is_active": is_active,
        "created_at": "2024-01-01T00:00:00Z",
    })
}

pub fn draft(name: &str) -> StudentDraft {
    StudentDraft {
        student_name: name.to_string(),
        birth_date: NaiveDate::from_ymd_opt(2006, 9, 14),
        residence: "Kano".to_string(),
        nationality: "Nigerian".to_string(),
        guardian_name: "Yusuf".to_string(),
        quran_memorized: "10 juz".to_string(),
        computer_proficiency: true,
        family_status: Some(FamilyStatus::Single),
        ..Default::default()
    }
}

pub async fn requests_with_method(server: &MockServer, verb: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.to_string() == verb)
        .collect()
}
