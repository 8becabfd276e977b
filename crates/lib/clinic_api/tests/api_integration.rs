//! Integration tests: full router over a seeded in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use chrono::NaiveDate;
use clinic_api::config::ApiConfig;
use clinic_api::{AppState, router};
use clinic_core::models::auth::Role;
use clinic_core::models::clinic::{AppointmentStatus, NewAppointment};
use clinic_core::seed::seed;
use clinic_core::store::{ClinicStore, MemoryStore};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    app: Router,
    store: Arc<MemoryStore>,
}

fn config(production: bool) -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        database_url: "postgres://unused".into(),
        session_secret: "integration-test-secret".into(),
        production,
        static_dir: std::env::temp_dir(),
    }
}

async fn test_app_with(production: bool) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref()).await.expect("seed");
    let state = AppState::new(store.clone(), config(production));
    TestApp {
        app: router(state),
        store,
    }
}

async fn test_app() -> TestApp {
    test_app_with(false).await
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl TestApp {
    async fn send(&self, req: Request<Body>) -> Reply {
        let resp = self.app.clone().oneshot(req).await.expect("request");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply {
            status,
            headers,
            body,
        }
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Reply {
        let mut req = Request::builder().method("GET").uri(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> Reply {
        self.write("POST", uri, cookie, body).await
    }

    async fn write(&self, method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Reply {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        self.send(req.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Log in and return the `session=...` pair for the Cookie header.
    async fn login(&self, email: &str, password: &str) -> String {
        let reply = self
            .post(
                "/api/auth/login",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(StatusCode::OK, reply.status, "login {email}: {}", reply.body);
        session_pair(&reply.headers).expect("session cookie")
    }

    async fn user_id(&self, email: &str) -> Uuid {
        self.store
            .find_user_by_email(email)
            .await
            .unwrap()
            .expect("seeded user")
            .user
            .id
    }

    async fn book(&self, patient_id: Uuid, dentist_id: Option<Uuid>) -> Uuid {
        self.store
            .create_appointment(NewAppointment {
                patient_id,
                dentist_id,
                date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
                time: "10:00".into(),
                kind: "Checkup".into(),
                status: AppointmentStatus::Scheduled,
                notes: None,
                duration: 30,
            })
            .await
            .unwrap()
            .id
    }
}

fn set_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .map(str::to_string)
}

fn session_pair(headers: &HeaderMap) -> Option<String> {
    set_cookie(headers).and_then(|c| c.split(';').next().map(str::to_string))
}

fn location(reply: &Reply) -> &str {
    reply
        .headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

const PATIENT: (&str, &str) = ("patient@clinic.com", "patient123");
const DENTIST: (&str, &str) = ("dentist@clinic.com", "dentist123");
const RECEPTION: (&str, &str) = ("reception@clinic.com", "reception123");
const ADMIN: (&str, &str) = ("admin@clinic.com", "admin123");

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_sets_session_cookie() {
    let t = test_app().await;
    let reply = t
        .post(
            "/api/auth/login",
            None,
            json!({ "email": PATIENT.0, "password": PATIENT.1 }),
        )
        .await;

    assert_eq!(StatusCode::OK, reply.status);
    assert_eq!("patient", reply.body["user"]["role"]);
    assert_eq!("John Smith", reply.body["user"]["name"]);

    let cookie = set_cookie(&reply.headers).expect("set-cookie");
    assert!(cookie.contains("HttpOnly"), "{cookie}");
    assert!(cookie.contains("SameSite=Lax"), "{cookie}");
    assert!(cookie.contains("Path=/"), "{cookie}");
    assert!(cookie.contains("Max-Age=86400"), "{cookie}");
    assert!(!cookie.contains("Secure"), "{cookie}");
}

#[tokio::test]
async fn production_cookie_is_secure() {
    let t = test_app_with(true).await;
    let reply = t
        .post(
            "/api/auth/login",
            None,
            json!({ "email": ADMIN.0, "password": ADMIN.1 }),
        )
        .await;
    let cookie = set_cookie(&reply.headers).expect("set-cookie");
    assert!(cookie.contains("Secure"), "{cookie}");
}

#[tokio::test]
async fn bad_credentials_are_401() {
    let t = test_app().await;
    let wrong = t
        .post(
            "/api/auth/login",
            None,
            json!({ "email": PATIENT.0, "password": "nope" }),
        )
        .await;
    let unknown = t
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "ghost@clinic.com", "password": "nope" }),
        )
        .await;

    assert_eq!(StatusCode::UNAUTHORIZED, wrong.status);
    assert_eq!(wrong.body, unknown.body);
    assert!(set_cookie(&wrong.headers).is_none());
}

#[tokio::test]
async fn login_without_password_is_400() {
    let t = test_app().await;
    let reply = t
        .post("/api/auth/login", None, json!({ "email": PATIENT.0 }))
        .await;
    assert_eq!(StatusCode::BAD_REQUEST, reply.status);
    assert_eq!("validation_error", reply.body["error"]);
}

#[tokio::test]
async fn register_creates_patient() {
    let t = test_app().await;
    let reply = t
        .post(
            "/api/auth/register",
            None,
            json!({
                "email": "new@clinic.com",
                "password": "secret99",
                "firstName": "Nia",
                "lastName": "Park",
                "dateOfBirth": "1991-02-03"
            }),
        )
        .await;
    assert_eq!(StatusCode::CREATED, reply.status, "{}", reply.body);
    assert_eq!("patient", reply.body["user"]["role"]);

    t.login("new@clinic.com", "secret99").await;
}

#[tokio::test]
async fn register_duplicate_is_409() {
    let t = test_app().await;
    let reply = t
        .post(
            "/api/auth/register",
            None,
            json!({
                "email": PATIENT.0,
                "password": "whatever",
                "firstName": "A",
                "lastName": "B"
            }),
        )
        .await;
    assert_eq!(StatusCode::CONFLICT, reply.status);
    assert_eq!("conflict", reply.body["error"]);
}

#[tokio::test]
async fn register_with_non_patient_role_is_401() {
    let t = test_app().await;
    let before = t.store.count_users().await.unwrap();
    for role in ["admin", "superuser"] {
        let reply = t
            .post(
                "/api/auth/register",
                None,
                json!({
                    "email": "sneaky@clinic.com",
                    "password": "whatever",
                    "firstName": "A",
                    "lastName": "B",
                    "role": role
                }),
            )
            .await;
        assert_eq!(StatusCode::UNAUTHORIZED, reply.status, "{role}");
        assert_eq!("unauthorized", reply.body["error"], "{role}");
    }
    assert_eq!(before, t.store.count_users().await.unwrap());
}

#[tokio::test]
async fn logout_expires_cookie() {
    let t = test_app().await;
    let session = t.login(PATIENT.0, PATIENT.1).await;
    let reply = t.post("/api/auth/logout", Some(&session), json!({})).await;

    assert_eq!(StatusCode::OK, reply.status);
    let cookie = set_cookie(&reply.headers).expect("set-cookie");
    assert!(cookie.starts_with("session=;"), "{cookie}");
    assert!(cookie.contains("Max-Age=0"), "{cookie}");
}

#[tokio::test]
async fn session_endpoint_returns_principal() {
    let t = test_app().await;
    let session = t.login(DENTIST.0, DENTIST.1).await;
    let reply = t.get("/api/auth/session", Some(&session)).await;
    assert_eq!(StatusCode::OK, reply.status);
    assert_eq!("dentist", reply.body["user"]["role"]);
    assert_eq!(DENTIST.0, reply.body["user"]["email"]);
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn portal_without_cookie_redirects_to_login() {
    let t = test_app().await;
    let reply = t.get("/admin/dashboard", None).await;
    assert_eq!(StatusCode::TEMPORARY_REDIRECT, reply.status);
    assert_eq!("/auth/login", location(&reply));
}

#[tokio::test]
async fn portal_of_other_role_redirects_to_own_dashboard() {
    let t = test_app().await;
    let session = t.login(PATIENT.0, PATIENT.1).await;
    let reply = t.get("/admin/dashboard", Some(&session)).await;
    assert_eq!(StatusCode::TEMPORARY_REDIRECT, reply.status);
    assert_eq!("/patient/dashboard", location(&reply));
}

#[tokio::test]
async fn own_portal_renders() {
    let t = test_app().await;
    let session = t.login(PATIENT.0, PATIENT.1).await;
    let reply = t.get("/patient/dashboard", Some(&session)).await;
    assert_eq!(StatusCode::OK, reply.status);
}

#[tokio::test]
async fn login_page_with_session_redirects_to_dashboard() {
    let t = test_app().await;
    let session = t.login(RECEPTION.0, RECEPTION.1).await;
    let reply = t.get("/auth/login", Some(&session)).await;
    assert_eq!(StatusCode::TEMPORARY_REDIRECT, reply.status);
    assert_eq!("/receptionist/dashboard", location(&reply));

    let anonymous = t.get("/auth/login", None).await;
    assert_eq!(StatusCode::OK, anonymous.status);
}

#[tokio::test]
async fn api_without_cookie_is_401() {
    let t = test_app().await;
    let reply = t.get("/api/appointments", None).await;
    assert_eq!(StatusCode::UNAUTHORIZED, reply.status);
    assert_eq!("unauthorized", reply.body["error"]);
    assert_eq!("Unauthorized", reply.body["message"]);
}

#[tokio::test]
async fn tampered_cookie_is_401() {
    let t = test_app().await;
    let session = t.login(ADMIN.0, ADMIN.1).await;
    // Flip a full-width signature character, not the final one whose low
    // bits are padding.
    let mut bytes = session.into_bytes();
    let i = bytes.len() - 5;
    bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(bytes).unwrap();

    let reply = t.get("/api/inventory", Some(&tampered)).await;
    assert_eq!(StatusCode::UNAUTHORIZED, reply.status);
}

#[tokio::test]
async fn dentist_is_kept_out_of_invoices() {
    let t = test_app().await;
    let session = t.login(DENTIST.0, DENTIST.1).await;
    let reply = t.get("/api/invoices", Some(&session)).await;
    assert_eq!(StatusCode::UNAUTHORIZED, reply.status);
}

// ---------------------------------------------------------------------------
// Role scoping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn patient_only_sees_own_appointments() {
    let t = test_app().await;
    let me = t.user_id(PATIENT.0).await;
    let someone_else = Uuid::now_v7();
    let mine = t.book(me, None).await;
    t.book(someone_else, None).await;

    let session = t.login(PATIENT.0, PATIENT.1).await;
    let reply = t
        .get(
            &format!("/api/appointments?patientId={someone_else}"),
            Some(&session),
        )
        .await;

    assert_eq!(StatusCode::OK, reply.status);
    let rows = reply.body.as_array().expect("array");
    assert_eq!(1, rows.len());
    assert_eq!(mine.to_string(), rows[0]["id"]);
    assert_eq!(me.to_string(), rows[0]["patientId"]);
}

#[tokio::test]
async fn dentist_only_sees_own_appointments() {
    let t = test_app().await;
    let dentist = t.user_id(DENTIST.0).await;
    let patient = t.user_id(PATIENT.0).await;
    let other_dentist = Uuid::now_v7();
    t.book(patient, Some(dentist)).await;
    t.book(patient, Some(other_dentist)).await;

    let session = t.login(DENTIST.0, DENTIST.1).await;
    let reply = t
        .get(
            &format!("/api/appointments?dentistId={other_dentist}"),
            Some(&session),
        )
        .await;

    let rows = reply.body.as_array().expect("array");
    assert_eq!(1, rows.len());
    assert_eq!(dentist.to_string(), rows[0]["dentistId"]);
    assert_eq!("Dr. Sarah Johnson", rows[0]["dentistName"]);
}

#[tokio::test]
async fn receptionist_filters_by_patient() {
    let t = test_app().await;
    let patient = t.user_id(PATIENT.0).await;
    t.book(patient, None).await;
    t.book(Uuid::now_v7(), None).await;

    let session = t.login(RECEPTION.0, RECEPTION.1).await;
    let all = t.get("/api/appointments", Some(&session)).await;
    let one = t
        .get(&format!("/api/appointments?patientId={patient}"), Some(&session))
        .await;

    assert_eq!(2, all.body.as_array().unwrap().len());
    assert_eq!(1, one.body.as_array().unwrap().len());
}

#[tokio::test]
async fn patient_list_ignores_foreign_id_format() {
    let t = test_app().await;
    let me = t.user_id(PATIENT.0).await;
    t.book(me, None).await;
    t.book(Uuid::now_v7(), None).await;

    let session = t.login(PATIENT.0, PATIENT.1).await;
    for uri in [
        "/api/appointments?patientId=507f1f77bcf86cd799439011",
        "/api/invoices?patientId=507f1f77bcf86cd799439011",
        "/api/treatments?patientId=507f1f77bcf86cd799439011&dentistId=x",
    ] {
        let reply = t.get(uri, Some(&session)).await;
        assert_eq!(StatusCode::OK, reply.status, "{uri}: {}", reply.body);
    }

    let reply = t
        .get(
            "/api/appointments?patientId=507f1f77bcf86cd799439011",
            Some(&session),
        )
        .await;
    let rows = reply.body.as_array().expect("array");
    assert_eq!(1, rows.len());
    assert_eq!(me.to_string(), rows[0]["patientId"]);
}

#[tokio::test]
async fn dentist_list_ignores_foreign_id_format() {
    let t = test_app().await;
    let dentist = t.user_id(DENTIST.0).await;
    let patient = t.user_id(PATIENT.0).await;
    t.book(patient, Some(dentist)).await;

    let session = t.login(DENTIST.0, DENTIST.1).await;
    let reply = t
        .get("/api/appointments?dentistId=not-an-id", Some(&session))
        .await;
    assert_eq!(StatusCode::OK, reply.status, "{}", reply.body);
    assert_eq!(1, reply.body.as_array().unwrap().len());
}

#[tokio::test]
async fn staff_filter_with_bad_id_is_400() {
    let t = test_app().await;
    let session = t.login(RECEPTION.0, RECEPTION.1).await;
    let reply = t
        .get(
            "/api/appointments?patientId=507f1f77bcf86cd799439011",
            Some(&session),
        )
        .await;
    assert_eq!(StatusCode::BAD_REQUEST, reply.status);
    assert_eq!("validation_error", reply.body["error"]);
    assert_eq!("patientId is not a valid id", reply.body["message"]);
}

#[tokio::test]
async fn patient_booking_is_forced_to_self() {
    let t = test_app().await;
    let me = t.user_id(PATIENT.0).await;
    let session = t.login(PATIENT.0, PATIENT.1).await;
    let reply = t
        .post(
            "/api/appointments",
            Some(&session),
            json!({
                "patientId": Uuid::now_v7(),
                "date": "2026-07-01",
                "time": "14:30",
                "type": "Cleaning"
            }),
        )
        .await;

    assert_eq!(StatusCode::OK, reply.status, "{}", reply.body);
    assert_eq!(me.to_string(), reply.body["appointment"]["patientId"]);
    assert_eq!(30, reply.body["appointment"]["duration"]);
    assert_eq!("scheduled", reply.body["appointment"]["status"]);
}

#[tokio::test]
async fn patient_cannot_touch_foreign_appointment() {
    let t = test_app().await;
    let foreign = t.book(Uuid::now_v7(), None).await;
    let session = t.login(PATIENT.0, PATIENT.1).await;

    let put = t
        .write(
            "PUT",
            &format!("/api/appointments/{foreign}"),
            Some(&session),
            json!({ "status": "cancelled" }),
        )
        .await;
    let delete = t
        .write(
            "DELETE",
            &format!("/api/appointments/{foreign}"),
            Some(&session),
            json!({}),
        )
        .await;

    assert_eq!(StatusCode::UNAUTHORIZED, put.status);
    assert_eq!(StatusCode::UNAUTHORIZED, delete.status);
    assert!(t.store.get_appointment(foreign).await.unwrap().is_some());
}

#[tokio::test]
async fn patient_can_cancel_own_appointment() {
    let t = test_app().await;
    let me = t.user_id(PATIENT.0).await;
    let mine = t.book(me, None).await;
    let session = t.login(PATIENT.0, PATIENT.1).await;

    let reply = t
        .write(
            "PUT",
            &format!("/api/appointments/{mine}"),
            Some(&session),
            json!({ "status": "cancelled", "patientId": Uuid::now_v7() }),
        )
        .await;

    assert_eq!(StatusCode::OK, reply.status, "{}", reply.body);
    assert_eq!("cancelled", reply.body["appointment"]["status"]);
    assert_eq!(me.to_string(), reply.body["appointment"]["patientId"]);
}

#[tokio::test]
async fn unknown_appointment_is_404() {
    let t = test_app().await;
    let session = t.login(ADMIN.0, ADMIN.1).await;
    let reply = t
        .write(
            "DELETE",
            &format!("/api/appointments/{}", Uuid::now_v7()),
            Some(&session),
            json!({}),
        )
        .await;
    assert_eq!(StatusCode::NOT_FOUND, reply.status);
}

#[tokio::test]
async fn mistyped_body_field_is_json_400() {
    let t = test_app().await;
    let session = t.login(RECEPTION.0, RECEPTION.1).await;
    let reply = t
        .post(
            "/api/appointments",
            Some(&session),
            json!({ "date": "tomorrow", "time": "10:00", "type": "Checkup" }),
        )
        .await;
    assert_eq!(StatusCode::BAD_REQUEST, reply.status);
    assert_eq!(
        Some("application/json"),
        reply
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    );
    assert_eq!("validation_error", reply.body["error"]);
    assert!(reply.body["message"].as_str().unwrap().contains("date"));
}

#[tokio::test]
async fn malformed_path_id_is_json_400() {
    let t = test_app().await;
    let session = t.login(ADMIN.0, ADMIN.1).await;
    let reply = t
        .write("DELETE", "/api/inventory/not-a-uuid", Some(&session), json!({}))
        .await;
    assert_eq!(StatusCode::BAD_REQUEST, reply.status);
    assert_eq!("validation_error", reply.body["error"]);
}

#[tokio::test]
async fn unknown_query_enum_is_json_400() {
    let t = test_app().await;
    let session = t.login(ADMIN.0, ADMIN.1).await;
    let reply = t.get("/api/invoices?status=lost", Some(&session)).await;
    assert_eq!(StatusCode::BAD_REQUEST, reply.status);
    assert_eq!("validation_error", reply.body["error"]);
}

// ---------------------------------------------------------------------------
// Write allow-sets
// ---------------------------------------------------------------------------

fn gauze() -> Value {
    json!({
        "name": "Gauze",
        "category": "Surgical",
        "currentStock": 40,
        "minStock": 10,
        "maxStock": 200,
        "unit": "packs",
        "cost": 4.5
    })
}

#[tokio::test]
async fn patient_cannot_create_inventory() {
    let t = test_app().await;
    let session = t.login(PATIENT.0, PATIENT.1).await;
    let reply = t.post("/api/inventory", Some(&session), gauze()).await;

    assert_eq!(StatusCode::UNAUTHORIZED, reply.status);
    assert_eq!(2, t.store.list_inventory().await.unwrap().len());
}

#[tokio::test]
async fn receptionist_can_create_inventory() {
    let t = test_app().await;
    let session = t.login(RECEPTION.0, RECEPTION.1).await;
    let reply = t.post("/api/inventory", Some(&session), gauze()).await;

    assert_eq!(StatusCode::OK, reply.status, "{}", reply.body);
    assert_eq!("Gauze", reply.body["item"]["name"]);
    assert_eq!(3, t.store.list_inventory().await.unwrap().len());
}

#[tokio::test]
async fn non_admin_cannot_create_users() {
    let t = test_app().await;
    let before = t.store.count_users().await.unwrap();
    for (email, password) in [DENTIST, RECEPTION] {
        let session = t.login(email, password).await;
        let reply = t
            .post(
                "/api/users",
                Some(&session),
                json!({
                    "email": "x@clinic.com",
                    "password": "pw",
                    "firstName": "X",
                    "lastName": "Y",
                    "role": "admin"
                }),
            )
            .await;
        assert_eq!(StatusCode::UNAUTHORIZED, reply.status, "as {email}");
    }
    assert_eq!(before, t.store.count_users().await.unwrap());
}

#[tokio::test]
async fn admin_manages_users() {
    let t = test_app().await;
    let session = t.login(ADMIN.0, ADMIN.1).await;

    let created = t
        .post(
            "/api/users",
            Some(&session),
            json!({
                "email": "hygienist@clinic.com",
                "password": "clean123",
                "firstName": "Hana",
                "lastName": "Ito",
                "role": "dentist"
            }),
        )
        .await;
    assert_eq!(StatusCode::OK, created.status, "{}", created.body);
    assert!(created.body["user"].get("passwordHash").is_none());

    let dentists = t.get("/api/users?role=dentist", Some(&session)).await;
    assert_eq!(2, dentists.body.as_array().unwrap().len());

    let id = created.body["user"]["id"].as_str().unwrap().to_string();
    let deleted = t
        .write("DELETE", &format!("/api/users/{id}"), Some(&session), json!({}))
        .await;
    assert_eq!(StatusCode::OK, deleted.status);
    assert!(t.store.find_user_by_email("hygienist@clinic.com").await.unwrap().is_none());
}

#[tokio::test]
async fn patient_sees_only_own_invoices() {
    let t = test_app().await;
    let me = t.user_id(PATIENT.0).await;
    let admin = t.login(ADMIN.0, ADMIN.1).await;
    for patient in [me, Uuid::now_v7()] {
        let reply = t
            .post(
                "/api/invoices",
                Some(&admin),
                json!({
                    "patientId": patient,
                    "amount": 120.0,
                    "description": "Filling",
                    "dueDate": "2026-08-01"
                }),
            )
            .await;
        assert_eq!(StatusCode::OK, reply.status, "{}", reply.body);
    }

    let session = t.login(PATIENT.0, PATIENT.1).await;
    let reply = t.get("/api/invoices", Some(&session)).await;
    let rows = reply.body.as_array().expect("array");
    assert_eq!(1, rows.len());
    assert_eq!("John Smith", rows[0]["patientName"]);

    let posted = t
        .post(
            "/api/invoices",
            Some(&session),
            json!({
                "patientId": me,
                "amount": 0.0,
                "description": "Free",
                "dueDate": "2026-08-01"
            }),
        )
        .await;
    assert_eq!(StatusCode::UNAUTHORIZED, posted.status);
}

#[tokio::test]
async fn dentist_records_treatment_as_self() {
    let t = test_app().await;
    let dentist = t.user_id(DENTIST.0).await;
    let patient = t.user_id(PATIENT.0).await;
    let session = t.login(DENTIST.0, DENTIST.1).await;

    let reply = t
        .post(
            "/api/treatments",
            Some(&session),
            json!({
                "patientId": patient,
                "dentistId": Uuid::now_v7(),
                "type": "Root canal",
                "description": "Molar 36",
                "cost": 650.0
            }),
        )
        .await;
    assert_eq!(StatusCode::OK, reply.status, "{}", reply.body);
    assert_eq!(dentist.to_string(), reply.body["treatment"]["dentistId"]);

    let patient_session = t.login(PATIENT.0, PATIENT.1).await;
    let history = t.get("/api/treatments", Some(&patient_session)).await;
    assert_eq!(1, history.body.as_array().unwrap().len());

    let refused = t
        .post(
            "/api/treatments",
            Some(&patient_session),
            json!({ "patientId": patient, "type": "X", "description": "Y" }),
        )
        .await;
    assert_eq!(StatusCode::UNAUTHORIZED, refused.status);
}

// ---------------------------------------------------------------------------
// Dashboard, seed, health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_dashboard_counts() {
    let t = test_app().await;
    let session = t.login(ADMIN.0, ADMIN.1).await;
    let reply = t.get("/api/dashboard/stats", Some(&session)).await;

    assert_eq!(StatusCode::OK, reply.status);
    assert_eq!(1, reply.body["totalPatients"]);
    assert_eq!(3, reply.body["totalStaff"]);
    assert_eq!(1, reply.body["lowStockAlerts"]);
}

#[tokio::test]
async fn patient_dashboard_shape() {
    let t = test_app().await;
    let session = t.login(PATIENT.0, PATIENT.1).await;
    let reply = t.get("/api/dashboard/stats", Some(&session)).await;

    assert_eq!(StatusCode::OK, reply.status);
    assert!(reply.body.get("upcomingAppointments").is_some());
    assert!(reply.body.get("outstandingBalance").is_some());
    assert!(reply.body.get("totalStaff").is_none());
}

#[tokio::test]
async fn seed_is_idempotent() {
    let t = test_app().await;
    let reply = t.post("/api/seed", None, json!({})).await;
    assert_eq!(StatusCode::OK, reply.status);
    assert_eq!("Database already seeded", reply.body["message"]);
}

#[tokio::test]
async fn seed_is_forbidden_in_production() {
    let t = test_app_with(true).await;
    let reply = t.post("/api/seed", None, json!({})).await;
    assert_eq!(StatusCode::FORBIDDEN, reply.status);
    assert_eq!("forbidden", reply.body["error"]);
}

#[tokio::test]
async fn health_reports_store() {
    let t = test_app().await;
    let reply = t.get("/api/health", None).await;
    assert_eq!(StatusCode::OK, reply.status);
    assert_eq!(true, reply.body["storeConnected"]);
    assert_eq!(clinic_core::version(), reply.body["version"]);
}

#[tokio::test]
async fn unknown_api_route_is_json_404() {
    let t = test_app().await;
    let reply = t.get("/api/nowhere", None).await;
    assert_eq!(StatusCode::NOT_FOUND, reply.status);
    assert_eq!("not_found", reply.body["error"]);
}

#[test]
fn role_names_match_portal_segments() {
    for role in Role::ALL {
        assert_eq!(format!("/{role}/dashboard"), role.dashboard_path());
    }
}
