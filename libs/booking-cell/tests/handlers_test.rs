use std::sync::Arc;

use assert_matches::assert_matches;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::Json;
use chrono::{Duration, SecondsFormat, Timelike, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::handlers::{create_appointment, get_appointments, update_appointment_status};
use booking_cell::models::{AppointmentStatus, CreateAppointmentRequest, UpdateStatusRequest};
use booking_cell::services::publisher::NotificationPublisher;
use booking_cell::BookingState;
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, MockStoreResponses, TestConfig, TestUser};

/// Both the auth service and the appointment store live behind the same mock
/// server; their path prefixes never collide.
fn state_for(server: &MockServer) -> BookingState {
    let config = TestConfig::default()
        .with_store_url(&server.uri())
        .with_auth_service_url(&server.uri())
        .to_arc();
    BookingState::new(config, Arc::new(NotificationPublisher::disabled()))
}

fn auth_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers
}

async fn mount_identity(server: &MockServer, user: &TestUser) {
    Mock::given(method("GET"))
        .and(path("/api/auth"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::identity_response(user)),
        )
        .mount(server)
        .await;
}

async fn mount_doctor(server: &MockServer, doctor: &TestUser) {
    Mock::given(method("GET"))
        .and(path(format!("/api/doctors/{}", doctor.id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockStoreResponses::doctor_response(doctor)),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_create_appointment_starts_pending() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let patient = TestUser::patient("patient@example.com");
    let doctor = TestUser::doctor("doctor@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &state.config.jwt_secret, Some(24));
    let slot = Utc::now() + Duration::days(2);

    mount_identity(&server, &patient).await;
    mount_doctor(&server, &doctor).await;

    // No active appointment at the slot.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::appointment_row(
                Uuid::new_v4(),
                patient.id,
                doctor.id,
                &slot.to_rfc3339(),
                "PENDING",
            )
        ])))
        .mount(&server)
        .await;

    let result = create_appointment(
        State(state),
        auth_headers(&token),
        Json(CreateAppointmentRequest {
            doctor_id: doctor.id,
            date_time: slot,
            notes: Some("first visit".to_string()),
        }),
    )
    .await;

    let (status, Json(body)) = result.expect("create should succeed");
    assert_eq!(status, axum::http::StatusCode::CREATED);
    assert_eq!(body["message"], "Appointment created successfully");
    assert_eq!(body["appointment"]["status"], "PENDING");
    assert_eq!(
        body["appointment"]["patientId"],
        json!(patient.id.to_string())
    );
    // The create response does not echo updatedAt.
    assert!(body["appointment"].get("updatedAt").is_none());
}

#[tokio::test]
async fn test_create_appointment_conflicting_slot_rejected() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let patient = TestUser::patient("patient@example.com");
    let doctor = TestUser::doctor("doctor@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &state.config.jwt_secret, Some(24));
    let slot = Utc::now() + Duration::days(2);

    mount_identity(&server, &patient).await;
    mount_doctor(&server, &doctor).await;

    // Another patient already holds the slot with a live status.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                Uuid::new_v4(),
                Uuid::new_v4(),
                doctor.id,
                &slot.to_rfc3339(),
                "CONFIRMED",
            )
        ])))
        .mount(&server)
        .await;

    let result = create_appointment(
        State(state),
        auth_headers(&token),
        Json(CreateAppointmentRequest {
            doctor_id: doctor.id,
            date_time: slot,
            notes: None,
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::Conflict(msg)) if msg == "This time slot is not available");
}

#[tokio::test]
async fn test_create_appointment_cancelled_slot_is_free() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let patient = TestUser::patient("patient@example.com");
    let doctor = TestUser::doctor("doctor@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &state.config.jwt_secret, Some(24));
    let slot = Utc::now() + Duration::days(2);

    mount_identity(&server, &patient).await;
    mount_doctor(&server, &doctor).await;

    // The slot filter excludes terminal statuses server-side, so a cancelled
    // booking never comes back from the conflict query.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .and(query_param("status", "not.in.(CANCELLED,NO_SHOW)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::appointment_row(
                Uuid::new_v4(),
                patient.id,
                doctor.id,
                &slot.to_rfc3339(),
                "PENDING",
            )
        ])))
        .mount(&server)
        .await;

    let result = create_appointment(
        State(state),
        auth_headers(&token),
        Json(CreateAppointmentRequest {
            doctor_id: doctor.id,
            date_time: slot,
            notes: None,
        }),
    )
    .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_create_appointment_rejects_past_time() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let patient = TestUser::patient("patient@example.com");
    let doctor = TestUser::doctor("doctor@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &state.config.jwt_secret, Some(24));

    mount_identity(&server, &patient).await;
    mount_doctor(&server, &doctor).await;

    let result = create_appointment(
        State(state),
        auth_headers(&token),
        Json(CreateAppointmentRequest {
            doctor_id: doctor.id,
            date_time: Utc::now() - Duration::hours(1),
            notes: None,
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_doctor_resolved_before_time_validation() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let patient = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &state.config.jwt_secret, Some(24));
    let doctor_id = Uuid::new_v4();

    mount_identity(&server, &patient).await;

    Mock::given(method("GET"))
        .and(path(format!("/api/doctors/{}", doctor_id)))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "Doctor not found" })),
        )
        .mount(&server)
        .await;

    // Unknown doctor plus a past dateTime reports the doctor first.
    let result = create_appointment(
        State(state),
        auth_headers(&token),
        Json(CreateAppointmentRequest {
            doctor_id,
            date_time: Utc::now() - Duration::hours(1),
            notes: None,
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::NotFound(msg)) if msg == "Doctor not found");
}

#[tokio::test]
async fn test_subsecond_slot_still_conflicts() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let patient = TestUser::patient("patient@example.com");
    let doctor = TestUser::doctor("doctor@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &state.config.jwt_secret, Some(24));
    let slot = (Utc::now() + Duration::days(2))
        .with_nanosecond(500_000_000)
        .unwrap();
    let stored = slot.to_rfc3339_opts(SecondsFormat::AutoSi, true);

    mount_identity(&server, &patient).await;
    mount_doctor(&server, &doctor).await;

    // The conflict query must carry the full-precision timestamp; a truncated
    // filter would miss this mock, fall through to the store 404, and book the
    // taken slot.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .and(query_param("date_time", format!("eq.{}", stored)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                Uuid::new_v4(),
                Uuid::new_v4(),
                doctor.id,
                &stored,
                "PENDING",
            )
        ])))
        .mount(&server)
        .await;

    let result = create_appointment(
        State(state),
        auth_headers(&token),
        Json(CreateAppointmentRequest {
            doctor_id: doctor.id,
            date_time: slot,
            notes: None,
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::Conflict(msg)) if msg == "This time slot is not available");
}

#[tokio::test]
async fn test_create_appointment_unknown_doctor() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let patient = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &state.config.jwt_secret, Some(24));
    let doctor_id = Uuid::new_v4();

    mount_identity(&server, &patient).await;

    Mock::given(method("GET"))
        .and(path(format!("/api/doctors/{}", doctor_id)))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "Doctor not found" })),
        )
        .mount(&server)
        .await;

    let result = create_appointment(
        State(state),
        auth_headers(&token),
        Json(CreateAppointmentRequest {
            doctor_id,
            date_time: Utc::now() + Duration::days(1),
            notes: None,
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::NotFound(msg)) if msg == "Doctor not found");
}

#[tokio::test]
async fn test_create_appointment_rejected_token() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    // Auth service refuses the token; booking maps it to 401.
    Mock::given(method("GET"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid token" })))
        .mount(&server)
        .await;

    let result = create_appointment(
        State(state),
        auth_headers("some-stale-token"),
        Json(CreateAppointmentRequest {
            doctor_id: Uuid::new_v4(),
            date_time: Utc::now() + Duration::days(1),
            notes: None,
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::Auth(msg)) if msg == "Invalid user token");
}

#[tokio::test]
async fn test_create_appointment_missing_header() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let result = create_appointment(
        State(state),
        HeaderMap::new(),
        Json(CreateAppointmentRequest {
            doctor_id: Uuid::new_v4(),
            date_time: Utc::now() + Duration::days(1),
            notes: None,
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::Auth(_)));
}

#[tokio::test]
async fn test_get_appointments_filters_by_patient() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let patient = TestUser::patient("patient@example.com");
    let doctor_id = Uuid::new_v4();
    let token = JwtTestUtils::create_test_token(&patient, &state.config.jwt_secret, Some(24));

    mount_identity(&server, &patient).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("eq.{}", patient.id)))
        .and(query_param("order", "date_time.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                Uuid::new_v4(),
                patient.id,
                doctor_id,
                "2026-09-10T10:00:00Z",
                "CONFIRMED",
            ),
            MockStoreResponses::appointment_row(
                Uuid::new_v4(),
                patient.id,
                doctor_id,
                "2026-09-01T10:00:00Z",
                "PENDING",
            )
        ])))
        .mount(&server)
        .await;

    let result = get_appointments(State(state), auth_headers(&token)).await;

    let Json(body) = result.expect("list should succeed");
    assert_eq!(body["message"], "Appointments retrieved successfully");
    let appointments = body["appointments"].as_array().unwrap();
    assert_eq!(appointments.len(), 2);
    assert_eq!(appointments[0]["status"], "CONFIRMED");
    assert!(appointments[0].get("updatedAt").is_some());
}

#[tokio::test]
async fn test_get_appointments_filters_by_doctor() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let doctor = TestUser::doctor("doctor@example.com");
    let token = JwtTestUtils::create_test_token(&doctor, &state.config.jwt_secret, Some(24));

    mount_identity(&server, &doctor).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = get_appointments(State(state), auth_headers(&token)).await;

    let Json(body) = result.expect("list should succeed");
    assert_eq!(body["appointments"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_doctor_confirms_pending_appointment() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let doctor = TestUser::doctor("doctor@example.com");
    let patient_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();
    let token = JwtTestUtils::create_test_token(&doctor, &state.config.jwt_secret, Some(24));

    mount_identity(&server, &doctor).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                appointment_id,
                patient_id,
                doctor.id,
                "2026-09-10T10:00:00Z",
                "PENDING",
            )
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                appointment_id,
                patient_id,
                doctor.id,
                "2026-09-10T10:00:00Z",
                "CONFIRMED",
            )
        ])))
        .mount(&server)
        .await;

    let result = update_appointment_status(
        State(state),
        auth_headers(&token),
        Path(appointment_id),
        Json(UpdateStatusRequest {
            status: AppointmentStatus::Confirmed,
        }),
    )
    .await;

    let Json(body) = result.expect("update should succeed");
    assert_eq!(body["message"], "Appointment status updated successfully");
    assert_eq!(body["appointment"]["status"], "CONFIRMED");
    assert!(body["appointment"].get("updatedAt").is_some());
}

#[tokio::test]
async fn test_backward_transition_rejected() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let doctor = TestUser::doctor("doctor@example.com");
    let appointment_id = Uuid::new_v4();
    let token = JwtTestUtils::create_test_token(&doctor, &state.config.jwt_secret, Some(24));

    mount_identity(&server, &doctor).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                appointment_id,
                Uuid::new_v4(),
                doctor.id,
                "2026-09-10T10:00:00Z",
                "COMPLETED",
            )
        ])))
        .mount(&server)
        .await;

    // No PATCH may reach the store for a rejected transition.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let result = update_appointment_status(
        State(state),
        auth_headers(&token),
        Path(appointment_id),
        Json(UpdateStatusRequest {
            status: AppointmentStatus::Confirmed,
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::InvalidStatus(_)));
}

#[tokio::test]
async fn test_patient_cannot_confirm() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let patient = TestUser::patient("patient@example.com");
    let appointment_id = Uuid::new_v4();
    let token = JwtTestUtils::create_test_token(&patient, &state.config.jwt_secret, Some(24));

    mount_identity(&server, &patient).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                appointment_id,
                patient.id,
                Uuid::new_v4(),
                "2026-09-10T10:00:00Z",
                "PENDING",
            )
        ])))
        .mount(&server)
        .await;

    let result = update_appointment_status(
        State(state),
        auth_headers(&token),
        Path(appointment_id),
        Json(UpdateStatusRequest {
            status: AppointmentStatus::Confirmed,
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::InvalidStatus(_)));
}

#[tokio::test]
async fn test_patient_cancels_own_pending_appointment() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let patient = TestUser::patient("patient@example.com");
    let appointment_id = Uuid::new_v4();
    let token = JwtTestUtils::create_test_token(&patient, &state.config.jwt_secret, Some(24));

    mount_identity(&server, &patient).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                appointment_id,
                patient.id,
                Uuid::new_v4(),
                "2026-09-10T10:00:00Z",
                "PENDING",
            )
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                appointment_id,
                patient.id,
                Uuid::new_v4(),
                "2026-09-10T10:00:00Z",
                "CANCELLED",
            )
        ])))
        .mount(&server)
        .await;

    let result = update_appointment_status(
        State(state),
        auth_headers(&token),
        Path(appointment_id),
        Json(UpdateStatusRequest {
            status: AppointmentStatus::Cancelled,
        }),
    )
    .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_non_participant_cannot_update() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let outsider = TestUser::patient("other@example.com");
    let appointment_id = Uuid::new_v4();
    let token = JwtTestUtils::create_test_token(&outsider, &state.config.jwt_secret, Some(24));

    mount_identity(&server, &outsider).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                appointment_id,
                Uuid::new_v4(),
                Uuid::new_v4(),
                "2026-09-10T10:00:00Z",
                "PENDING",
            )
        ])))
        .mount(&server)
        .await;

    let result = update_appointment_status(
        State(state),
        auth_headers(&token),
        Path(appointment_id),
        Json(UpdateStatusRequest {
            status: AppointmentStatus::Cancelled,
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::Forbidden(msg)) if msg == "Not authorized to update this appointment");
}

#[tokio::test]
async fn test_update_missing_appointment() {
    let server = MockServer::start().await;
    let state = state_for(&server);

    let doctor = TestUser::doctor("doctor@example.com");
    let appointment_id = Uuid::new_v4();
    let token = JwtTestUtils::create_test_token(&doctor, &state.config.jwt_secret, Some(24));

    mount_identity(&server, &doctor).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = update_appointment_status(
        State(state),
        auth_headers(&token),
        Path(appointment_id),
        Json(UpdateStatusRequest {
            status: AppointmentStatus::Confirmed,
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::NotFound(msg)) if msg == "Appointment not found");
}
