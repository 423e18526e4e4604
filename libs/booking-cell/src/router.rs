use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers;
use crate::BookingState;

pub fn appointment_routes(state: BookingState) -> Router {
    Router::new()
        .route("/", get(handlers::get_appointments))
        .route("/", post(handlers::create_appointment))
        .route("/{appointment_id}", patch(handlers::update_appointment_status))
        .with_state(state)
}
