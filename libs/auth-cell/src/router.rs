use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login))
        .route("/doctors", get(handlers::list_doctors))
        .route("/doctors/signup", post(handlers::doctor_signup))
        .route("/doctors/login", post(handlers::doctor_login));

    let protected_routes = Router::new()
        .route("/auth", get(handlers::get_profile))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor))
        .route("/doctors/{doctor_id}", patch(handlers::update_doctor))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
