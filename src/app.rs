use std::sync::Arc;

use axum::{
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{questions, users};
use crate::identity::IdentityProvider;
use crate::middleware::auth;
use crate::services::{ProfileStore, QuestionStore};

/// Process-wide dependencies, initialized once at startup and injected
/// into handlers and middleware. Trait objects so tests can substitute
/// fakes.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub questions: Arc<dyn QuestionStore>,
    pub profiles: Arc<dyn ProfileStore>,
}

pub fn app(state: AppState) -> Router {
    let question_routes = Router::new()
        .route("/questions", get(questions::list).post(questions::create))
        .route(
            "/questions/:id",
            put(questions::update).delete(questions::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let profile_routes = Router::new()
        .route(
            "/user/profile",
            get(users::profile_get).put(users::profile_put),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    // Admin routes: authentication runs first, then the role gate.
    let admin_routes = Router::new()
        .route("/user/all", get(users::list_users))
        .route("/user/:uid", get(users::get_user))
        .route("/user/:uid/roles", post(users::update_roles))
        .route("/user/:uid/status", put(users::update_status))
        .route_layer(middleware::from_fn(auth::require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(question_routes)
        .merge(profile_routes)
        .merge(admin_routes)
        // Best-effort principal resolution for every route
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::attach_user_optional,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": chrono::Utc::now() }))
}
