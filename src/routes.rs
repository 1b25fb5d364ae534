// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{catalog, session},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges the catalog and session sub-routers, all behind authentication.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (question bank, session store, config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let catalog_routes = Router::new()
        .route("/", get(catalog::list_subjects))
        .route("/{slug}/tests", get(catalog::list_tests))
        .route(
            "/{slug}/tests/{test_id}/sessions",
            post(session::start_session),
        );

    let session_routes = Router::new()
        .route(
            "/{id}",
            get(session::get_session).delete(session::delete_session),
        )
        .route("/{id}/answers", put(session::select_answer))
        .route("/{id}/navigate", post(session::navigate))
        .route("/{id}/next", post(session::next_question))
        .route("/{id}/previous", post(session::previous_question))
        .route("/{id}/panel", post(session::toggle_panel))
        .route("/{id}/submit", post(session::submit_session))
        .route("/{id}/result", get(session::get_result));

    // Every API route needs a signed-in user.
    let api_routes = Router::new()
        .nest("/subjects", catalog_routes)
        .nest("/sessions", session_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api", api_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
