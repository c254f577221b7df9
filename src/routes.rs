// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{context, ingest, meta, student, teacher},
    state::AppState,
};

/// Largest accepted request body: a `.docx` or an image as a data URL.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Assembles the main application router.
///
/// * Teacher and student flows each own a session resource.
/// * Context ingestion is shared by both under `/api/sessions/{id}/context`.
/// * Applies global middleware (Trace, CORS, body limit).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    let ingest_routes = Router::new()
        .route("/docx", post(ingest::docx_to_text))
        .route("/image", post(ingest::image_to_text));

    let teacher_routes = Router::new()
        .route("/", post(teacher::create_session))
        .route(
            "/{id}",
            get(teacher::get_session)
                .patch(teacher::update_session)
                .delete(teacher::delete_session),
        )
        .route("/{id}/generate", post(teacher::generate_questions));

    let student_routes = Router::new()
        .route("/", post(student::create_session))
        .route(
            "/{id}",
            get(student::get_session)
                .patch(student::update_setup)
                .delete(student::delete_session),
        )
        .route(
            "/{id}/question-types/{question_type}",
            post(student::toggle_question_type),
        )
        .route("/{id}/start", post(student::start_test))
        .route("/{id}/answer", put(student::set_answer))
        .route("/{id}/submit", post(student::submit_answer))
        .route("/{id}/next", post(student::next_question))
        .route("/{id}/reset", post(student::reset_session))
        .route("/{id}/results", get(student::get_results));

    let context_routes = Router::new()
        .route("/docx", post(context::upload_docx))
        .route("/image", post(context::upload_image))
        .route(
            "/crop",
            post(context::confirm_crop).delete(context::cancel_crop),
        )
        .route(
            "/camera",
            post(context::open_camera).delete(context::close_camera),
        )
        .route("/camera/capture", post(context::capture_frame));

    Router::new()
        .route("/api/meta", get(meta::get_meta))
        .nest("/api/ingest", ingest_routes)
        .nest("/api/teacher/sessions", teacher_routes)
        .nest("/api/student/sessions", student_routes)
        .nest("/api/sessions/{id}/context", context_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let state = AppState::from_config(Config::with_api_key("test-key")).unwrap();
        let app = create_router(state);

        let request = Request::post("/api/ingest/docx")
            .body(Body::from(vec![0u8; MAX_UPLOAD_BYTES + 1]))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
