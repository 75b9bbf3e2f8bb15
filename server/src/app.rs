use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use verstore::FileService;

use crate::handlers;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: FileService,
}

impl AppState {
    pub fn new(service: FileService) -> Self {
        Self { service }
    }
}

pub fn build_app(state: AppState, request_timeout_secs: u64, cors: bool) -> Router {
    let files = Router::new()
        .route(
            "/files/",
            get(handlers::list_files).put(handlers::save_root_file),
        )
        .route(
            "/files/{*path}",
            get(handlers::read_file)
                .put(handlers::save_file)
                .delete(handlers::delete_file),
        )
        .route("/uploadfiles/", post(handlers::upload_root_files))
        .route("/uploadfiles/{*dir}", post(handlers::upload_files))
        .route("/gitfiles/", get(handlers::list_remote_files))
        .route("/gitfiles/{*path}", get(handlers::read_remote_file))
        .with_state(state);

    let app = Router::new()
        .route("/livez", get(handlers::livez))
        .merge(files)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http());

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}
