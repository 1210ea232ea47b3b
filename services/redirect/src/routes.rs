//! Redirect service routes

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::GenerateRedirectResponse,
    state::AppState,
    upload,
    validation::RedirectTarget,
};

/// Create the router for the redirect service
///
/// Anything that is not an API route falls through to the public root, so
/// `/downloads/<file>` and `/uploads/<file>` are served straight from disk.
pub fn create_router(state: AppState) -> Router {
    let body_limit = match state.upload_limit {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };
    let public_files = ServeDir::new(state.storage.root());

    Router::new()
        .route("/health", get(health_check))
        .route("/generate-redirect", post(generate_redirect))
        .layer(body_limit)
        .fallback_service(public_files)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "redirect-service"
    }))
}

/// Store the uploaded image and generate its redirect document
#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn generate_redirect(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let multipart = multipart.map_err(|e| {
        error!("Rejected non-multipart request: {}", e);
        ApiError::InternalServerError
    })?;

    let form = upload::receive(multipart, &state.storage)
        .await
        .map_err(|e| {
            error!("Failed to receive upload: {}", e);
            ApiError::InternalServerError
        })?;

    let target = RedirectTarget::parse(form.redirect_url.as_deref()).inspect_err(|e| {
        warn!("Rejected redirect URL: {}", e);
    })?;

    let image = form.image.ok_or_else(|| {
        error!("Upload did not include an '{}' field", upload::IMAGE_FIELD);
        ApiError::InternalServerError
    })?;
    info!("Stored {} byte image as {}", image.size, image.filename);

    let page = state
        .generator
        .generate(&image.path, &target)
        .await
        .map_err(|e| {
            error!("Error generating redirect: {}", e);
            ApiError::InternalServerError
        })?;
    info!("Generated redirect document {}", page.filename);

    Ok(Json(GenerateRedirectResponse {
        download_url: page.download_url,
        filename: page.filename,
    }))
}
