use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    images::{dto::UploadResponse, services::UploadedFile},
    state::AppState,
};

/// Above the 5 MB business limit so oversize files reach the service.
const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn images_routes() -> Router<AppState> {
    Router::new()
        .route("/upload/image", post(upload_image))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// POST /upload/image (multipart), field `image`
#[instrument(skip(state, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UploadResponse>> {
    let mut mp = mp?;
    let mut file = None;
    while let Some(field) = mp.next_field().await.map_err(malformed)? {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".into());
        let body = field.bytes().await.map_err(malformed)?;
        file = Some(UploadedFile {
            file_name,
            content_type,
            body,
        });
        break;
    }

    Ok(Json(state.uploads.upload_image(file).await?))
}

fn malformed(e: axum::extract::multipart::MultipartError) -> AppError {
    warn!(error = %e, "malformed multipart body");
    AppError::bad_request("Malformed multipart body")
}
