use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    routing::post,
};

use crate::{
    app::AppState,
    auth::Identity,
    common::{ApiError, ApiResponse, ApiResult},
    params::Multipart,
    upload::StoredFile,
};

const IMAGE_FIELD: &str = "image";

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn routes(max_file_size: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(upload_image))
        .layer(DefaultBodyLimit::max(max_file_size + MULTIPART_OVERHEAD))
}

async fn upload_image(
    State(state): State<AppState>,
    actor: Identity,
    Multipart(mut multipart): Multipart,
) -> ApiResult<ApiResponse<StoredFile>> {
    actor.require_vendor_or_admin()?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or(IMAGE_FIELD).to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;

        let stored = state
            .uploads
            .store(&file_name, &content_type, bytes.to_vec())
            .await?;

        return Ok(ApiResponse::created("Image uploaded", stored));
    }

    Err(ApiError::validation("No image uploaded"))
}
