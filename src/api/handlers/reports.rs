use crate::{
    types::{AppError, Result},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
};
use std::path::Path as FsPath;

/// Serve a rendered report artifact (PDF or text) by file name.
pub async fn get_report(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse> {
    // The path parameter must stay a bare file name.
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(AppError::InvalidInput("Invalid report name".to_string()));
    }

    let path = FsPath::new(&state.config.storage.reports_dir).join(&filename);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| AppError::NotFound("Report not found".to_string()))?;

    let media_type = match path.extension().and_then(|e| e.to_str()) {
        Some("pdf") => "application/pdf",
        _ => "text/plain; charset=utf-8",
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(media_type)
            .map_err(|e| AppError::Internal(format!("Bad content type: {}", e)))?,
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("inline; filename=\"{}\"", filename))
            .map_err(|e| AppError::Internal(format!("Bad disposition: {}", e)))?,
    );

    Ok((headers, bytes))
}
