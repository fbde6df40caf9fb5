//! Request-level failures that end in the generic error page.

use api::{AuthError, StorageError};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::render::{HtmlRenderer, RenderError, Renderer, ViewData};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

const FALLBACK_PAGE: &str = "<!DOCTYPE html>\n<html><body><h1>Error</h1></body></html>\n";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        let body = HtmlRenderer
            .render("error", &ViewData::error())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_else(|| FALLBACK_PAGE.to_string());
        (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_failure_is_500() {
        let response =
            AppError::from(StorageError::Unavailable("pool timed out".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
