//! Tests for `AppError` → HTML error page mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no router is
//! involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use logtrigger_api::backend::GatewayError;
use logtrigger_api::error::AppError;
use logtrigger_core::error::CoreError;

/// Status, `x-error-code` header and HTML body of an error response.
async fn render(err: AppError) -> (StatusCode, String, String) {
    let response = err.into_response();
    let status = response.status();
    let code = response
        .headers()
        .get("x-error-code")
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, code, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn invalid_field_returns_400_naming_the_field() {
    let err = AppError::Core(CoreError::invalid_field("priority", "must be one of [0, 1]"));

    let (status, code, html) = render(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code, "VALIDATION_ERROR");
    assert!(html.contains("Incorrect value for field &quot;priority&quot;"));
}

#[tokio::test]
async fn access_denied_returns_403_with_generic_message() {
    let (status, code, html) = render(AppError::Core(CoreError::access_denied())).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(code, "FORBIDDEN");
    assert!(html.contains("No permissions to referred object or it does not exist!"));
}

#[tokio::test]
async fn unauthorized_returns_401() {
    let err = AppError::Core(CoreError::Unauthorized("Missing Authorization header".into()));

    let (status, code, _) = render(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code, "UNAUTHORIZED");
}

#[tokio::test]
async fn rejected_mutation_returns_409() {
    let err = AppError::Gateway(GatewayError::Rejected("Trigger exists".into()));

    let (status, code, html) = render(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code, "REJECTED");
    assert!(html.contains("Trigger exists"));
}

#[tokio::test]
async fn missing_row_returns_404() {
    let err = AppError::Gateway(GatewayError::Database(sqlx::Error::RowNotFound));

    let (status, code, _) = render(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(code, "NOT_FOUND");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::Core(CoreError::Internal("secret database credentials leaked".into()));

    let (status, code, html) = render(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(code, "INTERNAL_ERROR");
    assert!(!html.contains("secret"));
    assert!(html.contains("An internal error occurred"));
}
