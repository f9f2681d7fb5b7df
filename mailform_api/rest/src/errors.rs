use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::{ApiFailure, ApiSuccess};

pub fn ok(message: &'static str) -> Response {
    (
        StatusCode::OK,
        Json(ApiSuccess {
            success: true,
            message,
        }),
    )
        .into_response()
}

pub fn failure(code: StatusCode, message: &'static str) -> Response {
    (
        code,
        Json(ApiFailure {
            message: Some(message),
            ..Default::default()
        }),
    )
        .into_response()
}

pub fn validation_failed(errors: Vec<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiFailure {
            errors: Some(errors),
            ..Default::default()
        }),
    )
        .into_response()
}

pub fn rate_limited() -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ApiFailure {
            error: Some("RATE_LIMIT_EXCEEDED"),
            message: Some("Too many requests. Try again later."),
            ..Default::default()
        }),
    )
        .into_response()
}

pub fn mailer_not_configured(expose_detail: bool) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiFailure {
            message: Some("Mailer not configured on server."),
            error: Some("MISSING_SMTP_CONFIG"),
            detail: expose_detail
                .then(|| "Missing SMTP_HOST, SMTP_USER, or SMTP_PASS environment variables".into()),
            ..Default::default()
        }),
    )
        .into_response()
}

pub fn bad_gateway(message: &'static str, expose_detail: bool, err: anyhow::Error) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(ApiFailure {
            message: Some(message),
            detail: expose_detail.then(|| format!("{err:#}")),
            ..Default::default()
        }),
    )
        .into_response()
}

pub fn internal_server_error(expose_detail: bool, err: anyhow::Error) -> Response {
    tracing::error!("internal server error: {err:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiFailure {
            message: Some("Internal server error"),
            detail: expose_detail.then(|| format!("{err:#}")),
            ..Default::default()
        }),
    )
        .into_response()
}
