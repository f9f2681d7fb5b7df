use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    routing, Extension, Router,
};
use mailform_core_contact_contracts::{ContactFeatureService, ContactSubmitError};
use tracing::debug;

use crate::{errors, middlewares::client_ip::ClientIp, models::contact::ApiContactSubmission};

/// Bound on waiting for a caller that never finishes its body; slow or
/// truncated bodies degrade to the empty submission instead of hanging.
const BODY_READ_TIMEOUT: Duration = Duration::from_millis(50);
const BODY_SIZE_LIMIT: usize = 64 * 1024;

pub fn router(service: Arc<impl ContactFeatureService>, expose_detail: bool) -> Router<()> {
    Router::new()
        .route(
            "/api/contact",
            routing::post(submit)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .with_state(ContactState {
            service,
            expose_detail,
        })
}

struct ContactState<C> {
    service: Arc<C>,
    expose_detail: bool,
}

impl<C> Clone for ContactState<C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            expose_detail: self.expose_detail,
        }
    }
}

async fn submit(
    State(ContactState {
        service,
        expose_detail,
    }): State<ContactState<impl ContactFeatureService>>,
    Extension(ClientIp(client_ip)): Extension<ClientIp>,
    request: Request,
) -> Response {
    let submission = read_submission(request).await.into();

    match service.submit(submission, client_ip).await {
        Ok(()) => errors::ok("Email sent"),
        Err(ContactSubmitError::Invalid(errors)) => errors::validation_failed(errors),
        Err(ContactSubmitError::RateLimited) => errors::rate_limited(),
        Err(ContactSubmitError::NotConfigured) => errors::mailer_not_configured(expose_detail),
        Err(ContactSubmitError::Unreachable(err)) => {
            errors::bad_gateway("Failed to connect to mail server.", expose_detail, err)
        }
        Err(ContactSubmitError::Send(err)) => {
            errors::bad_gateway("Failed to send email.", expose_detail, err)
        }
        Err(ContactSubmitError::Other(err)) => errors::internal_server_error(expose_detail, err),
    }
}

/// Reads and decodes the request body leniently: malformed, oversized or
/// stalled bodies yield the empty submission, which then fails validation
/// with actionable messages instead of an opaque transport error.
async fn read_submission(request: Request) -> ApiContactSubmission {
    let body = axum::body::to_bytes(request.into_body(), BODY_SIZE_LIMIT);
    let bytes = match tokio::time::timeout(BODY_READ_TIMEOUT, body).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(err)) => {
            debug!("failed to read request body: {err}");
            return Default::default();
        }
        Err(_) => {
            debug!("timed out reading request body");
            return Default::default();
        }
    };

    serde_json::from_slice(&bytes).unwrap_or_else(|err| {
        debug!("failed to decode request body: {err}");
        Default::default()
    })
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn method_not_allowed() -> Response {
    let mut response = errors::failure(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("POST, OPTIONS"));
    response
}
