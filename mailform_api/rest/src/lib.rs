use std::net::SocketAddr;

use axum::Router;
use mailform_core_contact_contracts::ContactFeatureService;
use mailform_core_health_contracts::HealthFeatureService;
use tokio::net::TcpListener;

mod errors;
mod middlewares;
mod models;
mod routes;

#[derive(Debug, Clone)]
pub struct RestServer<Health, Contact> {
    health: Health,
    contact: Contact,
    config: RestServerConfig,
}

#[derive(Debug, Clone)]
pub struct RestServerConfig {
    pub addr: SocketAddr,
    /// Include diagnostic `detail` strings in error responses. Off in
    /// production.
    pub expose_detail: bool,
}

impl<Health, Contact> RestServer<Health, Contact>
where
    Health: HealthFeatureService,
    Contact: ContactFeatureService,
{
    pub fn new(health: Health, contact: Contact, config: RestServerConfig) -> Self {
        Self {
            health,
            contact,
            config,
        }
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = self.config.addr;
        let router = self.router();
        let listener = TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(Into::into)
    }

    fn router(self) -> Router<()> {
        let expose_detail = self.config.expose_detail;

        let router = Router::new()
            .merge(routes::health::router(self.health.into()))
            .merge(routes::contact::router(self.contact.into(), expose_detail));

        // Layering order, innermost first: the trace span reads the client ip
        // and request id extensions, so those middlewares sit outside it; the
        // CORS headers go on the outside so even panic responses carry them.
        let router = middlewares::trace::add(router);
        let router = middlewares::client_ip::add(router);
        let router = middlewares::request_id::add(router);
        let router = middlewares::panic_handler::add(router, expose_detail);
        middlewares::cors::add(router)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use axum::{
        body::Body,
        http::{header, HeaderMap, Method, Request, StatusCode},
    };
    use mailform_core_contact_contracts::{ContactSubmitError, MockContactFeatureService};
    use mailform_core_health_contracts::{HealthStatus, MockHealthFeatureService};
    use mailform_models::contact::ContactSubmission;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use super::*;

    fn test_router(
        contact: MockContactFeatureService,
        health: MockHealthFeatureService,
        expose_detail: bool,
    ) -> Router<()> {
        RestServer::new(
            health,
            contact,
            RestServerConfig {
                addr: "127.0.0.1:0".parse().unwrap(),
                expose_detail,
            },
        )
        .router()
    }

    fn contact_router(contact: MockContactFeatureService, expose_detail: bool) -> Router<()> {
        test_router(contact, MockHealthFeatureService::new(), expose_detail)
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    fn valid_body() -> String {
        json!({"name": "Al", "email": "a@b.co", "service": "Web"}).to_string()
    }

    fn valid_submission() -> ContactSubmission {
        ContactSubmission::new("Al", "a@b.co", "Web", "")
    }

    async fn send(router: Router<()>, request: Request<Body>) -> (StatusCode, Value, HeaderMap) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body, headers)
    }

    fn assert_cors(headers: &HeaderMap) {
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert_eq!(
            headers.get("access-control-allow-methods").unwrap(),
            "GET, POST, OPTIONS"
        );
        assert_eq!(
            headers.get("access-control-allow-headers").unwrap(),
            "Content-Type, Authorization, X-Requested-With"
        );
    }

    #[tokio::test]
    async fn preflight() {
        let router = contact_router(MockContactFeatureService::new(), false);
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/contact")
            .body(Body::empty())
            .unwrap();

        let (status, body, headers) = send(router, request).await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn method_not_allowed() {
        let router = contact_router(MockContactFeatureService::new(), false);
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/contact")
            .body(Body::empty())
            .unwrap();

        let (status, body, headers) = send(router, request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body,
            json!({"success": false, "message": "Method not allowed"})
        );
        assert_eq!(headers.get(header::ALLOW).unwrap(), "POST, OPTIONS");
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn submit_ok() {
        let contact =
            MockContactFeatureService::new().with_submit(valid_submission(), "unknown", Ok(()));
        let router = contact_router(contact, false);

        let (status, body, headers) = send(router, post(&valid_body())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "message": "Email sent"}));
        assert!(headers.contains_key("x-request-id"));
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn client_ip_from_forwarded_header() {
        let contact =
            MockContactFeatureService::new().with_submit(valid_submission(), "9.9.9.9", Ok(()));
        let router = contact_router(contact, false);

        let mut request = post(&valid_body());
        request
            .headers_mut()
            .insert("x-forwarded-for", "9.9.9.9, 10.0.0.1".parse().unwrap());

        let (status, _, _) = send(router, request).await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn validation_failure() {
        let errors = vec!["A valid email address is required.".to_owned()];
        let contact = MockContactFeatureService::new().with_submit(
            ContactSubmission::new("Al", "nope", "Web", ""),
            "unknown",
            Err(ContactSubmitError::Invalid(errors)),
        );
        let router = contact_router(contact, false);

        let body = json!({"name": "Al", "email": "nope", "service": "Web"}).to_string();
        let (status, body, headers) = send(router, post(&body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"success": false, "errors": ["A valid email address is required."]})
        );
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn malformed_body_degrades_to_validation_errors() {
        let errors = vec![
            "Name is required and must be at least 2 characters.".to_owned(),
            "A valid email address is required.".to_owned(),
            "Please select a service.".to_owned(),
        ];
        let contact = MockContactFeatureService::new().with_submit(
            ContactSubmission::new("", "", "", ""),
            "unknown",
            Err(ContactSubmitError::Invalid(errors)),
        );
        let router = contact_router(contact, false);

        let (status, body, headers) = send(router, post("{not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["errors"].as_array().unwrap().len(), 3);
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn rate_limited() {
        let contact = MockContactFeatureService::new().with_submit(
            valid_submission(),
            "unknown",
            Err(ContactSubmitError::RateLimited),
        );
        let router = contact_router(contact, false);

        let (status, body, headers) = send(router, post(&valid_body())).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": "RATE_LIMIT_EXCEEDED",
                "message": "Too many requests. Try again later."
            })
        );
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn mailer_not_configured() {
        let contact = MockContactFeatureService::new().with_submit(
            valid_submission(),
            "unknown",
            Err(ContactSubmitError::NotConfigured),
        );
        let router = contact_router(contact, false);

        let (status, body, headers) = send(router, post(&valid_body())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({
                "success": false,
                "message": "Mailer not configured on server.",
                "error": "MISSING_SMTP_CONFIG"
            })
        );
        assert!(body.get("detail").is_none());
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn mailer_not_configured_exposes_detail_outside_production() {
        let contact = MockContactFeatureService::new().with_submit(
            valid_submission(),
            "unknown",
            Err(ContactSubmitError::NotConfigured),
        );
        let router = contact_router(contact, true);

        let (status, body, _) = send(router, post(&valid_body())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["detail"],
            json!("Missing SMTP_HOST, SMTP_USER, or SMTP_PASS environment variables")
        );
    }

    #[tokio::test]
    async fn mail_server_unreachable() {
        let contact = MockContactFeatureService::new().with_submit(
            valid_submission(),
            "unknown",
            Err(ContactSubmitError::Unreachable(anyhow!(
                "connection refused"
            ))),
        );
        let router = contact_router(contact, true);

        let (status, body, headers) = send(router, post(&valid_body())).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body,
            json!({
                "success": false,
                "message": "Failed to connect to mail server.",
                "detail": "connection refused"
            })
        );
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn send_failure_omits_detail_in_production() {
        let contact = MockContactFeatureService::new().with_submit(
            valid_submission(),
            "unknown",
            Err(ContactSubmitError::Send(anyhow!("mailbox unavailable"))),
        );
        let router = contact_router(contact, false);

        let (status, body, headers) = send(router, post(&valid_body())).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            body,
            json!({"success": false, "message": "Failed to send email."})
        );
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn unexpected_error() {
        let contact = MockContactFeatureService::new().with_submit(
            valid_submission(),
            "unknown",
            Err(ContactSubmitError::Other(anyhow!("boom"))),
        );
        let router = contact_router(contact, false);

        let (status, body, headers) = send(router, post(&valid_body())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"success": false, "message": "Internal server error"})
        );
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn panicking_handler_is_caught() {
        // No expectations: the first submit call panics inside the handler.
        let router = contact_router(MockContactFeatureService::new(), false);

        let (status, body, headers) = send(router, post(&valid_body())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"success": false, "message": "Internal server error"})
        );
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn health_ok() {
        let health = MockHealthFeatureService::new().with_get_status(HealthStatus { smtp: true });
        let router = test_router(MockContactFeatureService::new(), health, false);

        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let (status, body, headers) = send(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"http": true, "smtp": true}));
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn health_degraded() {
        let health = MockHealthFeatureService::new().with_get_status(HealthStatus { smtp: false });
        let router = test_router(MockContactFeatureService::new(), health, false);

        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let (status, body, _) = send(router, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"http": true, "smtp": false}));
    }
}
