use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request},
    middleware::{from_fn, Next},
    response::Response,
    Router,
};

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
const UNKNOWN_CLIENT: &str = "unknown";

pub fn add<S: Clone + Send + Sync + 'static>(router: Router<S>) -> Router<S> {
    router.layer(from_fn(middleware))
}

async fn middleware(mut request: Request, next: Next) -> Response {
    let client_ip = ClientIp::from_request(&request);
    request.extensions_mut().insert(client_ip);
    next.run(request).await
}

/// Best-effort client identifier: the first comma-separated entry of the
/// forwarded-for header when present, the peer address otherwise. Spoofable
/// input; used as a rate-limit key and diagnostic hint, never authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIp(pub String);

impl ClientIp {
    fn from_request(request: &Request) -> Self {
        let forwarded = request
            .headers()
            .get(FORWARDED_FOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|entry| !entry.is_empty());
        if let Some(forwarded) = forwarded {
            return Self(forwarded.to_owned());
        }

        match request.extensions().get::<ConnectInfo<SocketAddr>>() {
            Some(ConnectInfo(addr)) => Self(addr.ip().to_string()),
            None => Self(UNKNOWN_CLIENT.to_owned()),
        }
    }
}
