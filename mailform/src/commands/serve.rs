use std::net::SocketAddr;

use mailform_api_rest::{RestServer, RestServerConfig};
use mailform_config::Config;
use mailform_core_contact_impl::{ContactFeatureConfig, ContactFeatureServiceImpl};
use mailform_core_health_impl::{HealthFeatureConfig, HealthFeatureServiceImpl};
use mailform_ratelimit_memory::{InMemoryRateLimiter, RateLimiterConfig};
use mailform_shared_impl::time::TimeServiceImpl;
use tracing::{info, warn};

use crate::email;

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let (mailer, recipient) = match email::build(&config.smtp, &config.contact)? {
        Some((mailer, recipient)) => (Some(mailer), Some(recipient)),
        None => {
            warn!("smtp transport is not configured, contact submissions will be rejected");
            (None, None)
        }
    };

    let time = TimeServiceImpl;

    let rate_limiter = InMemoryRateLimiter::new(
        time,
        RateLimiterConfig {
            max_requests: config.rate_limit.max_requests,
            window: config.rate_limit.window,
        },
    );

    let contact = ContactFeatureServiceImpl::new(
        rate_limiter,
        mailer.clone(),
        ContactFeatureConfig { recipient },
    );

    let health = HealthFeatureServiceImpl::new(
        time,
        mailer,
        HealthFeatureConfig {
            cache_ttl: config.health.cache_ttl,
        },
    );

    let addr = SocketAddr::from((config.http.host, config.http.port));
    info!("Starting http server on {addr}");

    RestServer::new(
        health,
        contact,
        RestServerConfig {
            addr,
            expose_detail: config.debug,
        },
    )
    .serve()
    .await
}
