use std::future::Future;

use mailform_models::contact::ContactSubmission;
use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactFeatureService: Send + Sync + 'static {
    /// Runs one submission through the relay pipeline: validation, rate
    /// limiting, transport verification, send. `client_ip` is an
    /// unauthenticated hint used as the rate-limit key and echoed in the
    /// relayed email.
    fn submit(
        &self,
        submission: ContactSubmission,
        client_ip: String,
    ) -> impl Future<Output = Result<(), ContactSubmitError>> + Send;
}

#[derive(Debug, Error)]
pub enum ContactSubmitError {
    /// The submission failed validation; one message per violated rule.
    #[error("Submission is invalid.")]
    Invalid(Vec<String>),
    #[error("Rate limit exceeded.")]
    RateLimited,
    /// The SMTP transport is missing on the server side. Distinct from
    /// caller errors; no connection is ever attempted in this state.
    #[error("Mailer is not configured on the server.")]
    NotConfigured,
    #[error("Failed to connect to the mail server.")]
    Unreachable(anyhow::Error),
    #[error("Failed to send the email.")]
    Send(anyhow::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockContactFeatureService {
    pub fn with_submit(
        mut self,
        submission: ContactSubmission,
        client_ip: &'static str,
        result: Result<(), ContactSubmitError>,
    ) -> Self {
        self.expect_submit()
            .once()
            .withf(move |s, ip| *s == submission && ip.as_str() == client_ip)
            .return_once(move |_, _| Box::pin(std::future::ready(result)));
        self
    }
}
