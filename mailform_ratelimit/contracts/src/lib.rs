use std::future::Future;

/// Admission control for contact submissions, partitioned by caller key.
///
/// The key is a best-effort client identifier (usually an IP address hint),
/// not a security boundary.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait RateLimiterService: Send + Sync + 'static {
    /// Decides whether a request from `key` is admitted and, if so, records
    /// the admission. Rejected attempts are not recorded.
    fn admit(&self, key: &str) -> impl Future<Output = bool> + Send;
}

#[cfg(feature = "mock")]
impl MockRateLimiterService {
    pub fn with_admit(mut self, key: &'static str, admitted: bool) -> Self {
        self.expect_admit()
            .once()
            .with(mockall::predicate::eq(key))
            .return_once(move |_| Box::pin(std::future::ready(admitted)));
        self
    }
}
