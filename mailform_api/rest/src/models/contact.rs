use mailform_models::contact::ContactSubmission;
use serde::Deserialize;

/// Raw contact form body. Missing fields default to empty strings so partial
/// or malformed bodies surface as validation errors instead of transport
/// errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiContactSubmission {
    pub name: String,
    pub email: String,
    pub service: String,
    pub message: String,
}

impl From<ApiContactSubmission> for ContactSubmission {
    fn from(value: ApiContactSubmission) -> Self {
        ContactSubmission::new(value.name, value.email, value.service, value.message)
    }
}
