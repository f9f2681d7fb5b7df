use serde::Serialize;

pub mod contact;

#[derive(Debug, Serialize)]
pub struct ApiSuccess {
    pub success: bool,
    pub message: &'static str,
}

/// Error body shared by every failure response; absent fields are omitted
/// from the wire format.
#[derive(Debug, Serialize)]
pub struct ApiFailure {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Default for ApiFailure {
    fn default() -> Self {
        Self {
            success: false,
            message: None,
            error: None,
            errors: None,
            detail: None,
        }
    }
}
