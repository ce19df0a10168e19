//! Body schemas used by the HTTP routes.

use serde::Deserialize;
use validator::Validate;

use super::BodySchema;

/// Text fields sent alongside profile image uploads.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfileBody {
    #[serde(rename = "firstName", default)]
    #[validate(
        required(message = "\"firstName\" is required"),
        length(min = 1, message = "\"firstName\" is not allowed to be empty")
    )]
    pub first_name: Option<String>,

    /// May be empty
    #[serde(rename = "lastName", default)]
    pub last_name: Option<String>,
}

impl BodySchema for ProfileBody {
    const FIELDS: &'static [(&'static str, &'static str)] =
        &[("first_name", "firstName"), ("last_name", "lastName")];
}

/// Request for a one-time verification code.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OtpRequest {
    #[serde(default)]
    #[validate(
        required(message = "\"email\" is required"),
        email(message = "\"email\" must be a valid email")
    )]
    pub email: Option<String>,
}

impl BodySchema for OtpRequest {
    const FIELDS: &'static [(&'static str, &'static str)] = &[("email", "email")];
}
