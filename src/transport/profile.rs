use serde::Deserialize;

use super::send_sms::TransportError;

/// Decoded body of `GET /a1/me`. Only the billing currency is used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileJsonResponse {
    pub currency: String,
}

pub fn decode_profile_json_response(json: &str) -> Result<ProfileJsonResponse, TransportError> {
    Ok(serde_json::from_str(json)?)
}
