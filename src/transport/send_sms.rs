use serde::Deserialize;

use crate::domain::Message;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decoded body of `POST /a1/sms`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SendSmsJsonResponse {
    pub id: String,
    /// Cost in ten-thousandths of the account currency.
    pub cost: u64,
}

pub fn encode_send_sms_form(message: &Message) -> Vec<(String, String)> {
    vec![
        (Message::FROM_FIELD.to_owned(), message.from().to_owned()),
        (Message::TO_FIELD.to_owned(), message.to().to_owned()),
        (Message::BODY_FIELD.to_owned(), message.body().to_owned()),
    ]
}

pub fn decode_send_sms_json_response(json: &str) -> Result<SendSmsJsonResponse, TransportError> {
    Ok(serde_json::from_str(json)?)
}
