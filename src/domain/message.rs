use crate::domain::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// A single outbound SMS.
///
/// Invariant: `from`, `to` and `body` are non-empty after trimming. The values are stored as
/// provided; no phone number normalization is performed, the gateway is expected to reject
/// malformed numbers.
pub struct Message {
    from: String,
    to: String,
    body: String,
}

impl Message {
    /// Field name used for the sender.
    pub const FROM_FIELD: &'static str = "from";
    /// Field name used for the recipient.
    pub const TO_FIELD: &'static str = "to";
    /// Field name used for the text content.
    pub const BODY_FIELD: &'static str = "message";

    /// Create a validated message.
    ///
    /// `from` is typically an E.164 number such as `+18005551234` or an alphanumeric sender
    /// name; `to` is the recipient's E.164 number.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let from = non_empty(from.into(), Self::FROM_FIELD)?;
        let to = non_empty(to.into(), Self::TO_FIELD)?;
        let body = non_empty(body.into(), Self::BODY_FIELD)?;
        Ok(Self { from, to, body })
    }

    /// Sender identifier.
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Recipient phone number.
    pub fn to(&self) -> &str {
        &self.to
    }

    /// Text displayed to the recipient.
    pub fn body(&self) -> &str {
        &self.body
    }
}

fn non_empty(value: String, field: &'static str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(value)
}
