use crate::domain::money::Amount;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Gateway-agnostic result of a sent message.
pub struct ApiResponse {
    /// Provider-assigned identifier that can be used to track the sent message.
    pub remote_id: String,
    /// Cost of the sent message, `None` when the gateway does not price messages.
    pub cost: Option<Amount>,
}

impl ApiResponse {
    /// Format [`ApiResponse::cost`] for display; empty when there is no cost.
    pub fn cost_to_string(&self) -> String {
        self.cost
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}
