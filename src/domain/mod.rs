//! Domain layer: gateway-agnostic types and the gateway contract (no I/O).

mod api;
mod message;
mod money;
mod response;
mod validation;

pub use api::{BoxFuture, SmsApi};
pub use message::Message;
pub use money::{Amount, Currency};
pub use response::ApiResponse;
pub use validation::ValidationError;
