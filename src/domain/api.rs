use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;

use crate::domain::message::Message;
use crate::domain::response::ApiResponse;

/// Boxed future returned by object-safe async traits in this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A gateway able to send SMS messages.
///
/// Each call is an independent unit of work. Implementations report their own error type so
/// callers that care can match on it, while `dyn SmsApi<Error = E>` stays usable for callers
/// that only need a message.
pub trait SmsApi: Send + Sync {
    /// Error reported by this gateway.
    type Error: StdError + Send + Sync + 'static;

    /// Send `message` through the remote gateway, returning the tracking id and cost.
    fn send<'a>(
        &'a self,
        message: &'a Message,
    ) -> BoxFuture<'a, Result<ApiResponse, Self::Error>>;
}
