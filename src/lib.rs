//! Send SMS through an HTTP gateway and report what it cost.
//!
//! The crate is split the usual way: a domain layer of gateway-agnostic types and the
//! [`SmsApi`] contract, a transport layer for wire-format quirks, and a client layer with
//! the [46elks](https://46elks.com) binding, [`ElksClient`].
//!
//! ```rust,no_run
//! use telegraf::{Credentials, ElksClient, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ElksClient::new(Credentials::new("u...", "..."));
//!     let msg = Message::new("Telegraf", "+46700000000", "Hello, upper east side")?;
//!     let resp = client.send(&msg).await?;
//!     println!("Sent message for {}.", resp.cost_to_string());
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod client;
pub mod domain;
mod transport;

pub use client::{Credentials, ElksClient, ElksClientBuilder, ElksError};
pub use domain::{Amount, ApiResponse, BoxFuture, Currency, Message, SmsApi, ValidationError};
