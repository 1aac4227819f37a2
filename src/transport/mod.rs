//! Transport layer: 46elks wire-format details (form encoding and JSON decoding).

mod profile;
mod send_sms;

pub use profile::decode_profile_json_response;
pub use send_sms::{SendSmsJsonResponse, decode_send_sms_json_response, encode_send_sms_form};
