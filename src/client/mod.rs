//! Client layer: the 46elks gateway binding, orchestrating transport calls and mapping
//! transport ↔ domain.

use std::error::Error as StdError;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::{Amount, ApiResponse, BoxFuture, Currency, Message, SmsApi};
use crate::transport::{
    SendSmsJsonResponse, decode_profile_json_response, decode_send_sms_json_response,
    encode_send_sms_form,
};

mod credentials;

use credentials::BasicAuth;
pub use credentials::{Credentials, SECRET_ENV, USERNAME_ENV};

const DEFAULT_SMS_ENDPOINT: &str = "https://api.46elks.com/a1/sms";
const DEFAULT_PROFILE_ENDPOINT: &str = "https://api.46elks.com/a1/me";

/// 46elks reports message costs in ten-thousandths of the account currency.
const ELKS_COST_FACTOR: NonZeroU64 = match NonZeroU64::new(10_000) {
    Some(factor) => factor,
    None => panic!("cost factor must be non-zero"),
};

#[derive(Debug, Clone)]
struct HttpResponse {
    status: u16,
    body: String,
}

trait HttpTransport: Send + Sync {
    fn post_form<'a>(
        &'a self,
        url: &'a str,
        auth: BasicAuth<'a>,
        params: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>>;

    fn get<'a>(
        &'a self,
        url: &'a str,
        auth: BasicAuth<'a>,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>>;
}

#[derive(Debug, Clone)]
struct ReqwestTransport {
    client: reqwest::Client,
}

impl HttpTransport for ReqwestTransport {
    fn post_form<'a>(
        &'a self,
        url: &'a str,
        auth: BasicAuth<'a>,
        params: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
        Box::pin(async move {
            let response = self
                .client
                .post(url)
                .basic_auth(auth.username, Some(auth.secret))
                .form(&params)
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(HttpResponse { status, body })
        })
    }

    fn get<'a>(
        &'a self,
        url: &'a str,
        auth: BasicAuth<'a>,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .basic_auth(auth.username, Some(auth.secret))
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(HttpResponse { status, body })
        })
    }
}

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`ElksClient`].
///
/// No error is retried. When the message was accepted but the currency lookup failed, the
/// lookup error is returned even though the SMS is already on its way.
pub enum ElksError {
    /// The username or secret is empty. Reported before any request is made.
    #[error("46elks credentials must be set: {field} is empty")]
    MissingCredentials { field: &'static str },

    /// A configured endpoint is not a valid absolute URL.
    #[error("invalid endpoint URL {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    /// HTTP client / transport failure (DNS, TLS, timeouts, etc).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// Non-successful HTTP status code returned by the server.
    #[error("unexpected HTTP status: {status}")]
    HttpStatus { status: u16, body: Option<String> },

    /// Response body could not be parsed as the expected JSON document.
    #[error("parse error: {0}")]
    Parse(#[source] Box<dyn StdError + Send + Sync>),

    /// The send response carried an empty message id.
    #[error("46elks response did not include a message id")]
    MissingRemoteId,

    /// The account is billed in a currency this crate does not know.
    #[error("unknown currency {code}")]
    UnknownCurrency { code: String },
}

#[derive(Debug, Clone)]
/// Builder for [`ElksClient`].
///
/// Use this when you need to customize the endpoints, timeout, or user-agent.
pub struct ElksClientBuilder {
    credentials: Credentials,
    sms_endpoint: String,
    profile_endpoint: String,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ElksClientBuilder {
    /// Create a builder with the default endpoints and no timeout/user-agent override.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            sms_endpoint: DEFAULT_SMS_ENDPOINT.to_owned(),
            profile_endpoint: DEFAULT_PROFILE_ENDPOINT.to_owned(),
            timeout: None,
            user_agent: None,
        }
    }

    /// Point both endpoints at another API root, e.g. `https://api.46elks.com/a1`.
    pub fn endpoint_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        let base = base.trim_end_matches('/');
        self.sms_endpoint = format!("{base}/sms");
        self.profile_endpoint = format!("{base}/me");
        self
    }

    /// Override the endpoint URL used to send messages.
    pub fn sms_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.sms_endpoint = endpoint.into();
        self
    }

    /// Override the endpoint URL used to read the account profile.
    pub fn profile_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.profile_endpoint = endpoint.into();
        self
    }

    /// Set an HTTP client timeout applied to each request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the HTTP `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build an [`ElksClient`].
    pub fn build(self) -> Result<ElksClient, ElksError> {
        validate_endpoint(&self.sms_endpoint)?;
        validate_endpoint(&self.profile_endpoint)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder
            .build()
            .map_err(|err| ElksError::Transport(Box::new(err)))?;

        Ok(ElksClient {
            credentials: self.credentials,
            sms_endpoint: self.sms_endpoint,
            profile_endpoint: self.profile_endpoint,
            http: Arc::new(ReqwestTransport { client }),
        })
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), ElksError> {
    url::Url::parse(endpoint)
        .map(|_| ())
        .map_err(|source| ElksError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            source,
        })
}

#[derive(Clone)]
/// SMS gateway binding for [46elks](https://46elks.com).
///
/// Sending a message takes two sequential requests:
/// - `POST https://api.46elks.com/a1/sms` to send the message,
/// - `GET https://api.46elks.com/a1/me` to learn the account's billing currency.
pub struct ElksClient {
    credentials: Credentials,
    sms_endpoint: String,
    profile_endpoint: String,
    http: Arc<dyn HttpTransport>,
}

impl ElksClient {
    /// Create a client using the default endpoints.
    ///
    /// For more customization, use [`ElksClient::builder`].
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            sms_endpoint: DEFAULT_SMS_ENDPOINT.to_owned(),
            profile_endpoint: DEFAULT_PROFILE_ENDPOINT.to_owned(),
            http: Arc::new(ReqwestTransport {
                client: reqwest::Client::new(),
            }),
        }
    }

    /// Create a client with credentials read from [`USERNAME_ENV`] and [`SECRET_ENV`].
    pub fn from_env() -> Self {
        Self::new(Credentials::from_env())
    }

    /// Start building a client with custom settings.
    pub fn builder(credentials: Credentials) -> ElksClientBuilder {
        ElksClientBuilder::new(credentials)
    }

    /// Send an SMS and price it in the account's billing currency.
    ///
    /// Errors:
    /// - [`ElksError::MissingCredentials`] before any request when a credential is empty,
    /// - [`ElksError::Transport`], [`ElksError::HttpStatus`] or [`ElksError::Parse`] when
    ///   either request fails,
    /// - [`ElksError::UnknownCurrency`] when the account currency is not supported.
    pub async fn send(&self, message: &Message) -> Result<ApiResponse, ElksError> {
        let auth = self
            .credentials
            .basic_auth()
            .map_err(|field| ElksError::MissingCredentials { field })?;

        let sent = self.send_sms(auth, message).await?;

        let currency = match self.fetch_currency(auth).await {
            Ok(currency) => currency,
            Err(err) => {
                warn!(
                    remote_id = %sent.id,
                    error = %err,
                    "message was sent but its cost could not be resolved"
                );
                return Err(err);
            }
        };

        let cost = Amount::from_minor_units(currency, sent.cost, ELKS_COST_FACTOR);
        info!(remote_id = %sent.id, %cost, "sent SMS via 46elks");

        Ok(ApiResponse {
            remote_id: sent.id,
            cost: Some(cost),
        })
    }

    async fn send_sms(
        &self,
        auth: BasicAuth<'_>,
        message: &Message,
    ) -> Result<SendSmsJsonResponse, ElksError> {
        debug!(
            endpoint = %self.sms_endpoint,
            to = %mask_phone_number(message.to()),
            "posting SMS"
        );

        let response = self
            .http
            .post_form(&self.sms_endpoint, auth, encode_send_sms_form(message))
            .await
            .map_err(ElksError::Transport)?;
        let body = success_body(response)?;

        let parsed = decode_send_sms_json_response(&body)
            .map_err(|err| ElksError::Parse(Box::new(err)))?;

        if parsed.id.trim().is_empty() {
            return Err(ElksError::MissingRemoteId);
        }

        Ok(parsed)
    }

    async fn fetch_currency(&self, auth: BasicAuth<'_>) -> Result<Currency, ElksError> {
        debug!(endpoint = %self.profile_endpoint, "fetching account currency");

        let response = self
            .http
            .get(&self.profile_endpoint, auth)
            .await
            .map_err(ElksError::Transport)?;
        let body = success_body(response)?;

        let profile = decode_profile_json_response(&body)
            .map_err(|err| ElksError::Parse(Box::new(err)))?;

        Currency::from_code(&profile.currency).ok_or_else(|| ElksError::UnknownCurrency {
            code: profile.currency,
        })
    }
}

impl SmsApi for ElksClient {
    type Error = ElksError;

    fn send<'a>(&'a self, message: &'a Message) -> BoxFuture<'a, Result<ApiResponse, ElksError>> {
        Box::pin(ElksClient::send(self, message))
    }
}

fn success_body(response: HttpResponse) -> Result<String, ElksError> {
    if !(200..=299).contains(&response.status) {
        let body = if response.body.trim().is_empty() {
            None
        } else {
            Some(response.body)
        };
        return Err(ElksError::HttpStatus {
            status: response.status,
            body,
        });
    }
    Ok(response.body)
}

/// Keep only the last four characters of a phone number for logs.
fn mask_phone_number(phone: &str) -> String {
    const VISIBLE: usize = 4;

    let chars = phone.chars().collect::<Vec<_>>();
    if chars.len() <= VISIBLE {
        return "*".repeat(chars.len());
    }

    let masked = chars.len() - VISIBLE;
    let tail = chars[masked..].iter().collect::<String>();
    if phone.starts_with('+') {
        format!("+{}{tail}", "*".repeat(masked - 1))
    } else {
        format!("{}{tail}", "*".repeat(masked))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Method {
        Get,
        Post,
    }

    #[derive(Debug, Clone)]
    struct RecordedCall {
        method: Method,
        url: String,
        username: String,
        secret: String,
        params: Vec<(String, String)>,
    }

    #[derive(Debug, Clone)]
    struct FakeTransport {
        state: Arc<Mutex<FakeTransportState>>,
    }

    #[derive(Debug, Default)]
    struct FakeTransportState {
        calls: Vec<RecordedCall>,
        responses: VecDeque<Result<(u16, String), String>>,
    }

    impl FakeTransport {
        fn new() -> Self {
            Self {
                state: Arc::new(Mutex::new(FakeTransportState::default())),
            }
        }

        fn respond(self, status: u16, body: impl Into<String>) -> Self {
            self.state
                .lock()
                .unwrap()
                .responses
                .push_back(Ok((status, body.into())));
            self
        }

        fn fail(self, message: impl Into<String>) -> Self {
            self.state
                .lock()
                .unwrap()
                .responses
                .push_back(Err(message.into()));
            self
        }

        fn calls(&self) -> Vec<RecordedCall> {
            self.state.lock().unwrap().calls.clone()
        }

        fn record(
            &self,
            method: Method,
            url: &str,
            auth: BasicAuth<'_>,
            params: Vec<(String, String)>,
        ) -> Result<HttpResponse, Box<dyn StdError + Send + Sync>> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(RecordedCall {
                method,
                url: url.to_owned(),
                username: auth.username.to_owned(),
                secret: auth.secret.to_owned(),
                params,
            });
            match state.responses.pop_front() {
                Some(Ok((status, body))) => Ok(HttpResponse { status, body }),
                Some(Err(message)) => Err(message.into()),
                None => Err("no scripted response left".into()),
            }
        }
    }

    impl HttpTransport for FakeTransport {
        fn post_form<'a>(
            &'a self,
            url: &'a str,
            auth: BasicAuth<'a>,
            params: Vec<(String, String)>,
        ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
            Box::pin(async move { self.record(Method::Post, url, auth, params) })
        }

        fn get<'a>(
            &'a self,
            url: &'a str,
            auth: BasicAuth<'a>,
        ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
            Box::pin(async move { self.record(Method::Get, url, auth, Vec::new()) })
        }
    }

    const SMS_URL: &str = "https://example.invalid/a1/sms";
    const PROFILE_URL: &str = "https://example.invalid/a1/me";

    fn make_client(credentials: Credentials, transport: FakeTransport) -> ElksClient {
        ElksClient {
            credentials,
            sms_endpoint: SMS_URL.to_owned(),
            profile_endpoint: PROFILE_URL.to_owned(),
            http: Arc::new(transport),
        }
    }

    fn credentials() -> Credentials {
        Credentials::new("u0123456789abcdef", "secret")
    }

    fn message() -> Message {
        Message::new("Telegraf", "+46700000000", "Hello, upper east side").unwrap()
    }

    fn assert_param(params: &[(String, String)], key: &str, value: &str) {
        assert!(
            params.iter().any(|(k, v)| k == key && v == value),
            "missing param {key}={value}; got: {params:?}"
        );
    }

    #[tokio::test]
    async fn send_returns_remote_id_and_cost_in_account_currency() {
        let transport = FakeTransport::new()
            .respond(200, r#"{"id": "X", "cost": 12345}"#)
            .respond(200, r#"{"currency": "SEK"}"#);
        let client = make_client(credentials(), transport.clone());

        let response = client.send(&message()).await.unwrap();
        assert_eq!(
            response,
            ApiResponse {
                remote_id: "X".to_owned(),
                cost: Some(Amount::from_minor_units(
                    Currency::Sek,
                    12_345,
                    ELKS_COST_FACTOR
                )),
            }
        );
        assert_eq!(response.cost_to_string(), "SEK 1.23");

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);

        assert_eq!(calls[0].method, Method::Post);
        assert_eq!(calls[0].url, SMS_URL);
        assert_eq!(calls[0].username, "u0123456789abcdef");
        assert_eq!(calls[0].secret, "secret");
        assert_param(&calls[0].params, "from", "Telegraf");
        assert_param(&calls[0].params, "to", "+46700000000");
        assert_param(&calls[0].params, "message", "Hello, upper east side");

        assert_eq!(calls[1].method, Method::Get);
        assert_eq!(calls[1].url, PROFILE_URL);
        assert_eq!(calls[1].username, "u0123456789abcdef");
        assert_eq!(calls[1].secret, "secret");
    }

    #[tokio::test]
    async fn send_maps_each_known_currency() {
        for (code, currency) in [
            ("SEK", Currency::Sek),
            ("EUR", Currency::Eur),
            ("USD", Currency::Usd),
        ] {
            let transport = FakeTransport::new()
                .respond(200, r#"{"id": "X", "cost": 3500}"#)
                .respond(200, format!(r#"{{"currency": "{code}"}}"#));
            let client = make_client(credentials(), transport);

            let response = client.send(&message()).await.unwrap();
            assert_eq!(response.cost.map(|cost| cost.currency()), Some(currency));
        }
    }

    #[tokio::test]
    async fn send_rejects_unknown_currency() {
        let transport = FakeTransport::new()
            .respond(200, r#"{"id": "X", "cost": 12345}"#)
            .respond(200, r#"{"currency": "GBP"}"#);
        let client = make_client(credentials(), transport);

        let err = client.send(&message()).await.unwrap_err();
        assert!(err.to_string().contains("GBP"), "{err}");
        match err {
            ElksError::UnknownCurrency { code } => assert_eq!(code, "GBP"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_requires_credentials_before_any_request() {
        for creds in [
            Credentials::new("", "secret"),
            Credentials::new("user", ""),
            Credentials::default(),
        ] {
            let transport = FakeTransport::new();
            let client = make_client(creds, transport.clone());

            let err = client.send(&message()).await.unwrap_err();
            assert!(matches!(err, ElksError::MissingCredentials { .. }));
            assert!(err.to_string().contains("credentials must be set"));
            assert!(transport.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn send_stops_after_transport_failure() {
        let transport = FakeTransport::new()
            .fail("connection refused")
            .respond(200, r#"{"currency": "SEK"}"#);
        let client = make_client(credentials(), transport.clone());

        let err = client.send(&message()).await.unwrap_err();
        match err {
            ElksError::Transport(source) => assert_eq!(source.to_string(), "connection refused"),
            other => panic!("unexpected error: {other:?}"),
        }

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, Method::Post);
    }

    #[tokio::test]
    async fn send_reports_failure_when_currency_lookup_fails_after_sending() {
        let transport = FakeTransport::new()
            .respond(200, r#"{"id": "X", "cost": 12345}"#)
            .fail("connection reset");
        let client = make_client(credentials(), transport.clone());

        let err = client.send(&message()).await.unwrap_err();
        assert!(matches!(err, ElksError::Transport(_)));
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn send_maps_non_success_http_status() {
        let transport = FakeTransport::new().respond(401, "Unauthorized");
        let client = make_client(credentials(), transport.clone());

        let err = client.send(&message()).await.unwrap_err();
        match err {
            ElksError::HttpStatus { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body.as_deref(), Some("Unauthorized"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn send_maps_empty_http_body_to_none() {
        let transport = FakeTransport::new()
            .respond(200, r#"{"id": "X", "cost": 12345}"#)
            .respond(503, "  ");
        let client = make_client(credentials(), transport);

        let err = client.send(&message()).await.unwrap_err();
        assert!(matches!(
            err,
            ElksError::HttpStatus {
                status: 503,
                body: None
            }
        ));
    }

    #[tokio::test]
    async fn send_maps_invalid_json_to_parse_error() {
        let transport = FakeTransport::new().respond(200, "{ not json }");
        let client = make_client(credentials(), transport);

        let err = client.send(&message()).await.unwrap_err();
        assert!(matches!(err, ElksError::Parse(_)));
    }

    #[tokio::test]
    async fn send_maps_invalid_profile_json_to_parse_error() {
        let transport = FakeTransport::new()
            .respond(200, r#"{"id": "X", "cost": 12345}"#)
            .respond(200, r#"{"displayname": "no currency"}"#);
        let client = make_client(credentials(), transport);

        let err = client.send(&message()).await.unwrap_err();
        assert!(matches!(err, ElksError::Parse(_)));
    }

    #[tokio::test]
    async fn send_rejects_empty_remote_id() {
        let transport = FakeTransport::new()
            .respond(200, r#"{"id": "", "cost": 12345}"#)
            .respond(200, r#"{"currency": "SEK"}"#);
        let client = make_client(credentials(), transport.clone());

        let err = client.send(&message()).await.unwrap_err();
        assert!(matches!(err, ElksError::MissingRemoteId));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn client_is_usable_as_dyn_sms_api() {
        let transport = FakeTransport::new()
            .respond(200, r#"{"id": "X", "cost": 0}"#)
            .respond(200, r#"{"currency": "EUR"}"#);
        let client = make_client(credentials(), transport);
        let api: Box<dyn SmsApi<Error = ElksError>> = Box::new(client);

        let response = api.send(&message()).await.unwrap();
        assert_eq!(response.remote_id, "X");
        assert_eq!(response.cost_to_string(), "EUR 0.00");
    }

    #[test]
    fn builder_endpoint_overrides_are_applied() {
        let client = ElksClient::builder(credentials())
            .endpoint_base("https://example.invalid/a1/")
            .build()
            .unwrap();
        assert_eq!(client.sms_endpoint, SMS_URL);
        assert_eq!(client.profile_endpoint, PROFILE_URL);

        let client = ElksClient::builder(credentials())
            .sms_endpoint("https://example.invalid/custom/sms")
            .profile_endpoint("https://example.invalid/custom/me")
            .timeout(Duration::from_secs(5))
            .user_agent("telegraf-test")
            .build()
            .unwrap();
        assert_eq!(client.sms_endpoint, "https://example.invalid/custom/sms");
        assert_eq!(client.profile_endpoint, "https://example.invalid/custom/me");
    }

    #[test]
    fn builder_rejects_invalid_endpoints() {
        let err = ElksClient::builder(credentials())
            .profile_endpoint("not a url")
            .build()
            .err()
            .unwrap();
        match err {
            ElksError::InvalidEndpoint { endpoint, .. } => assert_eq!(endpoint, "not a url"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn defaults_point_at_46elks() {
        let client = ElksClient::new(credentials());
        assert_eq!(client.sms_endpoint, "https://api.46elks.com/a1/sms");
        assert_eq!(client.profile_endpoint, "https://api.46elks.com/a1/me");
        assert!(validate_endpoint(&client.sms_endpoint).is_ok());
        assert!(validate_endpoint(&client.profile_endpoint).is_ok());
    }

    #[test]
    fn mask_phone_number_keeps_last_four() {
        assert_eq!(mask_phone_number("+46700000123"), "+*******0123");
        assert_eq!(mask_phone_number("0700000123"), "******0123");
        assert_eq!(mask_phone_number("123"), "***");
    }
}
