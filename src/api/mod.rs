//! HTTP request helper for the property-management backend
//!
//! Every backend call goes through [`ApiClient::request`], which:
//! - injects `Authorization: Bearer <token>` from the session (read per call)
//! - sends JSON or multipart bodies (multipart leaves `Content-Type` to reqwest
//!   so the boundary is set correctly)
//! - races the exchange against a per-call timeout (default 30s)
//! - parses the body leniently and unwraps the `{ "data": ... }` envelope
//! - turns non-2xx responses into [`ApiError::Status`]
//! - on 401 clears the session and asks the UI to navigate to login
//!
//! There is no retry, queueing or de-duplication: each call is independent.

mod error;
mod multipart;
mod response;

pub use error::{normalize_validation_errors, ApiError, ValidationErrors};
pub use multipart::{FormPart, MultipartForm};
pub use reqwest::Method;
pub use response::{extract_embedded_json, parse_body, response_message, unwrap_envelope};

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::bus::{BusEvent, SharedBus};
use crate::config::Config;
use crate::routes::login_route;
use crate::session::Session;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Request payload
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Multipart(MultipartForm),
}

impl RequestBody {
    pub fn json<T: Serialize>(body: &T) -> Result<Self, ApiError> {
        serde_json::to_value(body)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::Encode(e.to_string()))
    }
}

impl From<MultipartForm> for RequestBody {
    fn from(form: MultipartForm) -> Self {
        RequestBody::Multipart(form)
    }
}

/// Per-call knobs
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Overrides the client default timeout
    pub timeout: Option<Duration>,
    /// Suppress success/error notifications
    pub silent: bool,
    /// Return the parsed body without unwrapping `data`
    pub raw: bool,
    /// Success toast text; otherwise the response `message` is used
    pub success_message: Option<String>,
    /// Attach the stored bearer token
    pub authenticated: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            silent: false,
            raw: false,
            success_message: None,
            authenticated: true,
        }
    }
}

impl RequestOptions {
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }

    pub fn raw() -> Self {
        Self {
            raw: true,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

/// Backend client. Cheap to clone; clones share the HTTP pool, session and bus.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Arc<str>,
    default_timeout: Duration,
    session: Session,
    bus: SharedBus,
}

impl ApiClient {
    pub fn new(
        base_url: impl AsRef<str>,
        session: Session,
        bus: SharedBus,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(concat!("estate-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: Arc::from(base_url.as_ref().trim_end_matches('/')),
            default_timeout: DEFAULT_TIMEOUT,
            session,
            bus,
        })
    }

    pub fn from_config(config: &Config, session: Session, bus: SharedBus) -> Result<Self, ApiError> {
        Ok(Self::new(&config.api_base_url, session, bus)?.with_default_timeout(config.request_timeout()))
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn bus(&self) -> &SharedBus {
        &self.bus
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join an endpoint onto the base URL with exactly one slash
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Issue a request and normalize the outcome.
    ///
    /// Returns the unwrapped payload (or the whole body with `raw`), or an
    /// [`ApiError`] with a consistent shape.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let url = self.url(endpoint);
        let timeout = options.timeout.unwrap_or(self.default_timeout);

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(ACCEPT, "application/json");

        let token = if options.authenticated {
            self.session.token()
        } else {
            None
        };
        let sent_token = token.is_some();
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        builder = match body {
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Multipart(form)) => match form.into_reqwest() {
                Ok(form) => builder.multipart(form),
                Err(e) => return Err(self.fail(e, &options)),
            },
            None => builder,
        };

        debug!(%method, endpoint, authenticated = sent_token, "API request");

        let exchange = async move {
            let response = builder.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        let (status, text) = match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) if e.is_timeout() => {
                return Err(self.fail(ApiError::Timeout { after: timeout }, &options))
            }
            Ok(Err(e)) => {
                warn!(%method, endpoint, "API network error: {}", e);
                return Err(self.fail(ApiError::Network(e.to_string()), &options));
            }
            Err(_) => {
                warn!(%method, endpoint, timeout_ms = timeout.as_millis() as u64, "API request timed out");
                return Err(self.fail(ApiError::Timeout { after: timeout }, &options));
            }
        };

        debug!(%method, endpoint, status = status.as_u16(), "API response");

        self.handle_response(&method, status, &text, &options)
    }

    fn handle_response(
        &self,
        method: &Method,
        status: StatusCode,
        text: &str,
        options: &RequestOptions,
    ) -> Result<Value, ApiError> {
        let parsed = parse_body(text);

        if status.is_success() {
            let Some(parsed) = parsed else {
                return Err(self.fail(
                    ApiError::InvalidJson {
                        status: status.as_u16(),
                    },
                    options,
                ));
            };

            if !options.silent && *method != Method::GET {
                let message = options
                    .success_message
                    .clone()
                    .or_else(|| response_message(&parsed));
                if let Some(message) = message {
                    self.bus.publish(BusEvent::success(message));
                }
            }

            return Ok(if options.raw {
                parsed
            } else {
                unwrap_envelope(parsed)
            });
        }

        let err = ApiError::from_status(status.as_u16(), status.canonical_reason(), parsed.as_ref());

        // Any 401 on an authenticated call ends the session, token or not
        if status == StatusCode::UNAUTHORIZED && options.authenticated {
            self.expire_session();
            return Err(err);
        }

        warn!(status = status.as_u16(), "API error: {}", err);
        Err(self.fail(err, options))
    }

    /// Session rejected: drop whatever is stored and send the user back to
    /// login. No error toast; `SessionCleared` only when keys were removed.
    fn expire_session(&self) {
        let role = self.session.role();
        match self.session.clear() {
            Ok(true) => self.bus.publish(BusEvent::SessionCleared),
            Ok(false) => {}
            Err(e) => warn!("Failed to clear session after 401: {}", e),
        }
        self.bus.publish(BusEvent::Navigate {
            route: login_route(role),
        });
    }

    fn fail(&self, err: ApiError, options: &RequestOptions) -> ApiError {
        if !options.silent {
            self.bus.publish(BusEvent::error(err.user_message()));
        }
        err
    }

    /// Same as [`request`](Self::request), deserializing the payload
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let value = self.request(method, endpoint, body, options).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request_as(Method::GET, endpoint, None, RequestOptions::default())
            .await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = RequestBody::json(body)?;
        self.request_as(Method::POST, endpoint, Some(body), RequestOptions::default())
            .await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = RequestBody::json(body)?;
        self.request_as(Method::PUT, endpoint, Some(body), RequestOptions::default())
            .await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = RequestBody::json(body)?;
        self.request_as(Method::PATCH, endpoint, Some(body), RequestOptions::default())
            .await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, endpoint, None, RequestOptions::default())
            .await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: MultipartForm,
    ) -> Result<T, ApiError> {
        self.request_as(
            Method::POST,
            endpoint,
            Some(form.into()),
            RequestOptions::default(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::create_bus;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Session::in_memory(), create_bus()).unwrap()
    }

    #[test]
    fn url_joins_with_single_slash() {
        let api = client("http://localhost:8000/api/");
        assert_eq!(
            api.url("/property-manager/leads"),
            "http://localhost:8000/api/property-manager/leads"
        );
        assert_eq!(api.url("owner/signin"), "http://localhost:8000/api/owner/signin");
    }

    #[test]
    fn absolute_urls_are_kept() {
        let api = client("http://localhost:8000/api");
        assert_eq!(api.url("https://cdn.example.com/x"), "https://cdn.example.com/x");
    }

    #[test]
    fn default_options() {
        let options = RequestOptions::default();
        assert!(options.authenticated);
        assert!(!options.silent);
        assert!(!options.raw);
        assert!(options.timeout.is_none());
    }

    #[test]
    fn from_config_uses_configured_timeout() {
        let config = Config {
            request_timeout_ms: 1234,
            ..Config::default()
        };
        let api = ApiClient::from_config(&config, Session::in_memory(), create_bus()).unwrap();
        assert_eq!(api.default_timeout, Duration::from_millis(1234));
        assert_eq!(api.base_url(), "http://localhost:8000/api");
    }

    #[test]
    fn json_body_encodes_structs() {
        #[derive(Serialize)]
        struct Lead {
            lead_type: &'static str,
        }
        let body = RequestBody::json(&Lead { lead_type: "Sale" }).unwrap();
        match body {
            RequestBody::Json(v) => assert_eq!(v["lead_type"], "Sale"),
            RequestBody::Multipart(_) => panic!("expected JSON body"),
        }
    }
}
