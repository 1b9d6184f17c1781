//! Role-based authentication
//!
//! Signin is either one step (credentials -> token) or two steps
//! (credentials -> OTP challenge -> token). Tokens are persisted in the
//! [`Session`](crate::session::Session) together with the role they were issued for.
//! There is no refresh: an expired token surfaces as a 401 and the API client
//! logs the user out.

mod role;

pub use role::{Role, UnknownRole};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};
use validator::Validate;

use crate::api::{
    response_message, ApiClient, ApiError, FormPart, Method, MultipartForm, RequestBody,
    RequestOptions, ValidationErrors,
};
use crate::bus::BusEvent;
use crate::models::{finish, require, validate_form, User};
use crate::routes::login_route;

/// Signin form
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct Credentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Enter a valid email address"))]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    pub remember_me: bool,
}

impl Credentials {
    pub fn email(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn phone(phone: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            phone: Some(phone.into()),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn remember(mut self, remember_me: bool) -> Self {
        self.remember_me = remember_me;
        self
    }

    fn check(&self) -> Result<(), ValidationErrors> {
        let mut extra = ValidationErrors::new();
        require(
            &mut extra,
            self.email.is_some() || self.phone.is_some(),
            "email",
            "Email or phone is required",
        );
        finish(validate_form(self), extra)
    }
}

/// Second signin step
#[derive(Debug, Clone, Default, Serialize)]
pub struct OtpVerification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub otp: String,
    #[serde(skip)]
    pub remember_me: bool,
}

impl OtpVerification {
    fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require(
            &mut errors,
            self.email.is_some() || self.phone.is_some(),
            "phone",
            "Email or phone is required",
        );
        require(
            &mut errors,
            !self.otp.trim().is_empty() && self.otp.trim().chars().all(|c| c.is_ascii_digit()),
            "otp",
            "Enter the code you received",
        );
        finish(Ok(()), errors)
    }
}

/// Where the OTP challenge was sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpDestination {
    Email(String),
    Phone(String),
    Unknown,
}

/// Result of a signin or signup
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// Token stored, session active
    Authenticated { user: Option<User> },
    /// Backend wants a one-time password first
    OtpRequired {
        destination: OtpDestination,
        message: Option<String>,
    },
    /// Account created, nothing to sign in with yet (signup only)
    Registered { message: Option<String> },
}

/// Signup form: JSON fields plus optional files (passport scan, company logo, ...)
#[derive(Debug, Clone, Default)]
pub struct Registration {
    fields: Map<String, Value>,
    files: Vec<FormPart>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn attach(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.files.push(FormPart::File {
            name: field.into(),
            file_name: file_name.into(),
            bytes,
            mime: None,
        });
        self
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    /// JSON when there are no files, multipart otherwise
    pub fn into_body(self) -> RequestBody {
        if self.files.is_empty() {
            return RequestBody::Json(Value::Object(self.fields));
        }

        let mut form = MultipartForm::new().json_fields(&Value::Object(self.fields));
        for file in self.files {
            form.push(file);
        }
        RequestBody::Multipart(form)
    }
}

/// Password reset with the code from the forgot-password mail
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct PasswordReset {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Reset code is required"))]
    pub token: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub password_confirmation: String,
}

/// Snapshot of the stored session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub role: Option<Role>,
    pub remember_me: bool,
}

/// Shape shared by signin, verify-otp and signup responses
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AuthPayload {
    #[serde(alias = "access_token")]
    token: Option<String>,
    user: Option<User>,
    #[serde(alias = "requires_otp")]
    otp_required: bool,
    email: Option<String>,
    phone: Option<String>,
    message: Option<String>,
}

impl AuthPayload {
    fn destination(&self) -> OtpDestination {
        match (&self.phone, &self.email) {
            (Some(phone), _) => OtpDestination::Phone(phone.clone()),
            (None, Some(email)) => OtpDestination::Email(email.clone()),
            (None, None) => OtpDestination::Unknown,
        }
    }
}

/// Auth operations for every role, on top of [`ApiClient`]
#[derive(Clone)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> AuthState {
        let session = self.api.session();
        AuthState {
            is_authenticated: session.is_authenticated(),
            role: session.role(),
            remember_me: session.remember_me(),
        }
    }

    /// POST `/{role}/signin`
    pub async fn login(&self, role: Role, credentials: &Credentials) -> Result<LoginOutcome, ApiError> {
        credentials.check().map_err(ApiError::Validation)?;

        let payload = self
            .call(role, "signin", RequestBody::json(credentials)?)
            .await?;

        if let Some(token) = payload.token.as_deref().filter(|t| !t.is_empty()) {
            self.start_session(token, role, credentials.remember_me)?;
            return Ok(LoginOutcome::Authenticated { user: payload.user });
        }

        // No token: either an explicit OTP flag or a bare destination hint
        let destination = payload.destination();
        if payload.otp_required || destination != OtpDestination::Unknown {
            debug!(role = role.as_path(), "Signin requires OTP");
            return Ok(LoginOutcome::OtpRequired {
                destination,
                message: payload.message,
            });
        }

        Err(ApiError::Decode(
            "signin response carried neither a token nor an OTP challenge".to_string(),
        ))
    }

    /// POST `/{role}/verify-otp`, completing a two-step signin
    pub async fn verify_otp(
        &self,
        role: Role,
        verification: &OtpVerification,
    ) -> Result<Option<User>, ApiError> {
        verification.check().map_err(ApiError::Validation)?;

        let payload = self
            .call(role, "verify-otp", RequestBody::json(verification)?)
            .await?;

        match payload.token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => {
                self.start_session(token, role, verification.remember_me)?;
                Ok(payload.user)
            }
            None => Err(ApiError::Decode(
                "OTP verification succeeded without a token".to_string(),
            )),
        }
    }

    /// POST `/{role}/resend-otp`
    pub async fn resend_otp(&self, role: Role, destination: &OtpDestination) -> Result<(), ApiError> {
        let body = match destination {
            OtpDestination::Email(email) => serde_json::json!({ "email": email }),
            OtpDestination::Phone(phone) => serde_json::json!({ "phone": phone }),
            OtpDestination::Unknown => {
                let mut errors = ValidationErrors::new();
                require(&mut errors, false, "phone", "Email or phone is required");
                return Err(ApiError::Validation(errors));
            }
        };
        self.call(role, "resend-otp", RequestBody::Json(body)).await?;
        Ok(())
    }

    /// POST `/{role}/signup`; multipart when files are attached
    pub async fn register(&self, role: Role, registration: Registration) -> Result<LoginOutcome, ApiError> {
        let multipart = registration.has_files();
        debug!(role = role.as_path(), multipart, "Submitting signup");

        let payload = self.call(role, "signup", registration.into_body()).await?;

        if let Some(token) = payload.token.as_deref().filter(|t| !t.is_empty()) {
            self.start_session(token, role, false)?;
            return Ok(LoginOutcome::Authenticated { user: payload.user });
        }
        if payload.otp_required {
            return Ok(LoginOutcome::OtpRequired {
                destination: payload.destination(),
                message: payload.message,
            });
        }
        Ok(LoginOutcome::Registered {
            message: payload.message,
        })
    }

    /// POST `/{role}/forgot-password`; returns the backend message
    pub async fn forgot_password(&self, role: Role, email: &str) -> Result<Option<String>, ApiError> {
        let body = RequestBody::Json(serde_json::json!({ "email": email }));
        let raw = self
            .api
            .request(
                Method::POST,
                &role.endpoint("forgot-password"),
                Some(body),
                RequestOptions::raw().unauthenticated(),
            )
            .await?;
        Ok(response_message(&raw))
    }

    /// POST `/{role}/reset-password`
    pub async fn reset_password(&self, role: Role, reset: &PasswordReset) -> Result<(), ApiError> {
        let mut extra = ValidationErrors::new();
        require(
            &mut extra,
            reset.password == reset.password_confirmation,
            "password_confirmation",
            "Passwords do not match",
        );
        finish(validate_form(reset), extra).map_err(ApiError::Validation)?;

        self.api
            .request(
                Method::POST,
                &role.endpoint("reset-password"),
                Some(RequestBody::json(reset)?),
                RequestOptions::default().unauthenticated(),
            )
            .await?;
        Ok(())
    }

    /// Best-effort server logout, then unconditional local clear and redirect
    pub async fn logout(&self) -> Result<(), ApiError> {
        let session = self.api.session();
        let role = session.role();

        if let (Some(role), true) = (role, session.is_authenticated()) {
            let result = self
                .api
                .request(
                    Method::POST,
                    &role.endpoint("logout"),
                    None,
                    RequestOptions::silent(),
                )
                .await;
            if let Err(e) = result {
                debug!("Server logout failed (ignored): {}", e);
            }
        }

        // A 401 from the logout call has already cleared the session and redirected
        if session.clear()? {
            self.api.bus().publish(BusEvent::SessionCleared);
            self.api.bus().publish(BusEvent::Navigate {
                route: login_route(role),
            });
        }

        info!("Logged out");
        Ok(())
    }

    async fn call(&self, role: Role, action: &str, body: RequestBody) -> Result<AuthPayload, ApiError> {
        self.api
            .request_as(
                Method::POST,
                &role.endpoint(action),
                Some(body),
                RequestOptions::default().unauthenticated(),
            )
            .await
    }

    fn start_session(&self, token: &str, role: Role, remember_me: bool) -> Result<(), ApiError> {
        self.api.session().persist(token, role, remember_me)?;
        self.api.bus().publish(BusEvent::SessionStarted {
            role: role.as_path().to_string(),
        });
        info!(role = role.as_path(), "Signed in");
        Ok(())
    }
}
