use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use base64::engine::general_purpose;
use base64::Engine;
use secrecy::{ExposeSecret, Secret, SecretVec};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// One flat record: scalar field name to scalar JSON value
pub type Record = BTreeMap<String, Value>;

/// Ordered request parameters; the order is the order they are encoded and signed in
pub type Params = Vec<(String, String)>;

/// A validated `instrument/endpoint[/action]` tuple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ShorthandRequest {
    instrument: String,
    endpoint: String,
    action: Option<String>,
}

impl ShorthandRequest {
    pub fn new(
        instrument: impl Into<String>,
        endpoint: impl Into<String>,
        action: Option<String>,
    ) -> Result<Self, ExchangeError> {
        let instrument = instrument.into();
        let endpoint = endpoint.into();

        if instrument.trim().is_empty() {
            return Err(ExchangeError::invalid_argument(
                "instrument",
                "instrument cannot be empty",
            ));
        }
        if endpoint.trim().is_empty() {
            return Err(ExchangeError::invalid_argument(
                "endpoint",
                "endpoint cannot be empty",
            ));
        }
        if matches!(&action, Some(a) if a.trim().is_empty()) {
            return Err(ExchangeError::invalid_argument(
                "action",
                "action cannot be empty when given",
            ));
        }

        Ok(Self {
            instrument,
            endpoint,
            action,
        })
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Query,
    Body,
}

/// Static description of one exchange API endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EndpointDescriptor {
    pub api_name: &'static str,
    pub visibility: Visibility,
    pub http_method: HttpMethod,
    pub param_location: ParamLocation,
}

/// A fully resolved request, ready for the transport layer
///
/// Signed requests embed a nonce, so a `ResolvedRequest` should be sent once
/// and then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRequest {
    pub url: String,
    /// Path component used in signatures, e.g. `/0/private/AddOrder`
    pub path: String,
    pub descriptor: EndpointDescriptor,
    pub params: Params,
    pub body_params: Option<Params>,
    pub headers: HashMap<String, String>,
    pub requires_auth: bool,
}

impl ResolvedRequest {
    pub fn method(&self) -> HttpMethod {
        self.descriptor.http_method
    }

    /// Query string without the leading `?`
    pub fn query_string(&self) -> String {
        encode_params(&self.params)
    }

    /// Form-encoded request body, if the endpoint carries its parameters there
    pub fn encoded_body(&self) -> Option<String> {
        self.body_params.as_deref().map(encode_params)
    }

    /// URL including the query string, as the transport should request it
    pub fn full_url(&self) -> String {
        if self.params.is_empty() {
            self.url.clone()
        } else {
            format!("{}?{}", self.url, self.query_string())
        }
    }

    /// Parameters at the location the descriptor assigns to them
    pub(crate) fn located_params_mut(&mut self) -> &mut Params {
        match self.descriptor.param_location {
            ParamLocation::Query => &mut self.params,
            ParamLocation::Body => self.body_params.get_or_insert_with(Vec::new),
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .chain(self.body_params.iter().flatten())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// `application/x-www-form-urlencoded` style encoding, preserving order
pub fn encode_params(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// API credentials, borrowed by the signer for the duration of a call
pub struct Credentials {
    key: Secret<String>,
    secret: SecretVec<u8>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &"[REDACTED]")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: Vec<u8>) -> Self {
        Self {
            key: Secret::new(key.into()),
            secret: Secret::new(secret),
        }
    }

    /// Build credentials from a base64-encoded secret, the form exchanges hand them out in
    pub fn from_base64_secret(key: impl Into<String>, secret: &str) -> Result<Self, ExchangeError> {
        let decoded = general_purpose::STANDARD
            .decode(secret.trim())
            .map_err(|e| ExchangeError::AuthError(format!("Invalid secret key format: {}", e)))?;
        Ok(Self::new(key, decoded))
    }

    pub fn from_config(config: &ExchangeConfig) -> Result<Self, ExchangeError> {
        if !config.has_credentials() {
            return Err(ExchangeError::AuthError(
                "configuration carries no API credentials".to_string(),
            ));
        }
        Self::from_base64_secret(config.api_key(), config.secret_key())
    }

    pub fn key(&self) -> &str {
        self.key.expose_secret()
    }

    pub(crate) fn secret(&self) -> &[u8] {
        self.secret.expose_secret()
    }

    pub fn is_complete(&self) -> bool {
        !self.key().trim().is_empty() && !self.secret().is_empty()
    }
}
