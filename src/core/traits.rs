use crate::core::{
    errors::ExchangeError,
    normalized::NormalizedResponse,
    types::{Credentials, Record, ResolvedRequest, ShorthandRequest},
};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Capabilities every exchange module provides to the dispatching layer
pub trait ExchangePlugin: Send + Sync {
    /// Name used in the shorthand scheme, e.g. `kraken`
    fn name(&self) -> &str;

    /// Resolve a shorthand into a request, appending caller-supplied parameters
    fn resolve_with(
        &self,
        request: &ShorthandRequest,
        extra_params: &[(String, String)],
    ) -> Result<ResolvedRequest, ExchangeError>;

    /// Attach authentication to a private request; public requests pass through unchanged
    fn sign(
        &self,
        request: ResolvedRequest,
        credentials: Option<&Credentials>,
    ) -> Result<ResolvedRequest, ExchangeError>;

    /// Wrap a decoded response body produced by `source_endpoint`
    fn normalize(
        &self,
        source_endpoint: &str,
        instrument: &str,
        body: Value,
    ) -> Result<NormalizedResponse, ExchangeError>;

    fn resolve(&self, request: &ShorthandRequest) -> Result<ResolvedRequest, ExchangeError> {
        self.resolve_with(request, &[])
    }

    /// Resolve and sign in one step
    fn prepare(
        &self,
        request: &ShorthandRequest,
        extra_params: &[(String, String)],
        credentials: Option<&Credentials>,
    ) -> Result<ResolvedRequest, ExchangeError> {
        let resolved = self.resolve_with(request, extra_params)?;
        self.sign(resolved, credentials)
    }
}

/// Instrument to native pair lookup
pub trait SymbolTable: Send + Sync {
    fn native_pair(&self, instrument: &str) -> Option<String>;

    /// Keys a pair-keyed response for `instrument` may use; empty when unknown
    fn result_keys(&self, instrument: &str) -> Vec<String> {
        self.native_pair(instrument).into_iter().collect()
    }
}

impl SymbolTable for HashMap<String, String> {
    fn native_pair(&self, instrument: &str) -> Option<String> {
        self.get(instrument).cloned()
    }
}

/// Exchange-specific derivation of the two normalized views
pub trait PayloadFlattener: Send + Sync + fmt::Debug {
    /// One record per logical entity in the payload
    fn records(&self, body: &Value) -> Vec<Record>;

    /// Payload part of the key-value view
    fn summary(&self, body: &Value) -> Record;
}
