use crate::core::errors::ExchangeError;
use crate::core::types::{Credentials, HttpMethod};
use std::collections::HashMap;

/// Result type for signing operations: headers to attach to the request
pub type SignatureResult = Result<HashMap<String, String>, ExchangeError>;

/// Signer trait for request authentication
///
/// Implementations hold no credentials themselves; the caller lends them for
/// each call so a single signer can serve several accounts.
pub trait Signer: Send + Sync {
    /// Sign a request and return the headers to attach
    ///
    /// # Arguments
    /// * `credentials` - API key and decoded secret
    /// * `method` - HTTP method
    /// * `path` - Request path, e.g. `/0/private/AddOrder`
    /// * `encoded_params` - Form-encoded parameters, already containing the nonce
    /// * `nonce` - Nonce embedded in `encoded_params`
    fn sign_request(
        &self,
        credentials: &Credentials,
        method: HttpMethod,
        path: &str,
        encoded_params: &str,
        nonce: u64,
    ) -> SignatureResult;
}
