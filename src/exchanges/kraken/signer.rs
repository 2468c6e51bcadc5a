use crate::core::errors::ExchangeError;
use crate::core::kernel::{next_nonce, SignatureResult, Signer};
use crate::core::types::{Credentials, HttpMethod, ParamLocation, ResolvedRequest};
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};
use std::collections::HashMap;
use tracing::{debug, instrument, trace};

type HmacSha512 = Hmac<Sha512>;

pub const API_KEY_HEADER: &str = "API-Key";
pub const API_SIGN_HEADER: &str = "API-Sign";

#[derive(Debug, Clone, Copy, Default)]
pub struct KrakenSigner;

impl KrakenSigner {
    pub fn new() -> Self {
        Self
    }

    /// Kraken's `API-Sign` value
    ///
    /// `base64(HMAC-SHA512(secret, path + SHA256(nonce + encoded_params)))`
    pub fn signature(
        secret: &[u8],
        path: &str,
        nonce: u64,
        encoded_params: &str,
    ) -> Result<String, ExchangeError> {
        let digest = Sha256::new()
            .chain_update(nonce.to_string().as_bytes())
            .chain_update(encoded_params.as_bytes())
            .finalize();

        let mut mac = HmacSha512::new_from_slice(secret)
            .map_err(|e| ExchangeError::AuthError(format!("Invalid secret key: {}", e)))?;
        mac.update(path.as_bytes());
        mac.update(&digest);

        Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Add a fresh nonce and the auth headers to a private request
    ///
    /// Public requests are returned untouched. Private requests without
    /// usable credentials fail; they are never passed on unsigned.
    #[instrument(skip_all, fields(exchange = "kraken", path = %request.path))]
    pub fn sign(
        &self,
        mut request: ResolvedRequest,
        credentials: Option<&Credentials>,
    ) -> Result<ResolvedRequest, ExchangeError> {
        if !request.requires_auth {
            trace!("public request, nothing to sign");
            return Ok(request);
        }

        let credentials = credentials.ok_or_else(|| {
            ExchangeError::AuthError(format!("{} requires API credentials", request.path))
        })?;
        if !credentials.is_complete() {
            return Err(ExchangeError::AuthError(format!(
                "{} requires a non-empty API key and secret",
                request.path
            )));
        }
        if request.param("nonce").is_some() {
            return Err(ExchangeError::invalid_argument(
                "nonce",
                "request is already signed",
            ));
        }

        let nonce = next_nonce();
        request
            .located_params_mut()
            .insert(0, ("nonce".to_string(), nonce.to_string()));

        let encoded = match request.descriptor.param_location {
            ParamLocation::Query => request.query_string(),
            ParamLocation::Body => request.encoded_body().unwrap_or_default(),
        };

        let headers =
            self.sign_request(credentials, request.method(), &request.path, &encoded, nonce)?;
        request.headers.extend(headers);

        debug!(nonce, method = %request.method(), "signed private request");
        Ok(request)
    }
}

impl Signer for KrakenSigner {
    fn sign_request(
        &self,
        credentials: &Credentials,
        method: HttpMethod,
        path: &str,
        encoded_params: &str,
        nonce: u64,
    ) -> SignatureResult {
        let signature = Self::signature(credentials.secret(), path, nonce, encoded_params)?;

        let mut headers = HashMap::new();
        headers.insert(API_KEY_HEADER.to_string(), credentials.key().to_string());
        headers.insert(API_SIGN_HEADER.to_string(), signature);
        if method == HttpMethod::Post {
            headers.insert(
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded; charset=utf-8".to_string(),
            );
        }

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ShorthandRequest;
    use crate::exchanges::kraken::{endpoints, resolver::KrakenResolver, symbols::KrakenSymbolTable};
    use std::sync::Arc;

    // Example values from Kraken's REST authentication guide
    const DOC_SECRET: &str =
        "kQH5HW/8p1uGOVjbgWA7FunAmGO8lsSUXNsu3eow76sz84Q18fWxnyRzBHCd3pd5nE9qa99HAZtuZuj6F1huXg==";
    const DOC_NONCE: u64 = 1_616_492_376_594;
    const DOC_BODY: &str =
        "nonce=1616492376594&ordertype=limit&pair=XBTUSD&price=37500&type=buy&volume=1.25";
    const DOC_SIGNATURE: &str =
        "4/dpxb3iT4tp/ZCVEwSnEsLxx0bqyhLpdfOpc6fn7OR8+UClSV5n9E6aSS8MPtnRfp32bAb0nmbRn6H8ndwLUQ==";

    fn resolve(endpoint: &str, action: Option<&str>) -> ResolvedRequest {
        let resolver = KrakenResolver::new(
            endpoints::API_BASE_URL.to_string(),
            endpoints::API_VERSION.to_string(),
            Arc::new(KrakenSymbolTable),
        );
        let request =
            ShorthandRequest::new("BTCUSD", endpoint, action.map(str::to_string)).unwrap();
        resolver.resolve(&request, &[]).unwrap()
    }

    fn credentials() -> Credentials {
        Credentials::from_base64_secret("doc_key", DOC_SECRET).unwrap()
    }

    #[test]
    fn test_documented_signature() {
        let creds = credentials();
        let signature =
            KrakenSigner::signature(creds.secret(), "/0/private/AddOrder", DOC_NONCE, DOC_BODY)
                .unwrap();
        assert_eq!(signature, DOC_SIGNATURE);
    }

    #[test]
    fn test_public_request_unchanged() {
        let request = resolve("ticker", None);
        let signed = KrakenSigner::new().sign(request.clone(), None).unwrap();
        assert_eq!(signed, request);
    }

    #[test]
    fn test_private_request_without_credentials() {
        let result = KrakenSigner::new().sign(resolve("order", Some("cancel")), None);
        assert!(matches!(result, Err(ExchangeError::AuthError(_))));
    }

    #[test]
    fn test_private_request_with_empty_key() {
        let creds = Credentials::new("", b"secret".to_vec());
        let result = KrakenSigner::new().sign(resolve("order", Some("cancel")), Some(&creds));
        assert!(matches!(result, Err(ExchangeError::AuthError(_))));
    }

    #[test]
    fn test_body_request_signature_matches_body() {
        let creds = credentials();
        let signed = KrakenSigner::new()
            .sign(resolve("order", Some("cancel")), Some(&creds))
            .unwrap();

        let body = signed.encoded_body().unwrap();
        assert!(body.starts_with("nonce="));
        assert!(body.ends_with("&pair=XBTUSD"));

        let nonce: u64 = signed.param("nonce").unwrap().parse().unwrap();
        let expected =
            KrakenSigner::signature(creds.secret(), "/0/private/CancelOrder", nonce, &body)
                .unwrap();
        assert_eq!(signed.headers.get(API_SIGN_HEADER), Some(&expected));
        assert_eq!(
            signed.headers.get(API_KEY_HEADER).map(String::as_str),
            Some("doc_key")
        );
    }

    #[test]
    fn test_query_request_carries_nonce_in_query() {
        let creds = credentials();
        let signed = KrakenSigner::new()
            .sign(resolve("order", Some("status")), Some(&creds))
            .unwrap();
        assert!(signed.body_params.is_none());
        assert_eq!(signed.params[0].0, "nonce");
        assert!(signed.headers.contains_key(API_SIGN_HEADER));
        assert!(!signed.headers.contains_key("Content-Type"));
    }

    #[test]
    fn test_signing_twice_is_rejected() {
        let creds = credentials();
        let signer = KrakenSigner::new();
        let signed = signer
            .sign(resolve("wallet", Some("withdraw")), Some(&creds))
            .unwrap();
        assert!(signer.sign(signed, Some(&creds)).is_err());
    }

    #[test]
    fn test_consecutive_signatures_use_new_nonces() {
        let creds = credentials();
        let signer = KrakenSigner::new();
        let a = signer.sign(resolve("order", Some("new")), Some(&creds)).unwrap();
        let b = signer.sign(resolve("order", Some("new")), Some(&creds)).unwrap();
        let nonce_a: u64 = a.param("nonce").unwrap().parse().unwrap();
        let nonce_b: u64 = b.param("nonce").unwrap().parse().unwrap();
        assert!(nonce_b > nonce_a);
        assert_ne!(a.headers.get(API_SIGN_HEADER), b.headers.get(API_SIGN_HEADER));
    }
}
