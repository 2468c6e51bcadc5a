use crate::core::errors::ExchangeError;
use crate::core::normalized::{NormalizedResponse, ResponseMetadata};
use crate::core::traits::ExchangePlugin;
use crate::core::types::{Credentials, ResolvedRequest, ShorthandRequest};
use crate::exchanges::kraken::conversions::{self, KrakenFlattener};
use crate::exchanges::kraken::endpoints::{self, EXCHANGE_NAME};
use crate::exchanges::kraken::resolver::KrakenResolver;
use crate::exchanges::kraken::signer::KrakenSigner;
use serde_json::Value;
use tracing::{debug, instrument};

/// Kraken connector: resolver, signer and normalizer behind one plugin
#[derive(Debug, Clone)]
pub struct KrakenConnector {
    resolver: KrakenResolver,
    signer: KrakenSigner,
}

impl KrakenConnector {
    pub fn new(resolver: KrakenResolver, signer: KrakenSigner) -> Self {
        Self { resolver, signer }
    }

    pub fn resolver(&self) -> &KrakenResolver {
        &self.resolver
    }

    /// Normalize with caller-provided metadata instead of capturing it now
    ///
    /// Pair-keyed payloads must carry an entry for `metadata.instrument`.
    pub fn normalize_with_metadata(
        &self,
        body: Value,
        metadata: ResponseMetadata,
    ) -> Result<NormalizedResponse, ExchangeError> {
        if metadata.instrument.trim().is_empty() {
            return Err(ExchangeError::invalid_argument(
                "instrument",
                "instrument cannot be empty",
            ));
        }

        let api_name = endpoints::source_api_name(&metadata.source_endpoint).ok_or_else(|| {
            ExchangeError::UnknownEndpoint {
                endpoint: metadata.source_endpoint.clone(),
            }
        })?;
        let shape = endpoints::payload_shape(api_name).ok_or_else(|| {
            ExchangeError::UnknownEndpoint {
                endpoint: api_name.to_string(),
            }
        })?;

        let result = conversions::result_payload(api_name, &body)?;
        let pair = if shape.is_pair_keyed() {
            let expected = self.resolver.symbols().result_keys(metadata.instrument.trim());
            if expected.is_empty() {
                return Err(ExchangeError::UnknownInstrument {
                    instrument: metadata.instrument.clone(),
                });
            }
            Some(conversions::matched_pair(api_name, result, &expected)?)
        } else {
            None
        };
        conversions::validate(api_name, shape, result)?;
        debug!(api_name, ?shape, pair = ?pair, "response shape accepted");

        let metadata = ResponseMetadata {
            source_endpoint: api_name.to_string(),
            ..metadata
        };
        Ok(NormalizedResponse::new(
            body,
            metadata,
            Box::new(KrakenFlattener::new(shape, pair)),
        ))
    }
}

impl ExchangePlugin for KrakenConnector {
    fn name(&self) -> &str {
        EXCHANGE_NAME
    }

    fn resolve_with(
        &self,
        request: &ShorthandRequest,
        extra_params: &[(String, String)],
    ) -> Result<ResolvedRequest, ExchangeError> {
        self.resolver.resolve(request, extra_params)
    }

    fn sign(
        &self,
        request: ResolvedRequest,
        credentials: Option<&Credentials>,
    ) -> Result<ResolvedRequest, ExchangeError> {
        self.signer.sign(request, credentials)
    }

    #[instrument(skip(self, body), fields(exchange = "kraken"))]
    fn normalize(
        &self,
        source_endpoint: &str,
        instrument: &str,
        body: Value,
    ) -> Result<NormalizedResponse, ExchangeError> {
        self.normalize_with_metadata(body, ResponseMetadata::capture(source_endpoint, instrument))
    }
}
