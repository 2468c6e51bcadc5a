use crate::core::errors::ExchangeError;
use crate::core::traits::SymbolTable;
use crate::core::types::{ParamLocation, ResolvedRequest, ShorthandRequest, Visibility};
use crate::exchanges::kraken::endpoints;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Parameters the resolver and signer own; callers may not supply them
const RESERVED_PARAMS: &[&str] = &["pair", "nonce"];

/// Turns shorthand requests into concrete Kraken requests
#[derive(Clone)]
pub struct KrakenResolver {
    base_url: String,
    api_version: String,
    symbols: Arc<dyn SymbolTable>,
}

impl fmt::Debug for KrakenResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KrakenResolver")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl KrakenResolver {
    pub fn new(base_url: String, api_version: String, symbols: Arc<dyn SymbolTable>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version,
            symbols,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn symbols(&self) -> &dyn SymbolTable {
        self.symbols.as_ref()
    }

    /// Resolve without applying authentication
    ///
    /// `extra_params` are passed through after `pair`, in the order given.
    #[instrument(
        skip(self, extra_params),
        fields(exchange = "kraken", instrument = %request.instrument(), endpoint = %request.endpoint())
    )]
    pub fn resolve(
        &self,
        request: &ShorthandRequest,
        extra_params: &[(String, String)],
    ) -> Result<ResolvedRequest, ExchangeError> {
        let visibility = endpoints::classify(request.endpoint())?;
        let api_name = endpoints::resolve_api_name(request.endpoint(), request.action())?;
        let descriptor =
            endpoints::descriptor(api_name).ok_or_else(|| ExchangeError::UnknownEndpoint {
                endpoint: api_name.to_string(),
            })?;

        let instrument = request.instrument().trim();
        let pair =
            self.symbols
                .native_pair(instrument)
                .ok_or_else(|| ExchangeError::UnknownInstrument {
                    instrument: instrument.to_string(),
                })?;

        let mut params = Vec::with_capacity(extra_params.len() + 1);
        params.push(("pair".to_string(), pair));
        for (key, value) in extra_params {
            if key.is_empty() {
                return Err(ExchangeError::invalid_argument(
                    "params",
                    "parameter names cannot be empty",
                ));
            }
            if RESERVED_PARAMS.contains(&key.as_str()) {
                return Err(ExchangeError::invalid_argument(
                    key,
                    "parameter is set by the resolver or signer",
                ));
            }
            params.push((key.clone(), value.clone()));
        }

        let path = format!("/{}/{}/{}", self.api_version, visibility, api_name);
        let url = format!("{}{}", self.base_url, path);

        let (params, body_params) = match descriptor.param_location {
            ParamLocation::Query => (params, None),
            ParamLocation::Body => (Vec::new(), Some(params)),
        };

        debug!(url = %url, method = %descriptor.http_method, "resolved shorthand");

        Ok(ResolvedRequest {
            url,
            path,
            descriptor,
            params,
            body_params,
            headers: HashMap::new(),
            requires_auth: visibility == Visibility::Private,
        })
    }
}
