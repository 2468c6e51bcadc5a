use crate::core::config::ExchangeConfig;
use crate::core::traits::SymbolTable;
use crate::exchanges::kraken::{
    connector::KrakenConnector,
    endpoints::{API_BASE_URL, API_VERSION},
    resolver::KrakenResolver,
    signer::KrakenSigner,
    symbols::KrakenSymbolTable,
};
use std::sync::Arc;

/// Builder for Kraken connectors
///
/// Defaults to the public API host, API version `0` and the bundled pair table.
pub struct KrakenBuilder {
    base_url: String,
    api_version: String,
    symbols: Arc<dyn SymbolTable>,
}

impl Default for KrakenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KrakenBuilder {
    pub fn new() -> Self {
        Self {
            base_url: API_BASE_URL.to_string(),
            api_version: API_VERSION.to_string(),
            symbols: Arc::new(KrakenSymbolTable),
        }
    }

    /// Take base URL and API version overrides from the configuration
    pub fn with_config(mut self, config: &ExchangeConfig) -> Self {
        if let Some(base_url) = &config.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(api_version) = &config.api_version {
            self.api_version = api_version.clone();
        }
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_api_version(mut self, api_version: String) -> Self {
        self.api_version = api_version;
        self
    }

    /// Replace the bundled pair table
    pub fn with_symbol_table(mut self, symbols: Arc<dyn SymbolTable>) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn build(self) -> KrakenConnector {
        KrakenConnector::new(
            KrakenResolver::new(self.base_url, self.api_version, self.symbols),
            KrakenSigner::new(),
        )
    }
}

/// Build a Kraken connector from configuration
///
/// Credentials in the configuration are not captured; they are passed at signing time.
pub fn build_connector(config: &ExchangeConfig) -> KrakenConnector {
    KrakenBuilder::new().with_config(config).build()
}
