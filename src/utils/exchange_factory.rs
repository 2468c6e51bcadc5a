use crate::core::errors::ExchangeError;
use crate::core::shorthand::Shorthand;
use crate::core::traits::ExchangePlugin;
use crate::core::types::{Credentials, ResolvedRequest};
use crate::exchanges::kraken;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Exchange plugins keyed by the name used in shorthand addresses
///
/// Registration is explicit; the dispatching layer looks plugins up by name.
#[derive(Clone, Default)]
pub struct ExchangeRegistry {
    plugins: HashMap<String, Arc<dyn ExchangePlugin>>,
}

impl fmt::Debug for ExchangeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeRegistry")
            .field("exchanges", &self.names())
            .finish()
    }
}

impl ExchangeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every bundled exchange, using default settings
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(kraken::KrakenBuilder::new().build()));
        registry
    }

    /// Add or replace the plugin registered under `plugin.name()`
    pub fn register(&mut self, plugin: Arc<dyn ExchangePlugin>) -> Option<Arc<dyn ExchangePlugin>> {
        let name = plugin.name().to_string();
        debug!(exchange = %name, "registering exchange plugin");
        self.plugins.insert(name, plugin)
    }

    pub fn get(&self, exchange: &str) -> Result<Arc<dyn ExchangePlugin>, ExchangeError> {
        self.plugins
            .get(exchange)
            .cloned()
            .ok_or_else(|| ExchangeError::UnknownExchange(exchange.to_string()))
    }

    /// Registered exchange names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parse a shorthand address, then resolve and sign it with the matching plugin
    pub fn prepare(
        &self,
        shorthand: &str,
        extra_params: &[(String, String)],
        credentials: Option<&Credentials>,
    ) -> Result<ResolvedRequest, ExchangeError> {
        let parsed: Shorthand = shorthand.parse()?;
        self.get(&parsed.exchange)?
            .prepare(&parsed.request, extra_params, credentials)
    }
}
