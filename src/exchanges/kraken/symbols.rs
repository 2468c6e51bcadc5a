use crate::core::traits::SymbolTable;

/// Shorthand instrument -> (Kraken pair name, key Kraken uses in `result`)
static KRAKEN_PAIRS: &[(&str, &str, &str)] = &[
    ("ADAUSD", "ADAUSD", "ADAUSD"),
    ("BTCEUR", "XBTEUR", "XXBTZEUR"),
    ("BTCUSD", "XBTUSD", "XXBTZUSD"),
    ("BTCUSDT", "XBTUSDT", "XBTUSDT"),
    ("DOGEUSD", "XDGUSD", "XDGUSD"),
    ("ETHBTC", "ETHXBT", "XETHXXBT"),
    ("ETHEUR", "ETHEUR", "XETHZEUR"),
    ("ETHUSD", "ETHUSD", "XETHZUSD"),
    ("LTCUSD", "LTCUSD", "XLTCZUSD"),
    ("SOLUSD", "SOLUSD", "SOLUSD"),
    ("USDTUSD", "USDTZUSD", "USDTZUSD"),
    ("XRPUSD", "XRPUSD", "XXRPZUSD"),
];

/// Built-in Kraken pair table
///
/// Instruments are matched ignoring ASCII case, so `btcusd` and `BTCUSD`
/// both resolve to `XBTUSD`. Responses for legacy pairs are keyed by the
/// canonical name (`XXBTZUSD`), so both spellings identify the pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct KrakenSymbolTable;

impl KrakenSymbolTable {
    fn entry(instrument: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
        KRAKEN_PAIRS
            .iter()
            .find(|(name, _, _)| name.eq_ignore_ascii_case(instrument))
    }
}

impl SymbolTable for KrakenSymbolTable {
    fn native_pair(&self, instrument: &str) -> Option<String> {
        Self::entry(instrument).map(|(_, pair, _)| (*pair).to_string())
    }

    fn result_keys(&self, instrument: &str) -> Vec<String> {
        Self::entry(instrument)
            .map(|(_, pair, key)| {
                let mut keys = vec![(*key).to_string()];
                if pair != key {
                    keys.push((*pair).to_string());
                }
                keys
            })
            .unwrap_or_default()
    }
}
