use crate::core::errors::ExchangeError;
use crate::core::types::{EndpointDescriptor, HttpMethod, ParamLocation, Visibility};

pub const EXCHANGE_NAME: &str = "kraken";
pub const API_BASE_URL: &str = "https://api.kraken.com";
pub const API_VERSION: &str = "0";

/// Shorthand name -> public API name
static PUBLIC_ENDPOINTS: &[(&str, &str)] = &[
    ("book", "Depth"),
    ("ohlc", "OHLC"),
    ("pairs", "AssetPairs"),
    ("spread", "Spread"),
    ("ticker", "Ticker"),
    ("trades", "Trades"),
];

/// Private family -> (action -> private API name)
static PRIVATE_FAMILIES: &[(&str, &[(&str, &str)])] = &[
    (
        "order",
        &[
            ("cancel", "CancelOrder"),
            ("new", "AddOrder"),
            ("status", "QueryOrders"),
        ],
    ),
    (
        "wallet",
        &[("deposit", "DepositAddresses"), ("withdraw", "Withdraw")],
    ),
];

/// Column layout of the row arrays Kraken returns for time series endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Trade,
    Candle,
    Spread,
}

impl RowKind {
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Trade => &[
                "price",
                "volume",
                "time",
                "side",
                "order_type",
                "misc",
                "trade_id",
            ],
            Self::Candle => &[
                "time", "open", "high", "low", "close", "vwap", "volume", "count",
            ],
            Self::Spread => &["time", "bid", "ask"],
        }
    }

    /// Columns every row must carry; trailing ones beyond this are optional
    pub const fn required_columns(self) -> usize {
        match self {
            Self::Trade => 6,
            Self::Candle => 8,
            Self::Spread => 3,
        }
    }
}

/// Top-level layout of an endpoint's `result` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `{pair: {..}}`, one nested object per pair
    PairObject,
    /// `{pair: {bids: [[price, volume, ts]..], asks: [..]}}`
    PairBook,
    /// `{pair: [[..]..], last: cursor}`
    PairRows(RowKind),
    /// `{id: {..}}`, the key is carried into each record as `id_field`
    KeyedObjects { id_field: &'static str },
    /// `[{..}..]`
    ObjectList,
    /// `{..}`, a single entity
    Object,
}

impl PayloadShape {
    /// Whether `result` is keyed by the pair the request was made for
    pub const fn is_pair_keyed(self) -> bool {
        matches!(self, Self::PairObject | Self::PairBook | Self::PairRows(_))
    }
}

struct ApiPolicy {
    api_name: &'static str,
    visibility: Visibility,
    http_method: HttpMethod,
    param_location: ParamLocation,
    shape: PayloadShape,
}

const fn public(api_name: &'static str, shape: PayloadShape) -> ApiPolicy {
    ApiPolicy {
        api_name,
        visibility: Visibility::Public,
        http_method: HttpMethod::Get,
        param_location: ParamLocation::Query,
        shape,
    }
}

const fn private_read(api_name: &'static str, shape: PayloadShape) -> ApiPolicy {
    ApiPolicy {
        api_name,
        visibility: Visibility::Private,
        http_method: HttpMethod::Get,
        param_location: ParamLocation::Query,
        shape,
    }
}

const fn private_write(api_name: &'static str, shape: PayloadShape) -> ApiPolicy {
    ApiPolicy {
        api_name,
        visibility: Visibility::Private,
        http_method: HttpMethod::Post,
        param_location: ParamLocation::Body,
        shape,
    }
}

static API_POLICIES: &[ApiPolicy] = &[
    public("Ticker", PayloadShape::PairObject),
    public("Depth", PayloadShape::PairBook),
    public("Trades", PayloadShape::PairRows(RowKind::Trade)),
    public("OHLC", PayloadShape::PairRows(RowKind::Candle)),
    public("Spread", PayloadShape::PairRows(RowKind::Spread)),
    public(
        "AssetPairs",
        PayloadShape::KeyedObjects { id_field: "pair" },
    ),
    private_read(
        "QueryOrders",
        PayloadShape::KeyedObjects { id_field: "txid" },
    ),
    private_write("AddOrder", PayloadShape::Object),
    private_write("CancelOrder", PayloadShape::Object),
    private_write("DepositAddresses", PayloadShape::ObjectList),
    private_write("Withdraw", PayloadShape::Object),
];

fn private_family(endpoint: &str) -> Option<&'static [(&'static str, &'static str)]> {
    PRIVATE_FAMILIES
        .iter()
        .find(|(family, _)| *family == endpoint)
        .map(|(_, actions)| *actions)
}

fn public_api_name(endpoint: &str) -> Option<&'static str> {
    PUBLIC_ENDPOINTS
        .iter()
        .find(|(name, _)| *name == endpoint)
        .map(|(_, api_name)| *api_name)
}

fn policy(api_name: &str) -> Option<&'static ApiPolicy> {
    API_POLICIES.iter().find(|p| p.api_name == api_name)
}

/// Public or private, by shorthand endpoint name
pub fn classify(endpoint: &str) -> Result<Visibility, ExchangeError> {
    if public_api_name(endpoint).is_some() {
        Ok(Visibility::Public)
    } else if private_family(endpoint).is_some() {
        Ok(Visibility::Private)
    } else {
        Err(ExchangeError::UnknownEndpoint {
            endpoint: endpoint.to_string(),
        })
    }
}

/// Map a shorthand endpoint and optional action to the Kraken API name
///
/// Names are matched exactly; `Ticker` is not `ticker`.
pub fn resolve_api_name(endpoint: &str, action: Option<&str>) -> Result<&'static str, ExchangeError> {
    if let Some(api_name) = public_api_name(endpoint) {
        return match action {
            None => Ok(api_name),
            Some(action) => Err(ExchangeError::ActionNotAllowed {
                endpoint: endpoint.to_string(),
                action: action.to_string(),
            }),
        };
    }

    let actions = private_family(endpoint).ok_or_else(|| ExchangeError::UnknownEndpoint {
        endpoint: endpoint.to_string(),
    })?;

    let action = action.ok_or_else(|| ExchangeError::ActionRequired {
        endpoint: endpoint.to_string(),
    })?;

    actions
        .iter()
        .find(|(name, _)| *name == action)
        .map(|(_, api_name)| *api_name)
        .ok_or_else(|| ExchangeError::UnknownAction {
            endpoint: endpoint.to_string(),
            action: action.to_string(),
        })
}

pub fn descriptor(api_name: &str) -> Option<EndpointDescriptor> {
    policy(api_name).map(|p| EndpointDescriptor {
        api_name: p.api_name,
        visibility: p.visibility,
        http_method: p.http_method,
        param_location: p.param_location,
    })
}

pub fn payload_shape(api_name: &str) -> Option<PayloadShape> {
    policy(api_name).map(|p| p.shape)
}

/// Canonical API name for a response source: an API name, or a public shorthand name
pub fn source_api_name(source_endpoint: &str) -> Option<&'static str> {
    policy(source_endpoint)
        .map(|p| p.api_name)
        .or_else(|| public_api_name(source_endpoint))
}

pub fn public_endpoints() -> impl Iterator<Item = (&'static str, &'static str)> {
    PUBLIC_ENDPOINTS.iter().copied()
}

/// Every `(family, action, api_name)` triple of the private families
pub fn private_actions() -> impl Iterator<Item = (&'static str, &'static str, &'static str)> {
    PRIVATE_FAMILIES.iter().flat_map(|(family, actions)| {
        actions
            .iter()
            .map(move |(action, api_name)| (*family, *action, *api_name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mapped_name_has_a_policy() {
        for (_, api_name) in public_endpoints() {
            let d = descriptor(api_name).unwrap();
            assert_eq!(d.visibility, Visibility::Public);
        }
        for (_, _, api_name) in private_actions() {
            let d = descriptor(api_name).unwrap();
            assert_eq!(d.visibility, Visibility::Private);
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("ticker").unwrap(), Visibility::Public);
        assert_eq!(classify("wallet").unwrap(), Visibility::Private);
        assert!(matches!(
            classify("Ticker"),
            Err(ExchangeError::UnknownEndpoint { .. })
        ));
    }

    #[test]
    fn test_resolve_api_name() {
        assert_eq!(resolve_api_name("book", None).unwrap(), "Depth");
        assert_eq!(resolve_api_name("order", Some("new")).unwrap(), "AddOrder");
        assert_eq!(
            resolve_api_name("wallet", Some("deposit")).unwrap(),
            "DepositAddresses"
        );
        assert!(matches!(
            resolve_api_name("order", Some("amend")),
            Err(ExchangeError::UnknownAction { .. })
        ));
        assert!(matches!(
            resolve_api_name("order", None),
            Err(ExchangeError::ActionRequired { .. })
        ));
        assert!(matches!(
            resolve_api_name("ticker", Some("new")),
            Err(ExchangeError::ActionNotAllowed { .. })
        ));
        assert!(matches!(
            resolve_api_name("balance", None),
            Err(ExchangeError::UnknownEndpoint { .. })
        ));
    }

    #[test]
    fn test_method_policy() {
        assert_eq!(descriptor("QueryOrders").unwrap().http_method, HttpMethod::Get);
        assert_eq!(
            descriptor("CancelOrder").unwrap().param_location,
            ParamLocation::Body
        );
    }

    #[test]
    fn test_pair_keyed_shapes() {
        assert!(payload_shape("Depth").unwrap().is_pair_keyed());
        assert!(payload_shape("OHLC").unwrap().is_pair_keyed());
        assert!(!payload_shape("AssetPairs").unwrap().is_pair_keyed());
        assert!(!payload_shape("AddOrder").unwrap().is_pair_keyed());
    }

    #[test]
    fn test_source_api_name() {
        assert_eq!(source_api_name("Trades"), Some("Trades"));
        assert_eq!(source_api_name("book"), Some("Depth"));
        assert_eq!(source_api_name("order"), None);
    }
}
