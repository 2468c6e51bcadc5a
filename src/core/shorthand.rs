use crate::core::errors::ExchangeError;
use crate::core::types::ShorthandRequest;
use std::fmt;
use std::str::FromStr;

const SCHEME_SEPARATOR: &str = "://";

/// A parsed `exchange://instrument/endpoint[/action]` address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shorthand {
    pub exchange: String,
    pub request: ShorthandRequest,
}

impl FromStr for Shorthand {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (exchange, rest) = s.split_once(SCHEME_SEPARATOR).ok_or_else(|| {
            ExchangeError::invalid_argument("shorthand", format!("missing '://' in '{}'", s))
        })?;

        if exchange.is_empty() {
            return Err(ExchangeError::invalid_argument(
                "shorthand",
                format!("missing exchange name in '{}'", s),
            ));
        }

        let segments: Vec<&str> = rest.split('/').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(ExchangeError::invalid_argument(
                "shorthand",
                format!("empty path segment in '{}'", s),
            ));
        }
        let (instrument, endpoint, action) = match segments.as_slice() {
            [instrument, endpoint] => (*instrument, *endpoint, None),
            [instrument, endpoint, action] => (*instrument, *endpoint, Some(action.to_string())),
            _ => {
                return Err(ExchangeError::invalid_argument(
                    "shorthand",
                    format!("expected instrument/endpoint[/action] in '{}'", s),
                ))
            }
        };

        Ok(Self {
            exchange: exchange.to_string(),
            request: ShorthandRequest::new(instrument, endpoint, action)?,
        })
    }
}

impl fmt::Display for Shorthand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}/{}",
            self.exchange,
            SCHEME_SEPARATOR,
            self.request.instrument(),
            self.request.endpoint()
        )?;
        if let Some(action) = self.request.action() {
            write!(f, "/{}", action)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_public_shorthand() {
        let parsed: Shorthand = "kraken://btcusd/ticker".parse().unwrap();
        assert_eq!(parsed.exchange, "kraken");
        assert_eq!(parsed.request.instrument(), "btcusd");
        assert_eq!(parsed.request.endpoint(), "ticker");
        assert_eq!(parsed.request.action(), None);
    }

    #[test]
    fn test_parse_private_shorthand() {
        let parsed: Shorthand = "kraken://btcusd/order/cancel".parse().unwrap();
        assert_eq!(parsed.request.endpoint(), "order");
        assert_eq!(parsed.request.action(), Some("cancel"));
        assert_eq!(parsed.to_string(), "kraken://btcusd/order/cancel");
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert!("btcusd/ticker".parse::<Shorthand>().is_err());
        assert!("://btcusd/ticker".parse::<Shorthand>().is_err());
        assert!("kraken://btcusd".parse::<Shorthand>().is_err());
        assert!("kraken://btcusd/order/new/extra".parse::<Shorthand>().is_err());
        assert!("kraken:///ticker".parse::<Shorthand>().is_err());
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        for input in [
            "kraken://btcusd/ticker/",
            "kraken://btcusd//ticker",
            "kraken://btcusd/order/cancel/",
        ] {
            assert!(
                matches!(
                    input.parse::<Shorthand>(),
                    Err(ExchangeError::InvalidArgument { field, .. }) if field == "shorthand"
                ),
                "{} should be rejected",
                input
            );
        }
    }
}
