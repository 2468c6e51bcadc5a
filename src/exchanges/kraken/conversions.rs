use crate::core::errors::ExchangeError;
use crate::core::normalized::flatten_into;
use crate::core::traits::PayloadFlattener;
use crate::core::types::Record;
use crate::exchanges::kraken::endpoints::{PayloadShape, RowKind};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Key Kraken uses for the pagination cursor next to pair-keyed series
const LAST_CURSOR: &str = "last";
const BOOK_LEVEL_COLUMNS: &[&str] = &["price", "volume", "timestamp"];
/// `field` and `field.subfield`, nothing deeper
const SUMMARY_DEPTH: usize = 2;

/// Payload of a Kraken response envelope, after checking for exchange errors
pub fn result_payload<'a>(api_name: &str, body: &'a Value) -> Result<&'a Value, ExchangeError> {
    let envelope = body
        .as_object()
        .ok_or_else(|| ExchangeError::malformed(api_name, "response body is not an object"))?;

    if let Some(errors) = envelope.get("error") {
        let errors = errors
            .as_array()
            .ok_or_else(|| ExchangeError::malformed(api_name, "'error' is not an array"))?;
        if !errors.is_empty() {
            return Err(ExchangeError::ApiError {
                endpoint: api_name.to_string(),
                messages: errors
                    .iter()
                    .map(|e| e.as_str().map_or_else(|| e.to_string(), str::to_string))
                    .collect(),
            });
        }
    }

    envelope
        .get("result")
        .ok_or_else(|| ExchangeError::malformed(api_name, "missing 'result'"))
}

/// Check that `result` has the layout `shape` declares, all the way down to the rows
pub fn validate(api_name: &str, shape: PayloadShape, result: &Value) -> Result<(), ExchangeError> {
    let malformed = |reason: String| ExchangeError::malformed(api_name, reason);

    match shape {
        PayloadShape::PairObject => {
            for (pair, entry) in pair_entries_checked(api_name, result)? {
                if !entry.is_object() {
                    return Err(malformed(format!("entry for pair '{}' is not an object", pair)));
                }
            }
        }
        PayloadShape::PairBook => {
            for (pair, entry) in pair_entries_checked(api_name, result)? {
                for side in ["bids", "asks"] {
                    let levels = entry
                        .get(side)
                        .and_then(Value::as_array)
                        .ok_or_else(|| malformed(format!("pair '{}' has no '{}' array", pair, side)))?;
                    check_rows(api_name, pair, levels, BOOK_LEVEL_COLUMNS.len())?;
                }
            }
        }
        PayloadShape::PairRows(kind) => {
            for (pair, entry) in pair_entries_checked(api_name, result)? {
                let rows = entry
                    .as_array()
                    .ok_or_else(|| malformed(format!("entry for pair '{}' is not an array", pair)))?;
                check_rows(api_name, pair, rows, kind.required_columns())?;
            }
        }
        PayloadShape::KeyedObjects { .. } => {
            let entries = object(api_name, result)?;
            if let Some((key, _)) = entries.iter().find(|(_, v)| !v.is_object()) {
                return Err(malformed(format!("entry '{}' is not an object", key)));
            }
        }
        PayloadShape::ObjectList => {
            let items = result
                .as_array()
                .ok_or_else(|| malformed("result is not an array".to_string()))?;
            if let Some(index) = items.iter().position(|v| !v.is_object()) {
                return Err(malformed(format!("item {} is not an object", index)));
            }
        }
        PayloadShape::Object => {
            object(api_name, result)?;
        }
    }

    Ok(())
}

/// Key of the requested pair's entry in a pair-keyed `result`
///
/// `expected` lists every spelling the pair may be keyed by.
pub fn matched_pair(api_name: &str, result: &Value, expected: &[String]) -> Result<String, ExchangeError> {
    pair_entries(result)
        .map(|(key, _)| key)
        .find(|key| expected.contains(*key))
        .cloned()
        .ok_or_else(|| {
            ExchangeError::malformed(
                api_name,
                format!("result has no entry for pair {}", expected.join("/")),
            )
        })
}

fn object<'a>(api_name: &str, result: &'a Value) -> Result<&'a Map<String, Value>, ExchangeError> {
    result
        .as_object()
        .ok_or_else(|| ExchangeError::malformed(api_name, "result is not an object"))
}

fn pair_entries_checked<'a>(
    api_name: &str,
    result: &'a Value,
) -> Result<Vec<(&'a String, &'a Value)>, ExchangeError> {
    object(api_name, result)?;
    let entries: Vec<_> = pair_entries(result).collect();
    if entries.is_empty() {
        return Err(ExchangeError::malformed(
            api_name,
            "result has no pair key",
        ));
    }
    Ok(entries)
}

fn check_rows(
    api_name: &str,
    pair: &str,
    rows: &[Value],
    required: usize,
) -> Result<(), ExchangeError> {
    for (index, row) in rows.iter().enumerate() {
        let ok = row
            .as_array()
            .is_some_and(|cols| cols.len() >= required && cols.iter().all(is_scalar));
        if !ok {
            return Err(ExchangeError::malformed(
                api_name,
                format!(
                    "row {} for pair '{}' is not an array of at least {} scalars",
                    index, pair, required
                ),
            ));
        }
    }
    Ok(())
}

fn is_scalar(value: &Value) -> bool {
    !(value.is_array() || value.is_object())
}

fn pair_entries(result: &Value) -> impl Iterator<Item = (&String, &Value)> {
    result
        .as_object()
        .into_iter()
        .flatten()
        .filter(|(key, _)| key.as_str() != LAST_CURSOR)
}

fn rows(entry: &Value) -> &[Value] {
    entry.as_array().map(Vec::as_slice).unwrap_or_default()
}

fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

fn decode_trade_field(column: &str, value: &Value) -> Value {
    match (column, value.as_str()) {
        ("side", Some("b")) => Value::from("buy"),
        ("side", Some("s")) => Value::from("sell"),
        ("order_type", Some("m")) => Value::from("market"),
        ("order_type", Some("l")) => Value::from("limit"),
        _ => value.clone(),
    }
}

fn row_record(pair: &str, kind: RowKind, row: &Value) -> Record {
    let mut record = Record::new();
    record.insert("pair".to_string(), Value::from(pair));
    for (column, value) in kind.columns().iter().zip(rows(row)) {
        let value = match kind {
            RowKind::Trade => decode_trade_field(column, value),
            RowKind::Candle | RowKind::Spread => value.clone(),
        };
        record.insert((*column).to_string(), value);
    }
    record
}

fn level_record(pair: &str, side: &str, level: &Value) -> Record {
    let mut record = Record::new();
    record.insert("pair".to_string(), Value::from(pair));
    record.insert("side".to_string(), Value::from(side));
    for (column, value) in BOOK_LEVEL_COLUMNS.iter().zip(rows(level)) {
        record.insert((*column).to_string(), value.clone());
    }
    record
}

fn levels<'a>(entry: &'a Value, side: &str) -> &'a [Value] {
    entry.get(side).map(rows).unwrap_or_default()
}

fn keyed_record(id_field: &str, id: &str, value: &Value, max_depth: Option<usize>) -> Record {
    let mut record = Record::new();
    flatten_into(&mut record, None, value, max_depth);
    record.insert(id_field.to_string(), Value::from(id));
    record
}

fn flattened(value: &Value, max_depth: Option<usize>) -> Record {
    let mut record = Record::new();
    flatten_into(&mut record, None, value, max_depth);
    record
}

/// Derives the two views for one Kraken payload shape
///
/// For pair-keyed payloads the summary describes `pair`, falling back to the
/// first pair when none is given.
#[derive(Debug, Clone)]
pub struct KrakenFlattener {
    shape: PayloadShape,
    pair: Option<String>,
}

impl KrakenFlattener {
    pub fn new(shape: PayloadShape, pair: Option<String>) -> Self {
        Self { shape, pair }
    }

    fn summary_entry<'a>(&self, result: &'a Value) -> Option<(&'a String, &'a Value)> {
        let mut entries = pair_entries(result);
        match &self.pair {
            Some(pair) => entries.find(|(key, _)| *key == pair),
            None => entries.next(),
        }
    }

    fn result(body: &Value) -> &Value {
        body.get("result").unwrap_or(&Value::Null)
    }

    fn book_summary((pair, entry): (&String, &Value), out: &mut Record) {
        let bids = levels(entry, "bids");
        let asks = levels(entry, "asks");

        out.insert("pair".to_string(), Value::from(pair.as_str()));
        out.insert("count".to_string(), Value::from(bids.len() + asks.len()));
        out.insert("bids.count".to_string(), Value::from(bids.len()));
        out.insert("asks.count".to_string(), Value::from(asks.len()));

        for (prefix, best) in [("bid", bids.first()), ("ask", asks.first())] {
            if let Some(level) = best {
                for (column, value) in BOOK_LEVEL_COLUMNS.iter().take(2).zip(rows(level)) {
                    out.insert(format!("{}.{}", prefix, column), value.clone());
                }
            }
        }

        let best_price = |side: Option<&Value>| side.and_then(|l| rows(l).first()).and_then(decimal);
        if let (Some(bid), Some(ask)) = (best_price(bids.first()), best_price(asks.first())) {
            out.insert("spread".to_string(), Value::from((ask - bid).to_string()));
        }
    }

    fn rows_summary(kind: RowKind, (pair, entry): (&String, &Value), result: &Value, out: &mut Record) {
        let series = rows(entry);

        out.insert("pair".to_string(), Value::from(pair.as_str()));
        out.insert("count".to_string(), Value::from(series.len()));
        if let Some(cursor) = result.get(LAST_CURSOR).filter(|v| is_scalar(v)) {
            out.insert(LAST_CURSOR.to_string(), cursor.clone());
        }
        if let Some(latest) = series.last() {
            for (column, value) in row_record(pair, kind, latest) {
                if column != "pair" {
                    out.insert(format!("latest.{}", column), value);
                }
            }
        }

        if kind == RowKind::Trade {
            let total: Decimal = series
                .iter()
                .filter_map(|row| rows(row).get(1).and_then(decimal))
                .sum();
            out.insert("volume_total".to_string(), Value::from(total.to_string()));
        }
    }
}

impl PayloadFlattener for KrakenFlattener {
    fn records(&self, body: &Value) -> Vec<Record> {
        let result = Self::result(body);

        match self.shape {
            PayloadShape::PairObject => pair_entries(result)
                .map(|(pair, entry)| keyed_record("pair", pair, entry, None))
                .collect(),
            PayloadShape::PairBook => pair_entries(result)
                .flat_map(|(pair, entry)| {
                    let bids = levels(entry, "bids").iter().map(|l| level_record(pair, "bid", l));
                    let asks = levels(entry, "asks").iter().map(|l| level_record(pair, "ask", l));
                    bids.chain(asks).collect::<Vec<_>>()
                })
                .collect(),
            PayloadShape::PairRows(kind) => pair_entries(result)
                .flat_map(|(pair, entry)| rows(entry).iter().map(move |row| row_record(pair, kind, row)))
                .collect(),
            PayloadShape::KeyedObjects { id_field } => result
                .as_object()
                .into_iter()
                .flatten()
                .map(|(id, entry)| keyed_record(id_field, id, entry, None))
                .collect(),
            PayloadShape::ObjectList => rows(result)
                .iter()
                .map(|item| flattened(item, None))
                .collect(),
            PayloadShape::Object => vec![flattened(result, None)],
        }
    }

    fn summary(&self, body: &Value) -> Record {
        let result = Self::result(body);
        let mut out = Record::new();

        match self.shape {
            PayloadShape::PairObject => {
                if let Some((pair, entry)) = self.summary_entry(result) {
                    out = keyed_record("pair", pair, entry, Some(SUMMARY_DEPTH));
                }
            }
            PayloadShape::PairBook => {
                if let Some(entry) = self.summary_entry(result) {
                    Self::book_summary(entry, &mut out);
                }
            }
            PayloadShape::PairRows(kind) => {
                if let Some(entry) = self.summary_entry(result) {
                    Self::rows_summary(kind, entry, result, &mut out);
                }
            }
            PayloadShape::KeyedObjects { .. } => {
                let ids: Vec<&str> = result
                    .as_object()
                    .into_iter()
                    .flatten()
                    .map(|(id, _)| id.as_str())
                    .collect();
                out.insert("count".to_string(), Value::from(ids.len()));
                out.insert("ids".to_string(), Value::from(ids.join(",")));
            }
            PayloadShape::ObjectList => {
                out.insert("count".to_string(), Value::from(rows(result).len()));
            }
            PayloadShape::Object => out = flattened(result, Some(SUMMARY_DEPTH)),
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_errors_surface() {
        let body = json!({"error": ["EQuery:Unknown asset pair"]});
        let err = result_payload("Ticker", &body).unwrap_err();
        assert!(matches!(err, ExchangeError::ApiError { messages, .. } if messages == vec!["EQuery:Unknown asset pair"]));
    }

    #[test]
    fn test_missing_result() {
        let body = json!({"error": []});
        assert!(matches!(
            result_payload("Ticker", &body),
            Err(ExchangeError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_short_trade_rows() {
        let result = json!({"XXBTZUSD": [["30000.0", "0.1", 1_688_671_380.0]], "last": "1"});
        assert!(validate("Trades", PayloadShape::PairRows(RowKind::Trade), &result).is_err());
    }

    #[test]
    fn test_validate_rejects_cursor_only_result() {
        let result = json!({"last": "1688671380"});
        assert!(validate("Spread", PayloadShape::PairRows(RowKind::Spread), &result).is_err());
    }

    #[test]
    fn test_validate_book_requires_both_sides() {
        let result = json!({"XXBTZUSD": {"bids": []}});
        assert!(validate("Depth", PayloadShape::PairBook, &result).is_err());
    }

    #[test]
    fn test_validate_book_requires_timestamped_levels() {
        let result = json!({"XXBTZUSD": {"bids": [["30297.0", "1.115"]], "asks": []}});
        assert!(matches!(
            validate("Depth", PayloadShape::PairBook, &result),
            Err(ExchangeError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_matched_pair_accepts_either_spelling() {
        let expected = vec!["XXBTZUSD".to_string(), "XBTUSD".to_string()];
        let canonical = json!({"XXBTZUSD": {}, "last": 1});
        assert_eq!(matched_pair("Ticker", &canonical, &expected).unwrap(), "XXBTZUSD");
        let altname = json!({"XBTUSD": {}});
        assert_eq!(matched_pair("Ticker", &altname, &expected).unwrap(), "XBTUSD");
        let other = json!({"XETHZUSD": {}});
        assert!(matches!(
            matched_pair("Ticker", &other, &expected),
            Err(ExchangeError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_summary_describes_requested_pair() {
        let body = json!({
            "error": [],
            "result": {"XETHZUSD": {"o": "1800.0"}, "XXBTZUSD": {"o": "30000.0"}}
        });
        let flattener = KrakenFlattener::new(PayloadShape::PairObject, Some("XXBTZUSD".to_string()));
        assert_eq!(flattener.summary(&body)["pair"], json!("XXBTZUSD"));
        assert_eq!(flattener.summary(&body)["o"], json!("30000.0"));
        assert_eq!(flattener.records(&body).len(), 2);
    }

    #[test]
    fn test_trade_codes_decoded() {
        let record = row_record(
            "XXBTZUSD",
            RowKind::Trade,
            &json!(["30000.1", "0.5", 1_688_671_380.5, "s", "m", "", 42]),
        );
        assert_eq!(record["side"], json!("sell"));
        assert_eq!(record["order_type"], json!("market"));
        assert_eq!(record["trade_id"], json!(42));
        assert_eq!(record["pair"], json!("XXBTZUSD"));
    }

    #[test]
    fn test_object_summary_stops_at_one_level() {
        let body = json!({
            "error": [],
            "result": {"descr": {"order": "buy 1.25 XBTUSD @ limit 37500", "deep": {"x": 1}}, "txid": ["OUF4EM-FRGI2-MQMWZD"]}
        });
        let summary = KrakenFlattener::new(PayloadShape::Object, None).summary(&body);
        assert_eq!(summary["descr.order"], json!("buy 1.25 XBTUSD @ limit 37500"));
        assert_eq!(summary["txid.0"], json!("OUF4EM-FRGI2-MQMWZD"));
        assert!(!summary.contains_key("descr.deep.x"));
    }
}
