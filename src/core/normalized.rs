use crate::core::traits::PayloadFlattener;
use crate::core::types::Record;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

/// Metadata captured once when a response is normalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub source_endpoint: String,
    pub instrument: String,
    pub retrieved_at_epoch_millis: i64,
    pub record_id: String,
}

impl ResponseMetadata {
    /// Stamp the current time and a fresh record id
    pub fn capture(source_endpoint: impl Into<String>, instrument: impl Into<String>) -> Self {
        Self::new(
            source_endpoint,
            instrument,
            chrono::Utc::now().timestamp_millis(),
            uuid::Uuid::new_v4().to_string(),
        )
    }

    pub fn new(
        source_endpoint: impl Into<String>,
        instrument: impl Into<String>,
        retrieved_at_epoch_millis: i64,
        record_id: impl Into<String>,
    ) -> Self {
        Self {
            source_endpoint: source_endpoint.into(),
            instrument: instrument.into(),
            retrieved_at_epoch_millis,
            record_id: record_id.into(),
        }
    }

    fn insert_into(&self, out: &mut Record) {
        out.insert(
            "sourceEndpoint".to_string(),
            Value::from(self.source_endpoint.as_str()),
        );
        out.insert("instrument".to_string(), Value::from(self.instrument.as_str()));
        out.insert(
            "retrievedAtEpochMillis".to_string(),
            Value::from(self.retrieved_at_epoch_millis),
        );
        out.insert("recordId".to_string(), Value::from(self.record_id.as_str()));
    }
}

/// A raw response body together with its two exchange-independent views
///
/// The payload shape has already been validated by the exchange that built
/// this value. `triples()` and `key_value_dict()` are computed on first use
/// and cached; the raw body is never modified.
#[derive(Debug)]
pub struct NormalizedResponse {
    raw: Value,
    metadata: ResponseMetadata,
    flattener: Box<dyn PayloadFlattener>,
    triples: OnceLock<Vec<Record>>,
    key_values: OnceLock<Record>,
}

impl NormalizedResponse {
    pub fn new(
        raw: Value,
        metadata: ResponseMetadata,
        flattener: Box<dyn PayloadFlattener>,
    ) -> Self {
        Self {
            raw,
            metadata,
            flattener,
            triples: OnceLock::new(),
            key_values: OnceLock::new(),
        }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn metadata(&self) -> &ResponseMetadata {
        &self.metadata
    }

    /// One flat record per logical entity in the payload
    pub fn triples(&self) -> &[Record] {
        self.triples.get_or_init(|| self.flattener.records(&self.raw))
    }

    /// Metadata merged with the payload summary; metadata keys win on collision
    pub fn key_value_dict(&self) -> &Record {
        self.key_values.get_or_init(|| {
            let mut out = self.flattener.summary(&self.raw);
            self.metadata.insert_into(&mut out);
            out
        })
    }
}

/// Flatten the scalar leaves of `value` into `out` under dotted paths
///
/// Array elements are keyed by index. With `max_depth`, containers nested
/// deeper than that many path segments are dropped.
pub fn flatten_into(out: &mut Record, prefix: Option<&str>, value: &Value, max_depth: Option<usize>) {
    let depth = prefix.map_or(0, |p| p.split('.').count());
    flatten_at(out, prefix.map(str::to_string), depth, value, max_depth);
}

fn flatten_at(
    out: &mut Record,
    path: Option<String>,
    depth: usize,
    value: &Value,
    max_depth: Option<usize>,
) {
    let children: Vec<(String, &Value)> = match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        scalar => {
            if let Some(path) = path {
                out.insert(path, scalar.clone());
            }
            return;
        }
    };

    if max_depth.is_some_and(|max| depth >= max) {
        return;
    }

    for (key, child) in children {
        let child_path = match &path {
            Some(p) => format!("{}.{}", p, key),
            None => key,
        };
        flatten_at(out, Some(child_path), depth + 1, child, max_depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct CountingFlattener;

    impl PayloadFlattener for CountingFlattener {
        fn records(&self, body: &Value) -> Vec<Record> {
            body.as_array()
                .map(|items| {
                    items
                        .iter()
                        .map(|item| {
                            let mut record = Record::new();
                            flatten_into(&mut record, None, item, None);
                            record
                        })
                        .collect()
                })
                .unwrap_or_default()
        }

        fn summary(&self, body: &Value) -> Record {
            let mut record = Record::new();
            record.insert(
                "count".to_string(),
                Value::from(body.as_array().map_or(0, Vec::len)),
            );
            record.insert("instrument".to_string(), Value::from("overridden"));
            record
        }
    }

    #[test]
    fn test_flatten_full_depth() {
        let mut out = Record::new();
        flatten_into(
            &mut out,
            None,
            &json!({"a": ["1", "2"], "b": {"c": {"d": true}}, "e": null}),
            None,
        );
        assert_eq!(out.get("a.0"), Some(&json!("1")));
        assert_eq!(out.get("a.1"), Some(&json!("2")));
        assert_eq!(out.get("b.c.d"), Some(&json!(true)));
        assert_eq!(out.get("e"), Some(&Value::Null));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_flatten_one_level_of_nesting() {
        let mut out = Record::new();
        flatten_into(
            &mut out,
            None,
            &json!({"top": 1, "nested": {"leaf": 2, "deeper": {"gone": 3}}}),
            Some(2),
        );
        assert_eq!(out.get("top"), Some(&json!(1)));
        assert_eq!(out.get("nested.leaf"), Some(&json!(2)));
        assert!(!out.keys().any(|k| k.contains("gone")));
    }

    #[test]
    fn test_flatten_with_prefix() {
        let mut out = Record::new();
        flatten_into(&mut out, Some("latest"), &json!({"price": "1.0"}), None);
        assert_eq!(out.get("latest.price"), Some(&json!("1.0")));
    }

    #[test]
    fn test_views_are_cached_and_metadata_wins() {
        let response = NormalizedResponse::new(
            json!([{"x": 1}, {"x": 2}]),
            ResponseMetadata::new("Test", "BTCUSD", 42, "<uid>"),
            Box::new(CountingFlattener),
        );

        let first = response.triples().to_vec();
        assert_eq!(first.len(), 2);
        assert_eq!(response.triples(), first.as_slice());

        let kv = response.key_value_dict();
        assert_eq!(kv.get("count"), Some(&json!(2)));
        assert_eq!(kv.get("instrument"), Some(&json!("BTCUSD")));
        assert_eq!(kv.get("retrievedAtEpochMillis"), Some(&json!(42)));
        assert_eq!(kv.get("recordId"), Some(&json!("<uid>")));
        assert_eq!(response.raw(), &json!([{"x": 1}, {"x": 2}]));
    }

    #[test]
    fn test_captured_metadata_is_unique() {
        let a = ResponseMetadata::capture("Ticker", "BTCUSD");
        let b = ResponseMetadata::capture("Ticker", "BTCUSD");
        assert_ne!(a.record_id, b.record_id);
        assert!(a.retrieved_at_epoch_millis > 0);
    }
}
