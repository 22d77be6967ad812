use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::fetch::{FetchResult, MessageRecord};

/// Scalar leaf of a flattened JSON value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
}

/// Flatten a JSON object into dotted-path fields (`a.b.c`, arrays as `a.0`).
///
/// Returns `None` when the value is not an object; such records are shown as raw text.
pub fn flatten_value(value: &Value) -> Option<BTreeMap<String, FieldValue>> {
    let object = value.as_object()?;
    let mut fields = BTreeMap::new();
    for (key, child) in object {
        flatten_into(&mut fields, key.clone(), child);
    }
    Some(fields)
}

fn flatten_into(fields: &mut BTreeMap<String, FieldValue>, path: String, value: &Value) {
    match value {
        Value::Object(object) => {
            for (key, child) in object {
                flatten_into(fields, format!("{}.{}", path, key), child);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(fields, format!("{}.{}", path, index), child);
            }
        }
        Value::Null => {
            fields.insert(path, FieldValue::Null);
        }
        Value::Bool(b) => {
            fields.insert(path, FieldValue::Bool(*b));
        }
        Value::Number(n) => {
            fields.insert(path, FieldValue::Number(n.clone()));
        }
        Value::String(s) => {
            fields.insert(path, FieldValue::Text(s.clone()));
        }
    }
}

/// Parse a record value and attach its flattened fields, if it is a JSON object.
pub fn flatten_record(record: &mut MessageRecord) {
    record.fields = serde_json::from_str::<Value>(&record.value)
        .ok()
        .as_ref()
        .and_then(flatten_value);
}

/// Response body of both message endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesResponse {
    pub messages: Vec<MessageRecord>,
    pub has_timeout: bool,
    /// Union of every flattened field path, for column generation.
    pub columns: Vec<String>,
}

/// Shape a fetch result for tabular display.
pub fn shape_messages(result: FetchResult) -> MessagesResponse {
    let mut messages = result.messages;
    let mut columns = BTreeSet::new();

    for record in &mut messages {
        flatten_record(record);
        if let Some(fields) = &record.fields {
            columns.extend(fields.keys().cloned());
        }
    }

    MessagesResponse {
        messages,
        has_timeout: result.has_timeout,
        columns: columns.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(offset: i64, value: &str) -> MessageRecord {
        MessageRecord {
            topic: "orders".to_string(),
            partition: 0,
            offset,
            key: String::new(),
            value: value.to_string(),
            decoded_type: None,
            timestamp: None,
            fields: None,
        }
    }

    #[test]
    fn test_flatten_nested_object() {
        let fields = flatten_value(&json!({
            "id": 7,
            "customer": {"name": "ada", "address": {"city": "London"}},
            "paid": true,
            "note": null
        }))
        .unwrap();

        assert_eq!(fields.len(), 5);
        assert_eq!(fields["id"], FieldValue::Number(7.into()));
        assert_eq!(fields["customer.name"], FieldValue::Text("ada".to_string()));
        assert_eq!(fields["customer.address.city"], FieldValue::Text("London".to_string()));
        assert_eq!(fields["paid"], FieldValue::Bool(true));
        assert_eq!(fields["note"], FieldValue::Null);
    }

    #[test]
    fn test_flatten_arrays_use_indices() {
        let fields = flatten_value(&json!({"items": [{"sku": "a"}, {"sku": "b"}], "empty": []})).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["items.0.sku"], FieldValue::Text("a".to_string()));
        assert_eq!(fields["items.1.sku"], FieldValue::Text("b".to_string()));
    }

    #[test]
    fn test_non_object_is_raw_text() {
        assert!(flatten_value(&json!([1, 2])).is_none());
        assert!(flatten_value(&json!("plain")).is_none());

        let mut plain = record(0, "not json at all");
        flatten_record(&mut plain);
        assert!(plain.fields.is_none());
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let mut rec = record(0, r#"{"a":{"b":1}}"#);
        flatten_record(&mut rec);
        let first = rec.fields.clone();
        flatten_record(&mut rec);
        assert_eq!(rec.fields, first);
    }

    #[test]
    fn test_shape_collects_column_union() {
        let result = FetchResult {
            messages: vec![
                record(1, r#"{"a":1,"b":{"c":2}}"#),
                record(2, "raw"),
                record(3, r#"{"a":3,"d":4}"#),
            ],
            has_timeout: true,
        };

        let shaped = shape_messages(result);
        assert!(shaped.has_timeout);
        assert_eq!(shaped.columns, vec!["a", "b.c", "d"]);
        assert!(shaped.messages[1].fields.is_none());
        assert_eq!(shaped.messages.len(), 3);
    }
}
