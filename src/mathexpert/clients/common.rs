use crate::client_wrapper::TokenUsage;
use aws_smithy_types::{Document, Number};
use serde_json::{Map, Value as JsonValue};
use tokio::sync::Mutex;

/// Convert a JSON value into the smithy document type Bedrock expects for
/// tool schemas and tool inputs.
pub fn json_to_document(value: &JsonValue) -> Document {
    match value {
        JsonValue::Null => Document::Null,
        JsonValue::Bool(b) => Document::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(u) = n.as_u64() {
                Document::Number(Number::PosInt(u))
            } else if let Some(i) = n.as_i64() {
                Document::Number(Number::NegInt(i))
            } else {
                Document::Number(Number::Float(n.as_f64().unwrap_or_default()))
            }
        }
        JsonValue::String(s) => Document::String(s.clone()),
        JsonValue::Array(items) => Document::Array(items.iter().map(json_to_document).collect()),
        JsonValue::Object(map) => Document::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_document(v)))
                .collect(),
        ),
    }
}

/// Inverse of [`json_to_document`]. Non-finite floats become `null`.
pub fn document_to_json(document: &Document) -> JsonValue {
    match document {
        Document::Null => JsonValue::Null,
        Document::Bool(b) => JsonValue::Bool(*b),
        Document::Number(Number::PosInt(u)) => JsonValue::from(*u),
        Document::Number(Number::NegInt(i)) => JsonValue::from(*i),
        Document::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Document::String(s) => JsonValue::String(s.clone()),
        Document::Array(items) => JsonValue::Array(items.iter().map(document_to_json).collect()),
        Document::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), document_to_json(v)))
                .collect::<Map<String, JsonValue>>(),
        ),
    }
}

/// Store the usage of the latest call for `get_last_usage()`.
pub async fn record_usage(usage_slot: &Mutex<Option<TokenUsage>>, usage: Option<TokenUsage>) {
    *usage_slot.lock().await = usage;
}
