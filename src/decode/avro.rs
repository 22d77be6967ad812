use apache_avro::types::Value as AvroValue;
use apache_avro::Schema;
use async_trait::async_trait;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::registry::SchemaRegistryClient;
use super::{DecodeError, DecodedValue, SchemaDecoder};

const MAGIC_BYTE: u8 = 0;
const HEADER_LEN: usize = 5;

/// Split a Confluent wire-format payload into its schema id and Avro datum.
pub fn split_wire_format(payload: &[u8]) -> Option<(u32, &[u8])> {
    if payload.len() < HEADER_LEN || payload[0] != MAGIC_BYTE {
        return None;
    }
    let id = u32::from_be_bytes([payload[1], payload[2], payload[3], payload[4]]);
    Some((id, &payload[HEADER_LEN..]))
}

/// Decodes registry-framed Avro payloads, caching parsed schemas by id.
pub struct AvroDecoder {
    registry: SchemaRegistryClient,
    schemas: RwLock<HashMap<u32, Arc<Schema>>>,
}

impl AvroDecoder {
    pub fn new(registry: SchemaRegistryClient) -> Self {
        Self {
            registry,
            schemas: RwLock::new(HashMap::new()),
        }
    }

    async fn schema(&self, id: u32) -> Result<Arc<Schema>, DecodeError> {
        if let Some(schema) = self.schemas.read().await.get(&id) {
            return Ok(schema.clone());
        }

        let text = self.registry.get_schema_by_id(id).await?;
        let schema = Schema::parse_str(&text).map_err(|e| DecodeError::InvalidSchema {
            id,
            message: e.to_string(),
        })?;
        let schema = Arc::new(schema);

        debug!(schema_id = id, "Cached schema from registry");
        self.schemas.write().await.insert(id, schema.clone());
        Ok(schema)
    }
}

#[async_trait]
impl SchemaDecoder for AvroDecoder {
    async fn decode(&self, payload: &[u8]) -> Result<DecodedValue, DecodeError> {
        let (id, mut datum) = split_wire_format(payload).ok_or(DecodeError::NotRegistryEncoded)?;
        let schema = self.schema(id).await?;

        let value = apache_avro::from_avro_datum(&schema, &mut datum, None).map_err(|e| {
            DecodeError::Datum {
                id,
                message: e.to_string(),
            }
        })?;

        Ok(DecodedValue {
            value: avro_to_json(value),
            type_name: schema_type_name(&schema),
        })
    }
}

fn schema_type_name(schema: &Schema) -> String {
    match schema.name() {
        Some(name) => name.fullname(None),
        None => format!("{:?}", apache_avro::schema::SchemaKind::from(schema)).to_lowercase(),
    }
}

/// Convert a decoded Avro value into plain JSON for display.
pub fn avro_to_json(value: AvroValue) -> Value {
    match value {
        AvroValue::Null => Value::Null,
        AvroValue::Boolean(b) => Value::Bool(b),
        AvroValue::Int(i) | AvroValue::Date(i) | AvroValue::TimeMillis(i) => Value::from(i),
        AvroValue::Long(l)
        | AvroValue::TimeMicros(l)
        | AvroValue::TimestampMillis(l)
        | AvroValue::TimestampMicros(l) => Value::from(l),
        AvroValue::Float(f) => Number::from_f64(f as f64).map_or(Value::Null, Value::Number),
        AvroValue::Double(d) => Number::from_f64(d).map_or(Value::Null, Value::Number),
        AvroValue::String(s) | AvroValue::Enum(_, s) => Value::String(s),
        AvroValue::Bytes(bytes) | AvroValue::Fixed(_, bytes) => {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        AvroValue::Union(_, inner) => avro_to_json(*inner),
        AvroValue::Array(items) => Value::Array(items.into_iter().map(avro_to_json).collect()),
        AvroValue::Map(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k, avro_to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
        AvroValue::Record(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k, avro_to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
        AvroValue::Uuid(uuid) => Value::String(uuid.to_string()),
        other => Value::String(format!("{:?}", other)),
    }
}
