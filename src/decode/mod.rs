pub mod avro;
pub mod flatten;
pub mod registry;

pub use avro::AvroDecoder;
pub use flatten::{flatten_value, shape_messages, FieldValue, MessagesResponse};
pub use registry::SchemaRegistryClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not in schema-registry wire format")]
    NotRegistryEncoded,

    #[error("no schema registry configured")]
    NoRegistry,

    #[error("schema registry request failed: {0}")]
    Registry(#[from] registry::RegistryError),

    #[error("invalid schema {id}: {message}")]
    InvalidSchema { id: u32, message: String },

    #[error("failed to decode datum with schema {id}: {message}")]
    Datum { id: u32, message: String },
}

/// A payload decoded through its registered schema.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedValue {
    pub value: serde_json::Value,
    /// Full name of the writer schema.
    pub type_name: String,
}

#[async_trait]
pub trait SchemaDecoder: Send + Sync {
    async fn decode(&self, payload: &[u8]) -> Result<DecodedValue, DecodeError>;
}

/// Used when no registry is configured: every payload stays raw.
pub struct PassthroughDecoder;

#[async_trait]
impl SchemaDecoder for PassthroughDecoder {
    async fn decode(&self, _payload: &[u8]) -> Result<DecodedValue, DecodeError> {
        Err(DecodeError::NoRegistry)
    }
}
