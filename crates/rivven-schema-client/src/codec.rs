//! Codec handles attached to schema entries
//!
//! A codec turns JSON values into the binary representation described by a
//! schema and back:
//! - **Avro**: `apache-avro` datum encoding (no container header)
//! - **JSON**: `jsonschema` validation around plain `serde_json` bytes
//!
//! Protobuf entries carry no codec; the registry only needs the schema text
//! for them.
//!
//! Codecs are built lazily through [`CodecCell`], which runs construction at
//! most once per entry and remembers failures as `None`.

use crate::error::{ClientError, ClientResult};
use crate::types::SchemaType;
use apache_avro::{from_avro_datum, to_avro_datum, types::Value as AvroValue};
use serde_json::Value as JsonValue;
use std::io::Cursor;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Encoder/decoder built from a schema definition
pub enum Codec {
    Avro(AvroCodec),
    Json(JsonCodec),
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Codec::Avro(c) => f
                .debug_tuple("Avro")
                .field(&c.schema.canonical_form())
                .finish(),
            Codec::Json(_) => f.debug_tuple("Json").finish(),
        }
    }
}

impl Codec {
    /// Build a codec for the given schema text
    pub fn build(schema_type: SchemaType, schema: &str) -> ClientResult<Self> {
        match schema_type {
            SchemaType::Avro => AvroCodec::parse(schema).map(Codec::Avro),
            SchemaType::Json => JsonCodec::compile(schema).map(Codec::Json),
            SchemaType::Protobuf => Err(ClientError::Codec(
                "Protobuf codecs are not supported".to_string(),
            )),
        }
    }

    pub fn schema_type(&self) -> SchemaType {
        match self {
            Codec::Avro(_) => SchemaType::Avro,
            Codec::Json(_) => SchemaType::Json,
        }
    }

    /// Encode a JSON value
    pub fn encode(&self, value: &JsonValue) -> ClientResult<Vec<u8>> {
        match self {
            Codec::Avro(c) => c.encode(value),
            Codec::Json(c) => c.encode(value),
        }
    }

    /// Decode bytes into a JSON value
    pub fn decode(&self, data: &[u8]) -> ClientResult<JsonValue> {
        match self {
            Codec::Avro(c) => c.decode(data),
            Codec::Json(c) => c.decode(data),
        }
    }
}

/// Avro datum codec
pub struct AvroCodec {
    schema: apache_avro::Schema,
}

impl AvroCodec {
    pub fn parse(schema: &str) -> ClientResult<Self> {
        let schema = apache_avro::Schema::parse_str(schema)
            .map_err(|e| ClientError::Codec(format!("Invalid Avro schema: {}", e)))?;
        Ok(Self { schema })
    }

    pub fn schema(&self) -> &apache_avro::Schema {
        &self.schema
    }

    pub fn encode(&self, value: &JsonValue) -> ClientResult<Vec<u8>> {
        let avro_value = AvroValue::from(value.clone())
            .resolve(&self.schema)
            .map_err(|e| ClientError::Codec(format!("Value does not match schema: {}", e)))?;
        to_avro_datum(&self.schema, avro_value)
            .map_err(|e| ClientError::Codec(format!("Avro encoding failed: {}", e)))
    }

    pub fn decode(&self, data: &[u8]) -> ClientResult<JsonValue> {
        let mut cursor = Cursor::new(data);
        let avro_value = from_avro_datum(&self.schema, &mut cursor, None)
            .map_err(|e| ClientError::Codec(format!("Avro decoding failed: {}", e)))?;
        JsonValue::try_from(avro_value)
            .map_err(|e| ClientError::Codec(format!("Avro value is not representable: {}", e)))
    }
}

/// JSON Schema validating codec
pub struct JsonCodec {
    validator: jsonschema::JSONSchema,
}

impl JsonCodec {
    pub fn compile(schema: &str) -> ClientResult<Self> {
        let value: JsonValue = serde_json::from_str(schema)
            .map_err(|e| ClientError::Codec(format!("Invalid JSON: {}", e)))?;
        let validator = jsonschema::JSONSchema::compile(&value)
            .map_err(|e| ClientError::Codec(format!("Invalid JSON Schema: {}", e)))?;
        Ok(Self { validator })
    }

    pub fn encode(&self, value: &JsonValue) -> ClientResult<Vec<u8>> {
        self.check(value)?;
        Ok(serde_json::to_vec(value)?)
    }

    pub fn decode(&self, data: &[u8]) -> ClientResult<JsonValue> {
        let value: JsonValue = serde_json::from_slice(data)?;
        self.check(&value)?;
        Ok(value)
    }

    fn check(&self, value: &JsonValue) -> ClientResult<()> {
        if self.validator.is_valid(value) {
            Ok(())
        } else {
            Err(ClientError::Codec(
                "Value does not match JSON schema".to_string(),
            ))
        }
    }
}

/// Build-once slot for an entry's codec
#[derive(Default)]
pub struct CodecCell {
    cell: OnceLock<Option<Arc<Codec>>>,
}

impl std::fmt::Debug for CodecCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.cell.get() {
            None => "pending",
            Some(None) => "unavailable",
            Some(Some(_)) => "ready",
        };
        f.debug_struct("CodecCell").field("state", &state).finish()
    }
}

impl CodecCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Return the codec, building it on first call
    pub fn get_or_build(&self, schema_type: SchemaType, schema: &str) -> Option<Arc<Codec>> {
        self.cell
            .get_or_init(|| match Codec::build(schema_type, schema) {
                Ok(codec) => Some(Arc::new(codec)),
                Err(e) => {
                    warn!(schema_type = %schema_type, error = %e, "Codec construction failed");
                    None
                }
            })
            .clone()
    }

    /// Like [`get_or_build`](Self::get_or_build) but reports why the codec is missing
    pub fn try_build(&self, schema_type: SchemaType, schema: &str) -> ClientResult<Arc<Codec>> {
        let mut failure = None;
        let slot = self.cell.get_or_init(|| match Codec::build(schema_type, schema) {
            Ok(codec) => {
                debug!(schema_type = %schema_type, "Codec built");
                Some(Arc::new(codec))
            }
            Err(e) => {
                failure = Some(e);
                None
            }
        });

        match slot {
            Some(codec) => Ok(codec.clone()),
            None => Err(failure.unwrap_or_else(|| {
                ClientError::Codec(format!("No codec available for {} schema", schema_type))
            })),
        }
    }
}
