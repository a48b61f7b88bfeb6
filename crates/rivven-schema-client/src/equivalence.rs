//! Structural schema equivalence
//!
//! Used to answer "is this text already registered under the subject?"
//! without caring about whitespace, key order, or (for `.proto` sources)
//! comments.

use crate::error::{ClientError, ClientResult};
use crate::types::SchemaType;
use serde_json::Value as JsonValue;

/// Canonical form of a schema text, comparable with `==`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalSchema {
    /// Parsed JSON document (Avro, JSON Schema, JSON-encoded Protobuf)
    Json(JsonValue),
    /// Token stream of a `.proto` source with comments removed
    ProtoTokens(Vec<String>),
}

/// Parse a schema text into its canonical form
pub fn canonicalize(schema_type: SchemaType, schema: &str) -> ClientResult<CanonicalSchema> {
    match schema_type {
        SchemaType::Avro | SchemaType::Json => serde_json::from_str(schema)
            .map(CanonicalSchema::Json)
            .map_err(|e| {
                ClientError::InvalidRequest(format!("Invalid {} schema: {}", schema_type, e))
            }),
        SchemaType::Protobuf => {
            if let Ok(value) = serde_json::from_str::<JsonValue>(schema) {
                return Ok(CanonicalSchema::Json(value));
            }
            let tokens = proto_tokens(schema);
            if tokens.is_empty() {
                return Err(ClientError::InvalidRequest(
                    "Invalid PROTOBUF schema: empty definition".to_string(),
                ));
            }
            Ok(CanonicalSchema::ProtoTokens(tokens))
        }
    }
}

/// Compare two schema texts of the same type
///
/// A parse failure on either side is an error; callers scanning candidates
/// decide whether to skip it.
pub fn equivalent(schema_type: SchemaType, a: &str, b: &str) -> ClientResult<bool> {
    Ok(canonicalize(schema_type, a)? == canonicalize(schema_type, b)?)
}

/// Split a `.proto` source into tokens, dropping comments
///
/// Identifiers, numbers and dotted names are single tokens, string literals
/// are kept whole, every other non-whitespace character is its own token.
fn proto_tokens(source: &str) -> Vec<String> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
        } else if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            i = (i + 2).min(chars.len());
        } else if c == '"' || c == '\'' {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i] != c {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(chars.len());
            tokens.push(chars[start..i].iter().collect());
        } else if c.is_alphanumeric() || c == '_' || c == '.' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.')
            {
                i += 1;
            }
            tokens.push(chars[start..i].iter().collect());
        } else {
            tokens.push(c.to_string());
            i += 1;
        }
    }

    tokens
}
