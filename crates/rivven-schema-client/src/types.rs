//! Schema types and data structures
//!
//! This module provides core types for the schema client:
//! - [`SchemaId`], [`Subject`], [`VersionSelector`] - Core identifiers
//! - [`Schema`] - An immutable catalog entry with its lazily built codec
//! - [`SchemaReference`], [`SubjectVersionRef`] - Cross-entry pointers
//! - [`CompatibilityLevel`], [`Mode`] - Registry configuration

use crate::codec::{Codec, CodecCell};
use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Unique identifier for a schema (global across all subjects)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaId(pub u32);

impl SchemaId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for SchemaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SchemaId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Subject (typically topic-name + "-key" or "-value")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Subject(pub String);

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Create a key subject for a topic
    pub fn key(topic: &str) -> Self {
        Self(format!("{}-key", topic))
    }

    /// Create a value subject for a topic
    pub fn value(topic: &str) -> Self {
        Self(format!("{}-value", topic))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Subject {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Subject {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&Subject> for Subject {
    fn from(s: &Subject) -> Self {
        s.clone()
    }
}

impl AsRef<str> for Subject {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Schema format
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    /// Apache Avro (registry default when a request omits the type)
    #[default]
    #[serde(alias = "avro")]
    Avro,

    /// Protocol Buffers
    #[serde(alias = "protobuf", alias = "PROTO")]
    Protobuf,

    /// JSON Schema
    #[serde(alias = "json", alias = "JSONSCHEMA", alias = "JSON_SCHEMA")]
    Json,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Avro => "AVRO",
            SchemaType::Protobuf => "PROTOBUF",
            SchemaType::Json => "JSON",
        }
    }

    /// Whether a codec handle can be built for this format
    pub fn has_codec(&self) -> bool {
        matches!(self, SchemaType::Avro | SchemaType::Json)
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SchemaType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AVRO" => Ok(SchemaType::Avro),
            "JSON" | "JSONSCHEMA" | "JSON_SCHEMA" => Ok(SchemaType::Json),
            "PROTOBUF" | "PROTO" => Ok(SchemaType::Protobuf),
            _ => Err(ClientError::InvalidSchemaType(s.to_string())),
        }
    }
}

/// Version addressing within a subject: a concrete number or `latest`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionSelector {
    Latest,
    Number(u32),
}

impl std::fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionSelector::Latest => write!(f, "latest"),
            VersionSelector::Number(v) => write!(f, "{}", v),
        }
    }
}

impl std::str::FromStr for VersionSelector {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("latest") {
            return Ok(VersionSelector::Latest);
        }
        match s.parse::<u32>() {
            Ok(v) if v > 0 => Ok(VersionSelector::Number(v)),
            _ => Err(ClientError::InvalidVersion(s.to_string())),
        }
    }
}

impl From<u32> for VersionSelector {
    fn from(v: u32) -> Self {
        VersionSelector::Number(v)
    }
}

/// Reference to another schema entry (Avro named types, Protobuf imports,
/// JSON Schema `$ref`s)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaReference {
    /// Reference name (used in the schema)
    pub name: String,
    /// Subject containing the referenced schema
    pub subject: String,
    /// Version of the referenced schema
    pub version: u32,
}

impl SchemaReference {
    pub fn new(name: impl Into<String>, subject: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            subject: subject.into(),
            version,
        }
    }
}

/// A (subject, version) pair pointing at a schema ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectVersionRef {
    pub subject: String,
    pub version: u32,
}

/// One immutable catalog entry
///
/// Clones are cheap to share: every clone of an entry points at the same
/// codec cell, so the codec is built at most once no matter how many cache
/// copies hand the entry out.
#[derive(Debug, Clone)]
pub struct Schema {
    id: SchemaId,
    subject: Subject,
    version: u32,
    schema_type: SchemaType,
    schema: String,
    references: Vec<SchemaReference>,
    codec: Arc<CodecCell>,
}

impl Schema {
    pub fn new(
        id: SchemaId,
        subject: impl Into<Subject>,
        version: u32,
        schema_type: SchemaType,
        schema: impl Into<String>,
    ) -> Self {
        Self {
            id,
            subject: subject.into(),
            version,
            schema_type,
            schema: schema.into(),
            references: Vec::new(),
            codec: Arc::new(CodecCell::new()),
        }
    }

    /// Attach references
    pub fn with_references(mut self, references: Vec<SchemaReference>) -> Self {
        self.references = references;
        self
    }

    pub fn id(&self) -> SchemaId {
        self.id
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn schema_type(&self) -> SchemaType {
        self.schema_type
    }

    /// Raw schema text
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn references(&self) -> &[SchemaReference] {
        &self.references
    }

    /// Codec handle, built on first use
    ///
    /// Returns `None` when the schema text cannot be turned into a codec.
    pub fn codec(&self) -> Option<Arc<Codec>> {
        self.codec.get_or_build(self.schema_type, &self.schema)
    }

    /// Build the codec now and surface the construction error
    pub fn materialize_codec(&self) -> ClientResult<Arc<Codec>> {
        self.codec.try_build(self.schema_type, &self.schema)
    }

    /// Whether the codec has already been built (successfully or not)
    pub fn codec_initialized(&self) -> bool {
        self.codec.is_initialized()
    }

    /// Whether two handles share the same codec cell
    pub fn shares_codec_with(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.codec, &other.codec)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.subject == other.subject
            && self.version == other.version
            && self.schema_type == other.schema_type
            && self.schema == other.schema
            && self.references == other.references
    }
}

impl Eq for Schema {}

/// Compatibility level for schema evolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompatibilityLevel {
    /// No compatibility checking
    None,
    /// New schema can read data written with old schema
    #[default]
    Backward,
    /// New schema can read data written with all previous versions
    BackwardTransitive,
    /// Old schema can read data written with new schema
    Forward,
    /// Old schema can read data written with all newer versions
    ForwardTransitive,
    /// Both backward and forward compatible
    Full,
    /// Both backward and forward compatible with all versions
    FullTransitive,
}

impl std::fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompatibilityLevel::None => write!(f, "NONE"),
            CompatibilityLevel::Backward => write!(f, "BACKWARD"),
            CompatibilityLevel::BackwardTransitive => write!(f, "BACKWARD_TRANSITIVE"),
            CompatibilityLevel::Forward => write!(f, "FORWARD"),
            CompatibilityLevel::ForwardTransitive => write!(f, "FORWARD_TRANSITIVE"),
            CompatibilityLevel::Full => write!(f, "FULL"),
            CompatibilityLevel::FullTransitive => write!(f, "FULL_TRANSITIVE"),
        }
    }
}

impl std::str::FromStr for CompatibilityLevel {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NONE" => Ok(CompatibilityLevel::None),
            "BACKWARD" => Ok(CompatibilityLevel::Backward),
            "BACKWARD_TRANSITIVE" => Ok(CompatibilityLevel::BackwardTransitive),
            "FORWARD" => Ok(CompatibilityLevel::Forward),
            "FORWARD_TRANSITIVE" => Ok(CompatibilityLevel::ForwardTransitive),
            "FULL" => Ok(CompatibilityLevel::Full),
            "FULL_TRANSITIVE" => Ok(CompatibilityLevel::FullTransitive),
            _ => Err(ClientError::InvalidRequest(format!(
                "Unknown compatibility level: {}",
                s
            ))),
        }
    }
}

/// Registry mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    #[default]
    ReadWrite,
    ReadOnly,
    Import,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::ReadWrite => write!(f, "READWRITE"),
            Mode::ReadOnly => write!(f, "READONLY"),
            Mode::Import => write!(f, "IMPORT"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "READWRITE" => Ok(Mode::ReadWrite),
            "READONLY" => Ok(Mode::ReadOnly),
            "IMPORT" => Ok(Mode::Import),
            _ => Err(ClientError::InvalidRequest(format!("Unknown mode: {}", s))),
        }
    }
}
