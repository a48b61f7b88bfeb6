//! # Rivven Schema Client
//!
//! A caching client for Confluent-compatible schema registries, together with
//! an in-process reference catalog and an HTTP emulator serving it.
//!
//! ## Features
//!
//! - **Resolution Cache**: by ID, by subject (latest) and by subject/version,
//!   filled on read-miss and switchable at runtime
//! - **Reference Catalog**: the registry's storage rules in memory (global IDs,
//!   per-subject versions, no reuse after deletion)
//! - **Equivalence Checks**: structural comparison for idempotent registration
//! - **Codecs**: lazily built Avro and JSON Schema encoders/decoders per entry
//! - **Deadlines and Cancellation**: every upstream call takes a [`CallContext`]
//! - **Emulator**: axum server exposing the catalog over the registry REST API
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SchemaRegistryClient                       │
//! │  ├── ResolutionCache (id / latest / subject+version)        │
//! │  └── CallContext (deadline, cancellation)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RegistryBackend                                             │
//! │  ├── HttpBackend  (remote registry, reqwest)                │
//! │  └── LocalBackend (in-process SchemaCatalog)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SchemaCatalog                                               │
//! │  ├── ID / version assignment                                 │
//! │  ├── Equivalence checker                                     │
//! │  └── EmulatorServer (REST surface, `server` feature)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rivven_schema_client::{CallContext, ClientConfig, SchemaRegistryClient, SchemaType};
//! use std::time::Duration;
//!
//! let client = SchemaRegistryClient::new(ClientConfig::new("http://localhost:8081"))?;
//! let ctx = CallContext::new().with_timeout(Duration::from_secs(5));
//!
//! let registered = client
//!     .register_schema(&ctx, "users-value", r#"{"type":"string"}"#, SchemaType::Avro, &[])
//!     .await?;
//!
//! let schema = client.get_schema_by_id(&ctx, registered.id()).await?;
//! let codec = schema.codec().expect("valid Avro schema");
//! let bytes = codec.encode(&serde_json::json!("hello"))?;
//! ```
//!
//! ### In-process catalog
//!
//! ```rust
//! use rivven_schema_client::{SchemaCatalog, SchemaType, VersionSelector};
//!
//! let catalog = SchemaCatalog::new();
//! let entry = catalog
//!     .register("test1", SchemaType::Avro, r#"{"type":"string"}"#, Vec::new())
//!     .unwrap();
//! assert_eq!(entry.id().as_u32(), 1);
//! assert_eq!(catalog.delete_version("test1", VersionSelector::Latest).unwrap(), 1);
//! assert!(catalog.list_subjects().is_empty());
//! ```
//!
//! ### As a Standalone Emulator
//!
//! ```bash
//! rivven-schema-client serve --port 8081
//! ```

pub mod backend;
pub mod cache;
pub mod catalog;
pub mod client;
pub mod codec;
pub mod config;
pub mod context;
pub mod equivalence;
pub mod error;
#[cfg(feature = "server")]
pub mod server;
pub mod types;

// Re-exports for convenience
pub use backend::{Backend, HttpBackend, LocalBackend, RegistryBackend};
pub use cache::{CacheStats, ResolutionCache};
pub use catalog::SchemaCatalog;
pub use client::SchemaRegistryClient;
pub use codec::{Codec, CodecCell};
pub use config::{ClientConfig, EmulatorConfig};
pub use context::CallContext;
pub use error::{error_codes, ClientError, ClientResult};
#[cfg(feature = "server")]
pub use server::{EmulatorServer, ServerState};
pub use types::{
    CompatibilityLevel, Mode, Schema, SchemaId, SchemaReference, SchemaType, Subject,
    SubjectVersionRef, VersionSelector,
};
