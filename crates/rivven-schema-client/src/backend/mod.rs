//! Upstream registry backends
//!
//! The client facade talks to its upstream through [`RegistryBackend`]:
//!
//! - **Http**: a remote Confluent-compatible registry over `reqwest`
//! - **Local**: an in-process [`SchemaCatalog`](crate::SchemaCatalog)

mod http;
mod local;

pub use http::HttpBackend;
pub use local::LocalBackend;

use crate::error::ClientResult;
use crate::types::{
    CompatibilityLevel, Mode, Schema, SchemaId, SchemaReference, SchemaType, SubjectVersionRef,
    VersionSelector,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Upstream operations behind the client facade
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    /// List subjects with at least one live version
    async fn list_subjects(&self) -> ClientResult<Vec<String>>;

    /// List schema types known to the registry
    async fn list_schema_types(&self) -> ClientResult<Vec<SchemaType>>;

    /// Get schema by global ID
    async fn get_schema_by_id(&self, id: SchemaId) -> ClientResult<Schema>;

    /// Get every (subject, version) using an ID
    async fn get_versions_by_id(&self, id: SchemaId) -> ClientResult<Vec<SubjectVersionRef>>;

    /// Get a specific version (or the latest) of a subject
    async fn get_schema_by_version(
        &self,
        subject: &str,
        version: VersionSelector,
    ) -> ClientResult<Schema>;

    /// Get all live versions of a subject
    async fn list_versions(&self, subject: &str) -> ClientResult<Vec<u32>>;

    /// Register a new version under a subject
    async fn register_schema(
        &self,
        subject: &str,
        schema_type: SchemaType,
        schema: &str,
        references: &[SchemaReference],
    ) -> ClientResult<Schema>;

    /// Find an already registered, equivalent schema under a subject
    async fn lookup_schema(
        &self,
        subject: &str,
        schema_type: SchemaType,
        schema: &str,
        references: &[SchemaReference],
    ) -> ClientResult<Schema>;

    /// Check a schema against a registered version
    async fn check_compatibility(
        &self,
        subject: &str,
        version: VersionSelector,
        schema_type: SchemaType,
        schema: &str,
        references: &[SchemaReference],
    ) -> ClientResult<bool>;

    /// Delete a subject, returning the removed versions
    async fn delete_subject(&self, subject: &str, permanent: bool) -> ClientResult<Vec<u32>>;

    /// Delete one version, returning its number
    async fn delete_version(
        &self,
        subject: &str,
        version: VersionSelector,
        permanent: bool,
    ) -> ClientResult<u32>;

    async fn get_global_compatibility(&self) -> ClientResult<CompatibilityLevel>;

    async fn get_subject_compatibility(&self, subject: &str) -> ClientResult<CompatibilityLevel>;

    async fn get_global_mode(&self) -> ClientResult<Mode>;

    async fn get_subject_mode(&self, subject: &str) -> ClientResult<Mode>;

    /// Use HTTP basic credentials on every later request
    ///
    /// Backends without a transport ignore this.
    fn set_credentials(&self, _username: &str, _password: &str) {}
}

/// Shared backend handle
pub type Backend = Arc<dyn RegistryBackend>;
