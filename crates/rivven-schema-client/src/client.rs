//! Schema registry client - main interface
//!
//! Composes the [`ResolutionCache`] with an upstream [`RegistryBackend`]:
//! - reads are answered from cache when possible, otherwise fetched once
//!   and written back after success
//! - writes, deletes and admin calls always go upstream
//! - every upstream call honours the caller's [`CallContext`]

use crate::backend::{Backend, HttpBackend, LocalBackend};
use crate::cache::{CacheStats, ResolutionCache};
use crate::catalog::SchemaCatalog;
use crate::config::ClientConfig;
use crate::context::CallContext;
use crate::error::{ClientError, ClientResult};
use crate::types::{
    CompatibilityLevel, Mode, Schema, SchemaId, SchemaReference, SchemaType, SubjectVersionRef,
    VersionSelector,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Caching schema registry client
///
/// Thread-safe; share it behind an `Arc`.
pub struct SchemaRegistryClient {
    /// Upstream registry
    backend: Backend,
    /// Read-miss cache
    cache: ResolutionCache,
    /// Build codecs as soon as an entry is fetched
    codec_creation: AtomicBool,
}

impl std::fmt::Debug for SchemaRegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistryClient")
            .field("cache", &self.cache)
            .field("codec_creation", &self.codec_creation_enabled())
            .finish()
    }
}

impl SchemaRegistryClient {
    /// Create a client for a remote registry
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let backend = HttpBackend::new(&config)?;
        info!(url = %backend.base_url(), "Created schema registry client");

        let client = Self::with_backend(Arc::new(backend));
        client.set_caching_enabled(config.caching_enabled);
        client.set_codec_creation_enabled(config.codec_creation_enabled);
        Ok(client)
    }

    /// Create a client over any backend, with caching on and codec creation off
    pub fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            cache: ResolutionCache::new(true),
            codec_creation: AtomicBool::new(false),
        }
    }

    /// Create a client over an in-process catalog
    pub fn local(catalog: Arc<SchemaCatalog>) -> Self {
        Self::with_backend(Arc::new(LocalBackend::new(catalog)))
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    // ========================================================================
    // Toggles
    // ========================================================================

    /// Turn the resolution cache on or off; turning it off clears it
    pub fn set_caching_enabled(&self, enabled: bool) {
        self.cache.set_enabled(enabled);
    }

    pub fn caching_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    /// Build codecs eagerly on every fetch
    pub fn set_codec_creation_enabled(&self, enabled: bool) {
        self.codec_creation.store(enabled, Ordering::SeqCst);
    }

    pub fn codec_creation_enabled(&self) -> bool {
        self.codec_creation.load(Ordering::SeqCst)
    }

    /// Send HTTP basic credentials on every later request
    pub fn set_credentials(&self, username: &str, password: &str) {
        self.backend.set_credentials(username, password);
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // ========================================================================
    // Discovery
    // ========================================================================

    pub async fn list_subjects(&self, ctx: &CallContext) -> ClientResult<Vec<String>> {
        ctx.run("list_subjects", self.backend.list_subjects()).await
    }

    pub async fn list_schema_types(&self, ctx: &CallContext) -> ClientResult<Vec<SchemaType>> {
        ctx.run("list_schema_types", self.backend.list_schema_types())
            .await
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Get the latest version of a subject
    ///
    /// A cached latest entry is not refreshed when newer versions are
    /// registered.
    pub async fn get_latest_schema(&self, ctx: &CallContext, subject: &str) -> ClientResult<Schema> {
        if let Some(schema) = self.cache.get_latest(subject) {
            debug!(subject = %subject, "Latest schema cache hit");
            return self.prepare(schema);
        }

        let schema = ctx
            .run(
                "get_latest_schema",
                self.backend
                    .get_schema_by_version(subject, VersionSelector::Latest),
            )
            .await?;
        let schema = self.prepare(schema)?;
        self.cache.put_latest(subject, schema.clone());
        Ok(schema)
    }

    /// Get schema by global ID
    pub async fn get_schema_by_id(&self, ctx: &CallContext, id: SchemaId) -> ClientResult<Schema> {
        if let Some(schema) = self.cache.get_by_id(id) {
            debug!(id = %id, "Schema cache hit");
            return self.prepare(schema);
        }

        let schema = ctx
            .run("get_schema_by_id", self.backend.get_schema_by_id(id))
            .await?;
        let schema = self.prepare(schema)?;
        self.cache.put_by_id(schema.clone());
        Ok(schema)
    }

    /// Get a specific version of a subject; `latest` shares the latest key space
    pub async fn get_schema_by_subject_and_version(
        &self,
        ctx: &CallContext,
        subject: &str,
        version: VersionSelector,
    ) -> ClientResult<Schema> {
        let number = match version {
            VersionSelector::Latest => return self.get_latest_schema(ctx, subject).await,
            VersionSelector::Number(v) => v,
        };

        if let Some(schema) = self.cache.get_version(subject, number) {
            debug!(subject = %subject, version = number, "Schema version cache hit");
            return self.prepare(schema);
        }

        let schema = ctx
            .run(
                "get_schema_by_subject_and_version",
                self.backend.get_schema_by_version(subject, version),
            )
            .await?;
        let schema = self.prepare(schema)?;
        self.cache.put_version(subject, number, schema.clone());
        Ok(schema)
    }

    pub async fn get_versions_by_id(
        &self,
        ctx: &CallContext,
        id: SchemaId,
    ) -> ClientResult<Vec<SubjectVersionRef>> {
        ctx.run("get_versions_by_id", self.backend.get_versions_by_id(id))
            .await
    }

    pub async fn get_versions_by_subject(
        &self,
        ctx: &CallContext,
        subject: &str,
    ) -> ClientResult<Vec<u32>> {
        ctx.run("get_versions_by_subject", self.backend.list_versions(subject))
            .await
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Register a schema under a subject
    ///
    /// The returned entry is not written into the cache.
    pub async fn register_schema(
        &self,
        ctx: &CallContext,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
        references: &[SchemaReference],
    ) -> ClientResult<Schema> {
        ctx.run(
            "register_schema",
            self.backend
                .register_schema(subject, schema_type, schema, references),
        )
        .await
    }

    /// Find an already registered, structurally equal schema under a subject
    pub async fn check_schema_exists(
        &self,
        ctx: &CallContext,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
        references: &[SchemaReference],
    ) -> ClientResult<Schema> {
        ctx.run(
            "check_schema_exists",
            self.backend
                .lookup_schema(subject, schema_type, schema, references),
        )
        .await
    }

    pub async fn check_compatibility(
        &self,
        ctx: &CallContext,
        subject: &str,
        schema: &str,
        version: VersionSelector,
        schema_type: SchemaType,
        references: &[SchemaReference],
    ) -> ClientResult<bool> {
        ctx.run(
            "check_compatibility",
            self.backend
                .check_compatibility(subject, version, schema_type, schema, references),
        )
        .await
    }

    // ========================================================================
    // Deletes
    // ========================================================================

    /// Delete a subject; cached entries are left in place
    pub async fn delete_subject(
        &self,
        ctx: &CallContext,
        subject: &str,
        permanent: bool,
    ) -> ClientResult<Vec<u32>> {
        ctx.run(
            "delete_subject",
            self.backend.delete_subject(subject, permanent),
        )
        .await
    }

    pub async fn delete_version(
        &self,
        ctx: &CallContext,
        subject: &str,
        version: VersionSelector,
        permanent: bool,
    ) -> ClientResult<u32> {
        ctx.run(
            "delete_version",
            self.backend.delete_version(subject, version, permanent),
        )
        .await
    }

    // ========================================================================
    // Admin
    // ========================================================================

    pub async fn get_global_compatibility_config(
        &self,
        ctx: &CallContext,
    ) -> ClientResult<CompatibilityLevel> {
        ctx.run(
            "get_global_compatibility_config",
            self.backend.get_global_compatibility(),
        )
        .await
    }

    pub async fn get_subject_compatibility_config(
        &self,
        ctx: &CallContext,
        subject: &str,
    ) -> ClientResult<CompatibilityLevel> {
        ctx.run(
            "get_subject_compatibility_config",
            self.backend.get_subject_compatibility(subject),
        )
        .await
    }

    pub async fn get_global_mode(&self, ctx: &CallContext) -> ClientResult<Mode> {
        ctx.run("get_global_mode", self.backend.get_global_mode())
            .await
    }

    pub async fn get_subject_mode(&self, ctx: &CallContext, subject: &str) -> ClientResult<Mode> {
        ctx.run("get_subject_mode", self.backend.get_subject_mode(subject))
            .await
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    /// Apply eager codec creation to a fetched entry
    fn prepare(&self, schema: Schema) -> ClientResult<Schema> {
        if self.codec_creation_enabled() && schema.schema_type().has_codec() {
            schema.materialize_codec().map_err(|e| {
                ClientError::InvalidRequest(format!(
                    "Failed to create codec for schema {}: {}",
                    schema.id(),
                    e
                ))
            })?;
        }
        Ok(schema)
    }
}
