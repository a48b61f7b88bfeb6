//! In-process backend over a shared catalog

use super::RegistryBackend;
use crate::catalog::SchemaCatalog;
use crate::error::{ClientError, ClientResult};
use crate::types::{
    CompatibilityLevel, Mode, Schema, SchemaId, SchemaReference, SchemaType, SubjectVersionRef,
    VersionSelector,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Backend that resolves against a [`SchemaCatalog`] in the same process
///
/// Compatibility checks and modes are not modelled and answer
/// [`ClientError::Unimplemented`], like the HTTP emulator does.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    catalog: Arc<SchemaCatalog>,
    compatibility: CompatibilityLevel,
}

impl LocalBackend {
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self {
            catalog,
            compatibility: CompatibilityLevel::default(),
        }
    }

    pub fn with_compatibility(mut self, level: CompatibilityLevel) -> Self {
        self.compatibility = level;
        self
    }

    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.catalog
    }
}

#[async_trait]
impl RegistryBackend for LocalBackend {
    async fn list_subjects(&self) -> ClientResult<Vec<String>> {
        Ok(self.catalog.list_subjects())
    }

    async fn list_schema_types(&self) -> ClientResult<Vec<SchemaType>> {
        Ok(self.catalog.schema_types())
    }

    async fn get_schema_by_id(&self, id: SchemaId) -> ClientResult<Schema> {
        self.catalog.get_by_id(id)
    }

    async fn get_versions_by_id(&self, id: SchemaId) -> ClientResult<Vec<SubjectVersionRef>> {
        self.catalog.versions_by_id(id)
    }

    async fn get_schema_by_version(
        &self,
        subject: &str,
        version: VersionSelector,
    ) -> ClientResult<Schema> {
        self.catalog.get_by_version(subject, version)
    }

    async fn list_versions(&self, subject: &str) -> ClientResult<Vec<u32>> {
        Ok(self.catalog.list_versions(subject))
    }

    async fn register_schema(
        &self,
        subject: &str,
        schema_type: SchemaType,
        schema: &str,
        references: &[SchemaReference],
    ) -> ClientResult<Schema> {
        self.catalog
            .register(subject, schema_type, schema, references.to_vec())
    }

    async fn lookup_schema(
        &self,
        subject: &str,
        schema_type: SchemaType,
        schema: &str,
        _references: &[SchemaReference],
    ) -> ClientResult<Schema> {
        self.catalog.find_equivalent(subject, schema_type, schema)
    }

    async fn check_compatibility(
        &self,
        _subject: &str,
        _version: VersionSelector,
        _schema_type: SchemaType,
        _schema: &str,
        _references: &[SchemaReference],
    ) -> ClientResult<bool> {
        Err(ClientError::Unimplemented(
            "Compatibility checks are not supported by the local catalog".to_string(),
        ))
    }

    async fn delete_subject(&self, subject: &str, _permanent: bool) -> ClientResult<Vec<u32>> {
        Ok(self.catalog.delete_subject(subject))
    }

    async fn delete_version(
        &self,
        subject: &str,
        version: VersionSelector,
        _permanent: bool,
    ) -> ClientResult<u32> {
        self.catalog.delete_version(subject, version)
    }

    async fn get_global_compatibility(&self) -> ClientResult<CompatibilityLevel> {
        Ok(self.compatibility)
    }

    async fn get_subject_compatibility(&self, _subject: &str) -> ClientResult<CompatibilityLevel> {
        Err(ClientError::Unimplemented(
            "Per-subject compatibility config is not supported by the local catalog".to_string(),
        ))
    }

    async fn get_global_mode(&self) -> ClientResult<Mode> {
        Err(ClientError::Unimplemented(
            "Modes are not supported by the local catalog".to_string(),
        ))
    }

    async fn get_subject_mode(&self, _subject: &str) -> ClientResult<Mode> {
        Err(ClientError::Unimplemented(
            "Modes are not supported by the local catalog".to_string(),
        ))
    }
}
