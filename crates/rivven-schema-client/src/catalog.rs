//! Reference schema catalog
//!
//! In-process store that follows the registry's storage rules:
//! - IDs come from one counter shared by every subject and are never reused
//! - versions are per subject, start at 1 and are never reused
//! - plain registration always appends (no deduplication)
//! - reads never mutate
//!
//! All state lives behind a single [`RwLock`] so the ID index and the subject
//! index can never disagree.

use crate::equivalence::canonicalize;
use crate::error::{ClientError, ClientResult};
use crate::types::{
    Schema, SchemaId, SchemaReference, SchemaType, Subject, SubjectVersionRef, VersionSelector,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};

#[derive(Default)]
struct CatalogState {
    /// Live entries by ID
    entries: BTreeMap<SchemaId, Schema>,
    /// Subject -> version -> ID for live entries
    subjects: HashMap<String, BTreeMap<u32, SchemaId>>,
    /// Highest ID ever handed out
    last_id: u32,
    /// Highest version ever handed out per subject
    last_versions: HashMap<String, u32>,
}

impl CatalogState {
    fn versions(&self, subject: &str) -> ClientResult<&BTreeMap<u32, SchemaId>> {
        self.subjects
            .get(subject)
            .filter(|versions| !versions.is_empty())
            .ok_or_else(|| ClientError::SubjectNotFound(subject.to_string()))
    }

    fn resolve_version(&self, subject: &str, selector: VersionSelector) -> ClientResult<(u32, SchemaId)> {
        let versions = self.versions(subject)?;
        let found = match selector {
            VersionSelector::Latest => versions.iter().next_back().map(|(v, id)| (*v, *id)),
            VersionSelector::Number(v) => versions.get(&v).map(|id| (v, *id)),
        };
        found.ok_or_else(|| ClientError::VersionNotFound {
            subject: subject.to_string(),
            version: selector.to_string(),
        })
    }

    fn entry(&self, id: SchemaId) -> ClientResult<&Schema> {
        self.entries
            .get(&id)
            .ok_or_else(|| ClientError::Internal(format!("Subject index points at missing ID {}", id)))
    }

    fn insert(&mut self, schema: Schema) {
        let subject = schema.subject().as_str().to_string();
        let version = schema.version();
        let id = schema.id();

        self.last_id = self.last_id.max(id.0);
        let last_version = self.last_versions.entry(subject.clone()).or_insert(0);
        *last_version = (*last_version).max(version);

        self.subjects.entry(subject).or_default().insert(version, id);
        self.entries.insert(id, schema);
    }

    fn remove(&mut self, subject: &str, version: u32) -> Option<Schema> {
        let versions = self.subjects.get_mut(subject)?;
        let id = versions.remove(&version)?;
        if versions.is_empty() {
            self.subjects.remove(subject);
        }
        self.entries.remove(&id)
    }
}

/// Authoritative in-memory schema store
pub struct SchemaCatalog {
    state: RwLock<CatalogState>,
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("SchemaCatalog")
            .field("entries", &state.entries.len())
            .field("subjects", &state.subjects.len())
            .field("last_id", &state.last_id)
            .finish()
    }
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CatalogState::default()),
        }
    }

    /// Build a catalog preloaded with existing entries
    ///
    /// Counters continue above the highest preloaded ID and versions.
    pub fn from_entries(entries: impl IntoIterator<Item = Schema>) -> ClientResult<Self> {
        let mut state = CatalogState::default();
        for schema in entries {
            if state.entries.contains_key(&schema.id()) {
                return Err(ClientError::Conflict(format!(
                    "Duplicate schema ID {}",
                    schema.id()
                )));
            }
            if schema.version() == 0 {
                return Err(ClientError::InvalidVersion("0".to_string()));
            }
            let taken = state
                .subjects
                .get(schema.subject().as_str())
                .is_some_and(|versions| versions.contains_key(&schema.version()));
            if taken {
                return Err(ClientError::Conflict(format!(
                    "Duplicate version {} for subject {}",
                    schema.version(),
                    schema.subject()
                )));
            }
            state.insert(schema);
        }
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Append a new entry under `subject`
    pub fn register(
        &self,
        subject: &str,
        schema_type: SchemaType,
        schema: &str,
        references: Vec<SchemaReference>,
    ) -> ClientResult<Schema> {
        if subject.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "Subject must not be empty".to_string(),
            ));
        }
        if schema.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "Schema must not be empty".to_string(),
            ));
        }
        if matches!(schema_type, SchemaType::Avro | SchemaType::Json) {
            serde_json::from_str::<serde_json::Value>(schema).map_err(|e| {
                ClientError::InvalidRequest(format!("Invalid {} schema: {}", schema_type, e))
            })?;
        }

        let mut state = self.state.write();

        let id = state
            .last_id
            .checked_add(1)
            .map(SchemaId::new)
            .ok_or_else(|| ClientError::Internal("Schema ID space exhausted".to_string()))?;
        let version = state
            .last_versions
            .get(subject)
            .copied()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| ClientError::Internal(format!("Version space exhausted for {}", subject)))?;

        let entry = Schema::new(id, Subject::new(subject), version, schema_type, schema)
            .with_references(references);
        state.insert(entry.clone());

        info!(subject = %subject, id = %id, version, schema_type = %schema_type, "Registered schema");
        Ok(entry)
    }

    pub fn get_by_id(&self, id: SchemaId) -> ClientResult<Schema> {
        self.state
            .read()
            .entries
            .get(&id)
            .cloned()
            .ok_or_else(|| ClientError::SchemaNotFound(format!("Schema ID {}", id)))
    }

    pub fn get_latest(&self, subject: &str) -> ClientResult<Schema> {
        self.get_by_version(subject, VersionSelector::Latest)
    }

    pub fn get_by_version(&self, subject: &str, selector: VersionSelector) -> ClientResult<Schema> {
        let state = self.state.read();
        let (_, id) = state.resolve_version(subject, selector)?;
        state.entry(id).cloned()
    }

    /// Subjects with at least one live entry, sorted
    pub fn list_subjects(&self) -> Vec<String> {
        let state = self.state.read();
        let mut subjects: Vec<String> = state.subjects.keys().cloned().collect();
        subjects.sort();
        subjects
    }

    /// Live versions of a subject in ascending order
    pub fn list_versions(&self, subject: &str) -> Vec<u32> {
        self.state
            .read()
            .subjects
            .get(subject)
            .map(|versions| versions.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Every (subject, version) pointing at an ID
    pub fn versions_by_id(&self, id: SchemaId) -> ClientResult<Vec<SubjectVersionRef>> {
        let state = self.state.read();
        let entry = state
            .entries
            .get(&id)
            .ok_or_else(|| ClientError::SchemaNotFound(format!("Schema ID {}", id)))?;
        Ok(vec![SubjectVersionRef {
            subject: entry.subject().as_str().to_string(),
            version: entry.version(),
        }])
    }

    /// Distinct schema types of live entries, sorted
    pub fn schema_types(&self) -> Vec<SchemaType> {
        let state = self.state.read();
        let types: BTreeSet<SchemaType> = state.entries.values().map(|s| s.schema_type()).collect();
        types.into_iter().collect()
    }

    /// First live entry under `subject` that is structurally equal to `schema`
    pub fn find_equivalent(
        &self,
        subject: &str,
        schema_type: SchemaType,
        schema: &str,
    ) -> ClientResult<Schema> {
        let query = canonicalize(schema_type, schema)?;

        let state = self.state.read();
        let not_found = || ClientError::SchemaNotFound(format!("No matching schema under {}", subject));
        let versions = state.subjects.get(subject).ok_or_else(not_found)?;

        for id in versions.values() {
            let candidate = state.entry(*id)?;
            if candidate.schema_type() != schema_type {
                continue;
            }
            match canonicalize(schema_type, candidate.schema()) {
                Ok(canonical) if canonical == query => {
                    debug!(subject = %subject, id = %candidate.id(), "Found equivalent schema");
                    return Ok(candidate.clone());
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(subject = %subject, id = %candidate.id(), error = %e, "Skipping unparsable schema");
                }
            }
        }

        Err(not_found())
    }

    /// Remove one version of a subject
    pub fn delete_version(&self, subject: &str, selector: VersionSelector) -> ClientResult<u32> {
        let mut state = self.state.write();
        let (version, _) = state.resolve_version(subject, selector)?;
        state.remove(subject, version);
        info!(subject = %subject, version, "Deleted schema version");
        Ok(version)
    }

    /// Remove every version of a subject
    pub fn delete_subject(&self, subject: &str) -> Vec<u32> {
        let mut state = self.state.write();
        let versions: Vec<u32> = state
            .subjects
            .get(subject)
            .map(|versions| versions.keys().copied().collect())
            .unwrap_or_default();
        for version in &versions {
            state.remove(subject, *version);
        }
        if !versions.is_empty() {
            info!(subject = %subject, versions = ?versions, "Deleted subject");
        }
        versions
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRING_SCHEMA: &str = r#"{"type":"string"}"#;

    fn register(catalog: &SchemaCatalog, subject: &str, schema: &str) -> Schema {
        catalog
            .register(subject, SchemaType::Avro, schema, Vec::new())
            .unwrap()
    }

    #[test]
    fn test_register_exists_delete_latest() {
        let catalog = SchemaCatalog::new();

        let entry = register(&catalog, "test1", STRING_SCHEMA);
        assert_eq!(entry.id(), SchemaId::new(1));
        assert_eq!(entry.version(), 1);

        let found = catalog
            .find_equivalent("test1", SchemaType::Avro, "{ \"type\" : \"string\" }")
            .unwrap();
        assert_eq!(found, entry);

        let address = register(&catalog, "test1", r#"{"type":"string","name":"address"}"#);
        assert_eq!(address.id(), SchemaId::new(2));
        assert_eq!(address.version(), 2);

        // The earliest equivalent version wins
        let found = catalog
            .find_equivalent("test1", SchemaType::Avro, STRING_SCHEMA)
            .unwrap();
        assert_eq!(found.id(), SchemaId::new(1));

        assert_eq!(
            catalog
                .delete_version("test1", VersionSelector::Latest)
                .unwrap(),
            2
        );
        assert!(matches!(
            catalog.get_by_version("test1", VersionSelector::Number(2)),
            Err(ClientError::VersionNotFound { .. })
        ));
        assert!(matches!(
            catalog.get_by_id(SchemaId::new(2)),
            Err(ClientError::SchemaNotFound(_))
        ));

        let remaining = catalog
            .get_by_version("test1", VersionSelector::Number(1))
            .unwrap();
        assert_eq!(remaining, entry);
        assert_eq!(catalog.get_latest("test1").unwrap(), entry);
        assert_eq!(catalog.list_versions("test1"), vec![1]);

        assert_eq!(
            catalog
                .delete_version("test1", VersionSelector::Latest)
                .unwrap(),
            1
        );
        assert!(catalog.list_versions("test1").is_empty());
        assert!(catalog.list_subjects().is_empty());
    }

    #[test]
    fn test_list_subjects_sorted() {
        let catalog = SchemaCatalog::new();
        assert!(catalog.list_subjects().is_empty());

        register(&catalog, "b", r#""int""#);
        register(&catalog, "a", r#""int""#);
        assert_eq!(catalog.list_subjects(), vec!["a", "b"]);
    }

    #[test]
    fn test_ids_are_global_and_versions_per_subject() {
        let catalog = SchemaCatalog::new();
        let a1 = register(&catalog, "a", r#""int""#);
        let b1 = register(&catalog, "b", r#""int""#);
        let a2 = register(&catalog, "a", r#""long""#);

        assert_eq!((a1.id().0, a1.version()), (1, 1));
        assert_eq!((b1.id().0, b1.version()), (2, 1));
        assert_eq!((a2.id().0, a2.version()), (3, 2));
    }

    #[test]
    fn test_no_deduplication_on_register() {
        let catalog = SchemaCatalog::new();
        let first = register(&catalog, "s", STRING_SCHEMA);
        let second = register(&catalog, "s", STRING_SCHEMA);
        assert_ne!(first.id(), second.id());
        assert_eq!(catalog.list_versions("s"), vec![1, 2]);
    }

    #[test]
    fn test_ids_and_versions_not_reused_after_delete() {
        let catalog = SchemaCatalog::new();
        register(&catalog, "s", r#""int""#);
        register(&catalog, "s", r#""long""#);
        catalog.delete_version("s", VersionSelector::Latest).unwrap();

        let next = register(&catalog, "s", r#""float""#);
        assert_eq!(next.id(), SchemaId::new(3));
        assert_eq!(next.version(), 3);

        catalog.delete_subject("s");
        let again = register(&catalog, "s", r#""double""#);
        assert_eq!(again.id(), SchemaId::new(4));
        assert_eq!(again.version(), 4);
    }

    #[test]
    fn test_reads_are_pure() {
        let catalog = SchemaCatalog::new();
        register(&catalog, "s", STRING_SCHEMA);

        for _ in 0..3 {
            catalog.get_by_version("s", VersionSelector::Number(1)).unwrap();
            catalog.get_latest("s").unwrap();
            catalog.get_by_id(SchemaId::new(1)).unwrap();
        }
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_delete_version_is_scoped_to_subject() {
        let catalog = SchemaCatalog::new();
        register(&catalog, "a", r#""int""#);
        register(&catalog, "b", r#""int""#);

        catalog
            .delete_version("b", VersionSelector::Number(1))
            .unwrap();
        assert_eq!(catalog.list_versions("a"), vec![1]);
        assert!(catalog.list_versions("b").is_empty());
    }

    #[test]
    fn test_not_found_errors() {
        let catalog = SchemaCatalog::new();
        assert!(matches!(
            catalog.get_by_id(SchemaId::new(9)),
            Err(ClientError::SchemaNotFound(_))
        ));
        assert!(matches!(
            catalog.get_latest("missing"),
            Err(ClientError::SubjectNotFound(_))
        ));
        assert!(matches!(
            catalog.delete_version("missing", VersionSelector::Latest),
            Err(ClientError::SubjectNotFound(_))
        ));

        register(&catalog, "s", r#""int""#);
        assert!(matches!(
            catalog.get_by_version("s", VersionSelector::Number(2)),
            Err(ClientError::VersionNotFound { .. })
        ));
        assert!(matches!(
            catalog.delete_version("s", VersionSelector::Number(2)),
            Err(ClientError::VersionNotFound { .. })
        ));
        assert!(catalog.delete_subject("missing").is_empty());
    }

    #[test]
    fn test_register_validation() {
        let catalog = SchemaCatalog::new();
        for (subject, schema_type, schema) in [
            ("", SchemaType::Avro, r#""int""#),
            ("s", SchemaType::Avro, "   "),
            ("s", SchemaType::Avro, "{not json"),
            ("s", SchemaType::Json, "{not json"),
        ] {
            let err = catalog
                .register(subject, schema_type, schema, Vec::new())
                .unwrap_err();
            assert!(matches!(err, ClientError::InvalidRequest(_)));
        }
        assert!(catalog.is_empty());

        // Protobuf text is opaque at registration
        catalog
            .register("p", SchemaType::Protobuf, "syntax = \"proto3\";", Vec::new())
            .unwrap();
    }

    #[test]
    fn test_find_equivalent_rules() {
        let catalog = SchemaCatalog::new();
        register(&catalog, "s", r#""int""#);
        let second = register(&catalog, "s", STRING_SCHEMA);

        // Matching text under another subject does not count
        assert!(catalog
            .find_equivalent("other", SchemaType::Avro, STRING_SCHEMA)
            .unwrap_err()
            .is_not_found());

        // Type must match too
        assert!(catalog
            .find_equivalent("s", SchemaType::Json, STRING_SCHEMA)
            .unwrap_err()
            .is_not_found());

        assert_eq!(
            catalog
                .find_equivalent("s", SchemaType::Avro, STRING_SCHEMA)
                .unwrap()
                .id(),
            second.id()
        );

        assert!(matches!(
            catalog.find_equivalent("s", SchemaType::Avro, "{oops"),
            Err(ClientError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_find_equivalent_returns_lowest_version() {
        let catalog = SchemaCatalog::new();
        let first = register(&catalog, "s", STRING_SCHEMA);
        register(&catalog, "s", STRING_SCHEMA);
        let found = catalog
            .find_equivalent("s", SchemaType::Avro, STRING_SCHEMA)
            .unwrap();
        assert_eq!(found.version(), first.version());
    }

    #[test]
    fn test_versions_by_id_and_schema_types() {
        let catalog = SchemaCatalog::new();
        assert!(catalog.schema_types().is_empty());

        register(&catalog, "s", r#""int""#);
        catalog
            .register("j", SchemaType::Json, r#"{"type":"object"}"#, Vec::new())
            .unwrap();

        assert_eq!(
            catalog.versions_by_id(SchemaId::new(2)).unwrap(),
            vec![SubjectVersionRef {
                subject: "j".to_string(),
                version: 1
            }]
        );
        assert_eq!(
            catalog.schema_types(),
            vec![SchemaType::Avro, SchemaType::Json]
        );
    }

    #[test]
    fn test_from_entries_continues_counters() {
        let catalog = SchemaCatalog::from_entries([
            Schema::new(SchemaId::new(1), "test1", 1, SchemaType::Avro, STRING_SCHEMA),
            Schema::new(SchemaId::new(2), "test2", 1, SchemaType::Avro, r#""int""#),
        ])
        .unwrap();

        let next = register(&catalog, "test1", r#""long""#);
        assert_eq!(next.id(), SchemaId::new(3));
        assert_eq!(next.version(), 2);

        let duplicate = SchemaCatalog::from_entries([
            Schema::new(SchemaId::new(1), "a", 1, SchemaType::Avro, STRING_SCHEMA),
            Schema::new(SchemaId::new(1), "b", 1, SchemaType::Avro, STRING_SCHEMA),
        ]);
        assert!(matches!(duplicate, Err(ClientError::Conflict(_))));
    }

    #[test]
    fn test_concurrent_registrations_get_distinct_ids() {
        let catalog = std::sync::Arc::new(SchemaCatalog::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let catalog = catalog.clone();
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| {
                            catalog
                                .register(&format!("s{}", t % 2), SchemaType::Avro, r#""int""#, Vec::new())
                                .unwrap()
                                .id()
                                .0
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=200).collect::<Vec<_>>());
        assert_eq!(catalog.list_versions("s0"), (1..=100).collect::<Vec<_>>());
    }
}
