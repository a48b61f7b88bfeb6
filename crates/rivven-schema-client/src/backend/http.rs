//! Remote registry backend (Confluent-compatible REST API)

use super::RegistryBackend;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::types::{
    CompatibilityLevel, Mode, Schema, SchemaId, SchemaReference, SchemaType, Subject,
    SubjectVersionRef, VersionSelector,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Media type spoken by the registry
pub const SCHEMA_REGISTRY_CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Request body for register, lookup and compatibility calls
#[derive(Debug, Serialize)]
struct SchemaRequest<'a> {
    schema: &'a str,
    #[serde(rename = "schemaType")]
    schema_type: SchemaType,
    #[serde(skip_serializing_if = "no_references")]
    references: &'a [SchemaReference],
}

fn no_references(references: &&[SchemaReference]) -> bool {
    references.is_empty()
}

/// Any registry response describing a schema
///
/// `GET /schemas/ids/{id}` omits subject and version, a bare registration
/// response only carries the ID.
#[derive(Debug, Deserialize)]
struct SchemaResponse {
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    schema: Option<String>,
    #[serde(rename = "schemaType", default)]
    schema_type: Option<String>,
    #[serde(default)]
    references: Vec<SchemaReference>,
}

impl SchemaResponse {
    fn into_schema(self, fallback_id: Option<SchemaId>, fallback_subject: &str) -> ClientResult<Schema> {
        let id = self
            .id
            .map(SchemaId::new)
            .or(fallback_id)
            .ok_or_else(|| ClientError::Serialization("Registry response has no schema id".to_string()))?;
        let schema = self
            .schema
            .ok_or_else(|| ClientError::Serialization("Registry response has no schema".to_string()))?;
        // Registries omit the type for Avro
        let schema_type = match self.schema_type.as_deref() {
            Some(t) => t.parse()?,
            None => SchemaType::Avro,
        };
        let subject = self.subject.unwrap_or_else(|| fallback_subject.to_string());

        Ok(
            Schema::new(id, Subject::new(subject), self.version.unwrap_or(0), schema_type, schema)
                .with_references(self.references),
        )
    }
}

#[derive(Debug, Deserialize)]
struct CompatibilityCheckResponse {
    is_compatible: bool,
}

#[derive(Debug, Deserialize)]
struct ConfigResponse {
    #[serde(rename = "compatibilityLevel", alias = "compatibility")]
    compatibility_level: CompatibilityLevel,
}

#[derive(Debug, Deserialize)]
struct ModeResponse {
    mode: Mode,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error_code: Option<u32>,
    message: Option<String>,
}

/// Registry client over HTTP
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    credentials: RwLock<Option<(String, String)>>,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.credentials.read().is_some())
            .finish()
    }
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let base_url = Url::parse(config.url.trim_end_matches('/'))
            .map_err(|e| ClientError::Config(format!("Invalid registry URL {}: {}", config.url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "Registry URL cannot be a base: {}",
                config.url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        let credentials = match (&config.username, &config.password) {
            (Some(username), password) => {
                Some((username.clone(), password.clone().unwrap_or_default()))
            }
            _ => None,
        };

        Ok(Self {
            client,
            base_url,
            credentials: RwLock::new(credentials),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL, percent-encoding every path segment
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Config("Registry URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .header(ACCEPT, SCHEMA_REGISTRY_CONTENT_TYPE);
        if let Some((username, password)) = self.credentials.read().as_ref() {
            builder = builder.basic_auth(username, Some(password));
        }
        builder
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error(status, &body));
        }
        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let url = self.endpoint(segments)?;
        debug!(url = %url, "GET");
        self.send(self.request(Method::GET, url)).await
    }

    async fn post_schema<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        schema_type: SchemaType,
        schema: &str,
        references: &[SchemaReference],
    ) -> ClientResult<T> {
        let url = self.endpoint(segments)?;
        debug!(url = %url, "POST");
        let body = SchemaRequest {
            schema,
            schema_type,
            references,
        };
        let builder = self
            .request(Method::POST, url)
            .header(CONTENT_TYPE, SCHEMA_REGISTRY_CONTENT_TYPE)
            .json(&body);
        self.send(builder).await
    }

    async fn delete<T: DeserializeOwned>(&self, segments: &[&str], permanent: bool) -> ClientResult<T> {
        let url = self.endpoint(segments)?;
        debug!(url = %url, permanent, "DELETE");
        let builder = self
            .request(Method::DELETE, url)
            .query(&[("permanent", permanent)]);
        self.send(builder).await
    }
}

fn parse_error(status: StatusCode, body: &str) -> ClientError {
    if let Ok(err) = serde_json::from_str::<ErrorResponse>(body) {
        let message = err.message.unwrap_or_else(|| body.to_string());
        if let Some(code) = err.error_code {
            return ClientError::from_error_code(code, message);
        }
    }

    match status {
        StatusCode::NOT_FOUND => ClientError::SchemaNotFound(body.to_string()),
        StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => {
            ClientError::InvalidRequest(body.to_string())
        }
        StatusCode::CONFLICT => ClientError::Conflict(body.to_string()),
        StatusCode::NOT_IMPLEMENTED => ClientError::Unimplemented(body.to_string()),
        _ => ClientError::UpstreamUnavailable(format!("{}: {}", status, body)),
    }
}

#[async_trait]
impl RegistryBackend for HttpBackend {
    async fn list_subjects(&self) -> ClientResult<Vec<String>> {
        self.get(&["subjects"]).await
    }

    async fn list_schema_types(&self) -> ClientResult<Vec<SchemaType>> {
        self.get(&["schemas", "types"]).await
    }

    async fn get_schema_by_id(&self, id: SchemaId) -> ClientResult<Schema> {
        let response: SchemaResponse = self.get(&["schemas", "ids", &id.to_string()]).await?;
        response.into_schema(Some(id), "")
    }

    async fn get_versions_by_id(&self, id: SchemaId) -> ClientResult<Vec<SubjectVersionRef>> {
        self.get(&["schemas", "ids", &id.to_string(), "versions"])
            .await
    }

    async fn get_schema_by_version(
        &self,
        subject: &str,
        version: VersionSelector,
    ) -> ClientResult<Schema> {
        let response: SchemaResponse = self
            .get(&["subjects", subject, "versions", &version.to_string()])
            .await?;
        response.into_schema(None, subject)
    }

    async fn list_versions(&self, subject: &str) -> ClientResult<Vec<u32>> {
        self.get(&["subjects", subject, "versions"]).await
    }

    async fn register_schema(
        &self,
        subject: &str,
        schema_type: SchemaType,
        schema: &str,
        references: &[SchemaReference],
    ) -> ClientResult<Schema> {
        let response: SchemaResponse = self
            .post_schema(
                &["subjects", subject, "versions"],
                schema_type,
                schema,
                references,
            )
            .await?;

        let registered = if response.version.is_some() && response.schema.is_some() {
            response.into_schema(None, subject)?
        } else {
            // Plain Confluent registries only answer with the id; fetch the rest
            self.lookup_schema(subject, schema_type, schema, references)
                .await?
        };

        info!(
            subject = %subject,
            id = %registered.id(),
            version = registered.version(),
            "Registered schema to remote registry"
        );
        Ok(registered)
    }

    async fn lookup_schema(
        &self,
        subject: &str,
        schema_type: SchemaType,
        schema: &str,
        references: &[SchemaReference],
    ) -> ClientResult<Schema> {
        let response: SchemaResponse = self
            .post_schema(&["subjects", subject], schema_type, schema, references)
            .await?;
        response.into_schema(None, subject)
    }

    async fn check_compatibility(
        &self,
        subject: &str,
        version: VersionSelector,
        schema_type: SchemaType,
        schema: &str,
        references: &[SchemaReference],
    ) -> ClientResult<bool> {
        let response: CompatibilityCheckResponse = self
            .post_schema(
                &["compatibility", "subjects", subject, "versions", &version.to_string()],
                schema_type,
                schema,
                references,
            )
            .await?;
        Ok(response.is_compatible)
    }

    async fn delete_subject(&self, subject: &str, permanent: bool) -> ClientResult<Vec<u32>> {
        let versions: Vec<u32> = self.delete(&["subjects", subject], permanent).await?;
        info!(subject = %subject, versions = ?versions, "Deleted subject from remote registry");
        Ok(versions)
    }

    async fn delete_version(
        &self,
        subject: &str,
        version: VersionSelector,
        permanent: bool,
    ) -> ClientResult<u32> {
        self.delete(
            &["subjects", subject, "versions", &version.to_string()],
            permanent,
        )
        .await
    }

    async fn get_global_compatibility(&self) -> ClientResult<CompatibilityLevel> {
        let config: ConfigResponse = self.get(&["config"]).await?;
        Ok(config.compatibility_level)
    }

    async fn get_subject_compatibility(&self, subject: &str) -> ClientResult<CompatibilityLevel> {
        let config: ConfigResponse = self.get(&["config", subject]).await?;
        Ok(config.compatibility_level)
    }

    async fn get_global_mode(&self) -> ClientResult<Mode> {
        let mode: ModeResponse = self.get(&["mode"]).await?;
        Ok(mode.mode)
    }

    async fn get_subject_mode(&self, subject: &str) -> ClientResult<Mode> {
        let mode: ModeResponse = self.get(&["mode", subject]).await?;
        Ok(mode.mode)
    }

    fn set_credentials(&self, username: &str, password: &str) {
        *self.credentials.write() = Some((username.to_string(), password.to_string()));
    }
}
