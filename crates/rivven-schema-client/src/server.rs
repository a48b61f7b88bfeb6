//! HTTP emulator for the reference catalog
//!
//! Serves a [`SchemaCatalog`] over the subset of the Confluent REST API the
//! client needs. Every response is `application/vnd.schemaregistry.v1+json`;
//! request bodies with any other declared media type than the registry,
//! octet-stream or plain JSON ones are rejected with 415.
//!
//! Compatibility checks, per-subject config and modes answer 501.

use crate::catalog::SchemaCatalog;
use crate::config::EmulatorConfig;
use crate::error::{error_codes, ClientError};
use crate::types::{
    CompatibilityLevel, Schema, SchemaId, SchemaReference, SchemaType, SubjectVersionRef,
    VersionSelector,
};
use axum::{
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Content type of every emulator response
pub const RESPONSE_CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

static ACCEPTED_CONTENT_TYPES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^application/(vnd\.schemaregistry\.v1\+json|vnd\.schemaregistry\+json|octet\-stream|json)\s*(;.*)?$",
    )
    .unwrap()
});

/// Shared server state
pub struct ServerState {
    pub catalog: Arc<SchemaCatalog>,
    pub compatibility: CompatibilityLevel,
}

/// Reference catalog HTTP server
pub struct EmulatorServer {
    state: Arc<ServerState>,
    config: EmulatorConfig,
}

impl EmulatorServer {
    pub fn new(catalog: Arc<SchemaCatalog>, config: EmulatorConfig) -> Self {
        Self {
            state: Arc::new(ServerState {
                catalog,
                compatibility: config.compatibility,
            }),
            config,
        }
    }

    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.state.catalog
    }

    /// Build the Axum router
    pub fn router(&self) -> Router {
        Router::new()
            // Discovery
            .route("/subjects", get(list_subjects))
            .route("/schemas/types", get(list_schema_types))
            // Schemas
            .route("/schemas/ids/:id", get(get_schema_by_id))
            .route("/schemas/ids/:id/versions", get(get_versions_by_id))
            // Subjects
            .route(
                "/subjects/:subject",
                post(lookup_schema).delete(delete_subject),
            )
            .route(
                "/subjects/:subject/versions",
                get(list_versions).post(register_schema),
            )
            .route(
                "/subjects/:subject/versions/:version",
                get(get_subject_version).delete(delete_version),
            )
            .route(
                "/subjects/:subject/versions/:version/schema",
                get(get_raw_schema),
            )
            // Compatibility
            .route(
                "/compatibility/subjects/:subject/versions/:version",
                post(unimplemented_compatibility),
            )
            // Config
            .route("/config", get(get_global_config))
            .route("/config/:subject", get(unimplemented_config))
            // Mode
            .route("/mode", get(unimplemented_mode))
            .route("/mode/:subject", get(unimplemented_mode))
            .with_state(self.state.clone())
            .layer(middleware::from_fn(check_content_type))
            .layer(SetResponseHeaderLayer::overriding(
                CONTENT_TYPE,
                HeaderValue::from_static(RESPONSE_CONTENT_TYPE),
            ))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address and serve until the task is dropped
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind_address()).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        let router = self.router();
        info!("Schema catalog emulator listening on {}", addr);
        axum::serve(listener, router).await
    }
}

// ============================================================================
// Errors and content negotiation
// ============================================================================

#[derive(Serialize)]
struct ErrorResponse {
    error_code: u32,
    message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

fn api_error(status: StatusCode, error_code: u32, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error_code,
            message: message.into(),
        }),
    )
}

fn client_error_response(e: ClientError) -> ApiError {
    let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    api_error(status, e.error_code(), e.to_string())
}

async fn check_content_type(request: Request, next: Next) -> Response {
    if let Some(value) = request.headers().get(CONTENT_TYPE) {
        let accepted = value
            .to_str()
            .map(|ct| ACCEPTED_CONTENT_TYPES.is_match(ct))
            .unwrap_or(false);
        if !accepted {
            return api_error(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                error_codes::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported content type",
            )
            .into_response();
        }
    }
    next.run(request).await
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct SchemaRequest {
    schema: String,
    #[serde(rename = "schemaType", default)]
    schema_type: Option<String>,
    #[serde(default)]
    references: Vec<SchemaReference>,
}

impl SchemaRequest {
    /// Parse a request body regardless of the declared JSON flavour
    fn parse(body: &Bytes) -> ApiResult<(Self, SchemaType)> {
        let request: SchemaRequest = serde_json::from_slice(body).map_err(|e| {
            api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                error_codes::INVALID_SCHEMA,
                format!("Invalid schema request: {}", e),
            )
        })?;
        let schema_type = match request.schema_type.as_deref() {
            Some(t) if !t.is_empty() => t.parse::<SchemaType>().map_err(client_error_response)?,
            _ => SchemaType::Avro,
        };
        Ok((request, schema_type))
    }
}

#[derive(Serialize)]
struct SchemaResponse {
    subject: String,
    id: u32,
    version: u32,
    schema: String,
    #[serde(rename = "schemaType", skip_serializing_if = "is_avro")]
    schema_type: SchemaType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    references: Vec<SchemaReference>,
}

fn is_avro(schema_type: &SchemaType) -> bool {
    *schema_type == SchemaType::Avro
}

impl From<Schema> for SchemaResponse {
    fn from(schema: Schema) -> Self {
        Self {
            subject: schema.subject().as_str().to_string(),
            id: schema.id().as_u32(),
            version: schema.version(),
            schema: schema.schema().to_string(),
            schema_type: schema.schema_type(),
            references: schema.references().to_vec(),
        }
    }
}

#[derive(Serialize)]
struct ConfigResponse {
    #[serde(rename = "compatibilityLevel")]
    compatibility_level: CompatibilityLevel,
}

#[derive(Deserialize)]
struct DeleteParams {
    /// Accepted for API compatibility; every delete removes the entry
    #[serde(default)]
    #[allow(dead_code)]
    permanent: bool,
}

fn parse_id(id: &str) -> ApiResult<SchemaId> {
    id.parse::<u32>()
        .map(SchemaId::new)
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, 400, "ID needs to be an integer"))
}

fn parse_version(version: &str) -> ApiResult<VersionSelector> {
    version.parse().map_err(client_error_response)
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_subjects(State(state): State<Arc<ServerState>>) -> Json<Vec<String>> {
    Json(state.catalog.list_subjects())
}

async fn list_schema_types(State(state): State<Arc<ServerState>>) -> Json<Vec<SchemaType>> {
    Json(state.catalog.schema_types())
}

async fn get_schema_by_id(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SchemaResponse>> {
    state
        .catalog
        .get_by_id(parse_id(&id)?)
        .map(|schema| Json(schema.into()))
        .map_err(client_error_response)
}

async fn get_versions_by_id(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<SubjectVersionRef>>> {
    state
        .catalog
        .versions_by_id(parse_id(&id)?)
        .map(Json)
        .map_err(client_error_response)
}

async fn lookup_schema(
    State(state): State<Arc<ServerState>>,
    Path(subject): Path<String>,
    body: Bytes,
) -> ApiResult<Json<SchemaResponse>> {
    let (request, schema_type) = SchemaRequest::parse(&body)?;
    state
        .catalog
        .find_equivalent(&subject, schema_type, &request.schema)
        .map(|schema| Json(schema.into()))
        .map_err(|e| match e {
            // Any miss is reported as "schema not found"
            e if e.is_not_found() => api_error(
                StatusCode::NOT_FOUND,
                error_codes::SCHEMA_NOT_FOUND,
                "Schema not found",
            ),
            e => client_error_response(e),
        })
}

async fn delete_subject(
    State(state): State<Arc<ServerState>>,
    Path(subject): Path<String>,
    Query(_params): Query<DeleteParams>,
) -> Json<Vec<u32>> {
    Json(state.catalog.delete_subject(&subject))
}

async fn list_versions(
    State(state): State<Arc<ServerState>>,
    Path(subject): Path<String>,
) -> Json<Vec<u32>> {
    Json(state.catalog.list_versions(&subject))
}

async fn register_schema(
    State(state): State<Arc<ServerState>>,
    Path(subject): Path<String>,
    body: Bytes,
) -> ApiResult<Json<SchemaResponse>> {
    let (request, schema_type) = SchemaRequest::parse(&body)?;
    state
        .catalog
        .register(&subject, schema_type, &request.schema, request.references)
        .map(|schema| Json(schema.into()))
        .map_err(client_error_response)
}

async fn get_subject_version(
    State(state): State<Arc<ServerState>>,
    Path((subject, version)): Path<(String, String)>,
) -> ApiResult<Json<SchemaResponse>> {
    state
        .catalog
        .get_by_version(&subject, parse_version(&version)?)
        .map(|schema| Json(schema.into()))
        .map_err(client_error_response)
}

async fn get_raw_schema(
    State(state): State<Arc<ServerState>>,
    Path((subject, version)): Path<(String, String)>,
) -> ApiResult<String> {
    state
        .catalog
        .get_by_version(&subject, parse_version(&version)?)
        .map(|schema| schema.schema().to_string())
        .map_err(client_error_response)
}

async fn delete_version(
    State(state): State<Arc<ServerState>>,
    Path((subject, version)): Path<(String, String)>,
    Query(_params): Query<DeleteParams>,
) -> ApiResult<Json<u32>> {
    state
        .catalog
        .delete_version(&subject, parse_version(&version)?)
        .map(Json)
        .map_err(client_error_response)
}

async fn get_global_config(State(state): State<Arc<ServerState>>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        compatibility_level: state.compatibility,
    })
}

async fn unimplemented_compatibility() -> ApiError {
    client_error_response(ClientError::Unimplemented(
        "Compatibility checks are not supported by the emulator".to_string(),
    ))
}

async fn unimplemented_config() -> ApiError {
    client_error_response(ClientError::Unimplemented(
        "Per-subject config is not supported by the emulator".to_string(),
    ))
}

async fn unimplemented_mode() -> ApiError {
    client_error_response(ClientError::Unimplemented(
        "Modes are not supported by the emulator".to_string(),
    ))
}
