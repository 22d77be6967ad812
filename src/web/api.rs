use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

use crate::config::FetchConfig;
use crate::decode::registry::{RegistryError, SubjectSchema};
use crate::decode::{shape_messages, MessagesResponse, SchemaRegistryClient};
use crate::fetch::{CrossTopicQuery, FetchError, MessageBrowser, PartitionQuery, WindowStart};
use crate::kafka::{ClusterInfo, GroupInfo, KafkaAdmin, KafkaError, PartitionOffsets, TopicConfig, TopicInfo};

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub admin: Arc<dyn KafkaAdmin>,
    pub browser: Arc<MessageBrowser>,
    pub registry: Option<Arc<SchemaRegistryClient>>,
    pub fetch: FetchConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessagesQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub search: Option<String>,
    /// Session timeout in milliseconds.
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CrossTopicsQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub search_from: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TopicDetails {
    pub offsets: Vec<PartitionOffsets>,
    pub config: TopicConfig,
}

#[derive(Debug, Serialize)]
pub struct ConsumerGroups {
    pub groups: Vec<GroupInfo>,
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/topics
pub async fn list_topics(State(state): State<AppState>) -> Result<Json<Vec<TopicInfo>>, ApiError> {
    Ok(Json(state.admin.fetch_topic_metadata(None).await?))
}

/// GET /api/topic/:topic
pub async fn get_topic(
    State(state): State<AppState>,
    Path(topic): Path<String>,
) -> Result<Json<TopicDetails>, ApiError> {
    let offsets = state.admin.fetch_topic_offsets(&topic).await?;
    let config = state.admin.describe_topic_config(&topic).await?;
    Ok(Json(TopicDetails { offsets, config }))
}

/// GET /api/topic/:topic/config
pub async fn get_topic_config(
    State(state): State<AppState>,
    Path(topic): Path<String>,
) -> Result<Json<TopicConfig>, ApiError> {
    Ok(Json(state.admin.describe_topic_config(&topic).await?))
}

/// GET /api/consumer_groups
pub async fn list_consumer_groups(State(state): State<AppState>) -> Result<Json<ConsumerGroups>, ApiError> {
    let groups = state.admin.list_consumer_groups().await?;
    Ok(Json(ConsumerGroups { groups }))
}

/// GET /api/cluster
pub async fn get_cluster(State(state): State<AppState>) -> Result<Json<ClusterInfo>, ApiError> {
    Ok(Json(state.admin.describe_cluster().await?))
}

/// GET /api/messages/:topic/:partition?limit=N&offset=N&search=S&timeout=MS
pub async fn get_partition_messages(
    State(state): State<AppState>,
    path: Result<Path<(String, i32)>, PathRejection>,
    query: Result<Query<MessagesQuery>, QueryRejection>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let Path((topic, partition)) = path.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let request = PartitionQuery {
        topic,
        partition,
        offset: query.offset.unwrap_or(0),
        limit: query.limit.unwrap_or(state.fetch.default_limit),
        search: query.search,
        timeout: query
            .timeout
            .map(Duration::from_millis)
            .unwrap_or(state.fetch.timeout),
    };

    let result = state.browser.partition_messages(&request).await?;
    Ok(Json(shape_messages(result)))
}

/// GET /api/messages-cross-topics/:topics?limit=N&search=S&search_from=Beginning
///
/// `topics` is a comma-separated list. Any `search_from` other than
/// `Beginning` reads the tail of each partition.
pub async fn get_cross_topic_messages(
    State(state): State<AppState>,
    Path(topics): Path<String>,
    query: Result<Query<CrossTopicsQuery>, QueryRejection>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let topics: Vec<String> = topics
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if topics.is_empty() {
        return Err(ApiError::BadRequest("at least one topic is required".to_string()));
    }

    let mut request = CrossTopicQuery::new(
        topics,
        query.limit.unwrap_or(state.fetch.default_limit),
        WindowStart::from_search_from(query.search_from.as_deref()),
    );
    request.search = query.search.filter(|s| !s.is_empty());
    request.timeout = state.fetch.timeout;

    let result = state.browser.cross_topic_messages(&request).await?;
    Ok(Json(shape_messages(result)))
}

/// GET /api/schema-registry/subjects
pub async fn list_subjects(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let registry = require_registry(&state)?;
    Ok(Json(registry.get_subjects().await?))
}

/// GET /api/schema-registry/versions/:subject
pub async fn list_subject_versions(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Result<Json<Vec<i32>>, ApiError> {
    let registry = require_registry(&state)?;
    Ok(Json(registry.get_subject_versions(&subject).await?))
}

/// GET /api/schema-registry/schema/:subject/:version
pub async fn get_subject_schema(
    State(state): State<AppState>,
    path: Result<Path<(String, i32)>, PathRejection>,
) -> Result<Json<SubjectSchema>, ApiError> {
    let Path((subject, version)) = path.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let registry = require_registry(&state)?;
    Ok(Json(registry.get_subject_version_schema(&subject, version).await?))
}

fn require_registry(state: &AppState) -> Result<&SchemaRegistryClient, ApiError> {
    state
        .registry
        .as_deref()
        .ok_or_else(|| ApiError::NotFound("schema registry is not configured".to_string()))
}

// Error handling
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    InternalError(String),
}

impl From<KafkaError> for ApiError {
    fn from(e: KafkaError) -> Self {
        match e {
            KafkaError::UnknownTopic(_) => ApiError::NotFound(e.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::UnknownPartition { .. } => ApiError::NotFound(e.to_string()),
            FetchError::Offsets {
                source: KafkaError::UnknownTopic(_),
                ..
            } => ApiError::NotFound(e.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Status { status: 404, .. } => ApiError::NotFound(e.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalError(msg) => {
                error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
