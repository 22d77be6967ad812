use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::WebConfig;

use super::api::{
    get_cluster, get_cross_topic_messages, get_partition_messages, get_subject_schema, get_topic,
    get_topic_config, health_check, list_consumer_groups, list_subject_versions, list_subjects,
    list_topics, AppState,
};

/// Serve index.html for every non-API route (enables client-side routing)
async fn serve_index_html(State(assets_dir): State<Option<Arc<PathBuf>>>) -> impl IntoResponse {
    let Some(dir) = assets_dir else {
        return (StatusCode::NOT_FOUND, "No UI assets configured").into_response();
    };

    match tokio::fs::read_to_string(dir.join("index.html")).await {
        Ok(content) => Html(content).into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read index.html").into_response(),
    }
}

/// Build the full application router: API routes, `/assets`, and the index fallback.
pub fn build_router(state: AppState, assets_dir: Option<PathBuf>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/topics", get(list_topics))
        .route("/api/topic/:topic", get(get_topic))
        .route("/api/topic/:topic/config", get(get_topic_config))
        .route("/api/consumer_groups", get(list_consumer_groups))
        .route("/api/cluster", get(get_cluster))
        .route("/api/messages/:topic/:partition", get(get_partition_messages))
        .route("/api/messages-cross-topics/:topics", get(get_cross_topic_messages))
        .route("/api/schema-registry/subjects", get(list_subjects))
        .route("/api/schema-registry/versions/:subject", get(list_subject_versions))
        .route("/api/schema-registry/schema/:subject/:version", get(get_subject_schema))
        .with_state(state);

    let mut app = api_routes;
    if let Some(dir) = &assets_dir {
        app = app.nest_service("/assets", ServeDir::new(dir));
    }

    let index = Router::new()
        .fallback(serve_index_html)
        .with_state(assets_dir.map(Arc::new));

    app.merge(index)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Start the web server and run until `shutdown_rx` flips to true
pub async fn run_server(
    state: AppState,
    web_config: WebConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    let app = build_router(state, web_config.assets_dir.clone());

    let listener = tokio::net::TcpListener::bind(&web_config.listen).await?;
    tracing::info!("Web server listening on {}", web_config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.wait_for(|&v| v).await;
            tracing::info!("Web server shutting down gracefully");
        })
        .await
}
