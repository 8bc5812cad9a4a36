use api_state::ApiState;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};
use routes::{
    documents::{get_document, list_documents, upload_document},
    liveness::live,
    query::query_document,
    readiness::ready,
};

pub mod api_state;
pub mod error;
mod routes;

/// Router for API functionality, version 1
pub fn api_routes_v1<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Probe endpoints (for k8s/systemd probes)
    let probes = Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live));

    let documents = Router::new()
        .route(
            "/documents",
            post(upload_document)
                .get(list_documents)
                .layer(DefaultBodyLimit::max(app_state.config.upload_max_bytes)),
        )
        .route("/documents/{name}", get(get_document))
        .route("/query", post(query_document));

    probes.merge(documents)
}
