use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tracing::info;

use crate::features::FeatureSchema;
use crate::predict::{Prediction, PredictionRequest, PredictionService};

type ApiError = (StatusCode, Json<serde_json::Value>);

pub async fn predict(
    State(service): State<PredictionService>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<Prediction>, ApiError> {
    service.predict(&request).map(Json).map_err(|e| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": e.to_string() })),
        )
    })
}

pub async fn schema(State(service): State<PredictionService>) -> Json<FeatureSchema> {
    Json(service.schema().clone())
}

pub fn router(service: PredictionService) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/schema", get(schema))
        .with_state(service)
}

pub async fn serve(service: PredictionService, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(service);
    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
