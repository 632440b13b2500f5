use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::api::{AlertError, AlertRequest, AlertResponse, ApiError, TrendsQuery};
use trend_radar::collectors::SourceCollector;
use trend_radar::notify::NotificationSink;
use trend_radar::{Aggregator, Trend};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub collectors: Arc<Vec<Box<dyn SourceCollector>>>,
    pub sink: Option<Arc<dyn NotificationSink>>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/trends", get(trends_handler))
        .route("/api/aggregate-trends", get(trends_handler))
        .route("/api/alert", post(alert_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(state: AppState, host: &str, port: u16) -> Result<(), String> {
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;

    info!("Server listening - addr={}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| format!("failed to bind server: {}", err))?,
        app,
    )
    .await
    .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn trends_handler(
    State(state): State<AppState>,
    query: Result<Query<TrendsQuery>, QueryRejection>,
) -> Result<Json<Vec<Trend>>, (StatusCode, Json<ApiError>)> {
    let top_k = query
        .map_err(|rejection| rejection.body_text())
        .and_then(|Query(query)| query.top_k())
        .map_err(|message| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiError::new("Invalid request", message)),
            )
        })?;

    match state.aggregator.aggregate(&state.collectors, top_k).await {
        Ok(trends) => Ok(Json(trends)),
        Err(err) => {
            error!("Aggregation error - error={}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new("Failed to aggregate trends", err.to_string())),
            ))
        }
    }
}

async fn alert_handler(
    State(state): State<AppState>,
    request: Result<Json<AlertRequest>, JsonRejection>,
) -> Result<Json<AlertResponse>, (StatusCode, Json<AlertError>)> {
    let request = request.map_err(|rejection| {
        warn!("Alert request rejected - error={}", rejection.body_text());
        (StatusCode::BAD_REQUEST, Json(AlertError::no_trend()))
    })?;
    let trend = request
        .0
        .trend
        .ok_or_else(|| (StatusCode::BAD_REQUEST, Json(AlertError::no_trend())))?;

    let Some(sink) = state.sink.as_ref() else {
        return Ok(Json(AlertResponse {
            success: false,
            message: Some("Telegram not configured".to_string()),
        }));
    };

    match sink.send(&trend).await {
        Ok(()) => {
            info!("Alert sent - sink={}, trend={}", sink.name(), trend.id);
            Ok(Json(AlertResponse {
                success: true,
                message: None,
            }))
        }
        Err(err) => {
            warn!("Alert failed - sink={}, error={}", sink.name(), err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AlertError {
                    error: err.to_string(),
                }),
            ))
        }
    }
}
