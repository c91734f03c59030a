use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router, middleware};
use iotportal_api::models::PortalMetric;

use crate::middlewares::{TokenState, auth};
use crate::services::MetricsService;

#[derive(Clone)]
pub struct DashboardState {
    pub metrics_service: Arc<MetricsService>,
}

pub fn dashboard_router(dashboard_state: DashboardState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/dashboard/metrics", get(get_metrics))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(dashboard_state)
}

/// Last computed counters; never touches the registry.
#[utoipa::path(
    get,
    path = "/api/dashboard/metrics",
    tag = "dashboard",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Portal metrics", body = PortalMetric),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_metrics(State(state): State<DashboardState>) -> Json<PortalMetric> {
    Json(state.metrics_service.get_metric().await)
}
