use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use iotportal_api::models::PortalSettings;

use crate::configs::Settings;

#[derive(Clone)]
pub struct SettingState {
    pub portal_settings: PortalSettings,
}

impl SettingState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            portal_settings: PortalSettings {
                portal_name: settings.portal.name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                cloud_provider: settings.cloud_provider().to_string(),
                is_lora_supported: settings.is_lorawan_enabled(),
            },
        }
    }
}

/// Read by the front end before sign in, so it is not guarded.
pub fn setting_router(setting_state: SettingState) -> Router {
    Router::new()
        .route("/api/settings/portal", get(get_portal_settings))
        .with_state(setting_state)
}

#[utoipa::path(
    get,
    path = "/api/settings/portal",
    tag = "settings",
    responses(
        (status = 200, description = "Portal settings", body = PortalSettings)
    )
)]
pub async fn get_portal_settings(State(state): State<SettingState>) -> Json<PortalSettings> {
    Json(state.portal_settings)
}
