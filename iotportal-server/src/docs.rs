use axum::routing::get;
use axum::{Json, Router};
use iotportal_api::models::*;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handles;

#[derive(OpenApi)]
#[openapi(
    info(title = "IoT Portal", description = "Device administration API"),
    paths(
        handles::get_devices,
        handles::create_device,
        handles::get_device,
        handles::update_device,
        handles::delete_device,
        handles::get_device_properties,
        handles::set_device_properties,
        handles::get_lora_devices,
        handles::create_lora_device,
        handles::get_lora_device,
        handles::update_lora_device,
        handles::delete_lora_device,
        handles::execute_command,
        handles::get_concentrators,
        handles::create_concentrator,
        handles::get_concentrator,
        handles::update_concentrator,
        handles::delete_concentrator,
        handles::get_models,
        handles::create_model,
        handles::get_model,
        handles::update_model,
        handles::delete_model,
        handles::get_model_properties,
        handles::set_model_properties,
        handles::get_lora_models,
        handles::create_lora_model,
        handles::get_lora_model,
        handles::update_lora_model,
        handles::delete_lora_model,
        handles::get_model_commands,
        handles::set_model_commands,
        handles::get_device_tags,
        handles::set_device_tags,
        handles::delete_device_tag,
        handles::get_portal_settings,
        handles::get_edge_devices,
        handles::create_edge_device,
        handles::get_edge_device,
        handles::update_edge_device,
        handles::delete_edge_device,
        handles::restart_module,
        handles::get_edge_models,
        handles::create_edge_model,
        handles::get_edge_model,
        handles::update_edge_model,
        handles::delete_edge_model,
        handles::export_devices,
        handles::export_template,
        handles::import_devices,
        handles::get_metrics,
    ),
    components(schemas(
        DeviceListItem,
        DeviceDetails,
        DevicePropertyValue,
        DeviceModel,
        DeviceProperty,
        DevicePropertyType,
        LoRaDeviceDetails,
        LoRaDeviceModel,
        DeviceModelCommand,
        ClassType,
        DeduplicationMode,
        Concentrator,
        DeviceTag,
        PortalSettings,
        PortalMetric,
        EdgeDeviceListItem,
        EdgeDevice,
        EdgeModule,
        EdgeDeployment,
        EdgeModel,
        EdgeModelModule,
        EdgeModelListItem,
        ImportResultLine,
        ProblemDetails,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "device", description = "Standard devices"),
        (name = "lorawan", description = "LoRaWAN devices, models and concentrators"),
        (name = "model", description = "Device models"),
        (name = "edge", description = "Edge devices and models"),
        (name = "settings", description = "Portal settings and device tags"),
        (name = "admin", description = "Device export and import"),
        (name = "dashboard", description = "Portal metrics"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

pub fn docs_router() -> Router {
    Router::new().route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}
