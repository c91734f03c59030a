use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use iotportal_api::models::{DeviceDetails, LoRaDeviceDetails};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::{CloudProvider, RunMode, SchemaManager, Settings, Storage};
use crate::docs::docs_router;
use crate::handles::*;
use crate::middlewares::TokenState;
use crate::registry::{AwsIotClient, IotHubRegistry, LocalRegistry, TwinRegistry};
use crate::repositories::*;
use crate::services::*;

pub async fn create_app(settings: &Arc<Settings>) -> anyhow::Result<Router> {
    let storage = Arc::new(
        Storage::new(settings.database.clone(), SchemaManager::default())
            .await
            .context("failed to open the portal database")?,
    );

    let device_model_repository = Arc::new(DeviceModelRepository::new(storage.clone()));
    let property_repository = Arc::new(DeviceModelPropertyRepository::new(storage.clone()));
    let command_repository = Arc::new(DeviceModelCommandRepository::new(storage.clone()));
    let device_tag_repository = Arc::new(DeviceTagRepository::new(storage.clone()));
    let edge_model_repository = Arc::new(EdgeDeviceModelRepository::new(storage.clone()));

    let token_service = Arc::new(TokenService::new(settings.auth.clone()));
    let token_state = TokenState {
        token_service: token_service.clone(),
    };

    // AWS things have no twins; edge and LoRaWAN features need one.
    let registry: Option<Arc<dyn TwinRegistry>> = match settings.cloud_provider() {
        CloudProvider::Local => Some(Arc::new(LocalRegistry::new(storage.clone()))),
        CloudProvider::Azure => {
            let azure = settings
                .azure
                .as_ref()
                .context("missing [azure] settings")?;
            Some(Arc::new(IotHubRegistry::new(azure)?))
        }
        CloudProvider::Aws => None,
    };

    let (device_service, property_store): (
        Arc<dyn DeviceService<DeviceDetails>>,
        Arc<dyn DevicePropertyStore>,
    ) = match &registry {
        Some(registry) => (
            Arc::new(TwinDeviceService::standard(
                registry.clone(),
                device_model_repository.clone(),
                device_tag_repository.clone(),
            )),
            Arc::new(TwinPropertyStore::new(registry.clone())),
        ),
        None => {
            let aws = settings.aws.as_ref().context("missing [aws] settings")?;
            let client = Arc::new(AwsIotClient::new(aws));
            (
                Arc::new(AwsDeviceService::new(
                    client.clone(),
                    device_model_repository.clone(),
                    device_tag_repository.clone(),
                )),
                Arc::new(ShadowPropertyStore::new(client)),
            )
        }
    };

    let device_property_service = Arc::new(DevicePropertyService::new(
        property_store,
        property_repository.clone(),
    ));
    let device_model_service = Arc::new(DeviceModelService::new(
        device_model_repository.clone(),
        property_repository.clone(),
        command_repository.clone(),
        device_service.clone(),
    ));
    let device_tag_service = Arc::new(DeviceTagService::new(device_tag_repository.clone()));

    let mut router = Router::new()
        .merge(docs_router())
        .merge(setting_router(SettingState::new(settings)))
        .merge(device_router(
            DeviceState {
                device_service: device_service.clone(),
                device_property_service,
            },
            token_state.clone(),
        ))
        .merge(device_model_router(
            DeviceModelState {
                device_model_service: device_model_service.clone(),
            },
            token_state.clone(),
        ))
        .merge(tag_router(
            TagState { device_tag_service },
            token_state.clone(),
        ));

    let mut lora_device_service: Option<Arc<dyn DeviceService<LoRaDeviceDetails>>> = None;
    let mut concentrator_service = None;
    let mut edge_device_service = None;

    if let Some(registry) = &registry {
        if settings.is_lorawan_enabled() {
            let lorawan = settings.lorawan.clone().unwrap_or_default();

            let lora_devices: Arc<dyn DeviceService<LoRaDeviceDetails>> =
                Arc::new(TwinDeviceService::lorawan(
                    registry.clone(),
                    device_model_repository.clone(),
                    device_tag_repository.clone(),
                ));
            let command_service = Arc::new(LoRaWanCommandService::new(
                lorawan.function_url.clone(),
                lorawan.function_key.clone(),
                registry.clone(),
                command_repository.clone(),
            ));
            let concentrators = Arc::new(ConcentratorService::new(
                registry.clone(),
                Arc::new(RouterConfigClient::new(lorawan.router_config_url.clone())),
            ));

            router = router
                .merge(lorawan_device_router(
                    LoRaDeviceState {
                        device_service: lora_devices.clone(),
                        command_service,
                    },
                    token_state.clone(),
                ))
                .merge(lorawan_model_router(
                    DeviceModelState {
                        device_model_service: device_model_service.clone(),
                    },
                    token_state.clone(),
                ))
                .merge(concentrator_router(
                    ConcentratorState {
                        concentrator_service: concentrators.clone(),
                    },
                    token_state.clone(),
                ));

            lora_device_service = Some(lora_devices);
            concentrator_service = Some(concentrators);
        }

        let edge_devices = Arc::new(EdgeDeviceService::new(
            registry.clone(),
            edge_model_repository.clone(),
            device_tag_repository.clone(),
        ));
        let edge_models = Arc::new(EdgeModelService::new(
            registry.clone(),
            edge_model_repository.clone(),
        ));

        router = router
            .merge(edge_device_router(
                EdgeDeviceState {
                    edge_device_service: edge_devices.clone(),
                },
                token_state.clone(),
            ))
            .merge(edge_model_router(
                EdgeModelState {
                    edge_model_service: edge_models,
                },
                token_state.clone(),
            ));

        edge_device_service = Some(edge_devices);
    }

    let export_service = Arc::new(ExportService::new(
        device_service.clone(),
        lora_device_service,
        device_tag_repository.clone(),
    ));
    let metrics_service = Arc::new(MetricsService::new(
        device_service,
        edge_device_service,
        concentrator_service,
    ));
    metrics_service
        .clone()
        .spawn_refresh(settings.metrics_refresh_interval());

    router = router
        .merge(admin_router(
            AdminState { export_service },
            token_state.clone(),
        ))
        .merge(dashboard_router(
            DashboardState { metrics_service },
            token_state,
        ));

    if settings.run_mode == RunMode::Development {
        let token = token_service.generate_token("admin", "Administrator", ADMIN_ROLE)?;
        tracing::info!("development token: {}", token.token);
    }

    tracing::info!(
        provider = %settings.cloud_provider(),
        lorawan = settings.is_lorawan_enabled(),
        "portal routes ready"
    );

    Ok(router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()))
}
