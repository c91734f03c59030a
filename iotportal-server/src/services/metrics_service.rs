use std::sync::Arc;
use std::time::Duration;

use futures::try_join;
use iotportal_api::models::{DeviceDetails, PortalMetric};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::concentrator_service::ConcentratorService;
use super::device_service::{DeviceQuery, DeviceService};
use super::edge_device_service::EdgeDeviceService;
use crate::errors::ApiError;

/// Dashboard counters, computed in the background and served from memory.
pub struct MetricsService {
    metric: RwLock<PortalMetric>,
    devices: Arc<dyn DeviceService<DeviceDetails>>,
    edge_devices: Option<Arc<EdgeDeviceService>>,
    concentrators: Option<Arc<ConcentratorService>>,
}

impl MetricsService {
    pub fn new(
        devices: Arc<dyn DeviceService<DeviceDetails>>,
        edge_devices: Option<Arc<EdgeDeviceService>>,
        concentrators: Option<Arc<ConcentratorService>>,
    ) -> Self {
        Self {
            metric: RwLock::new(PortalMetric::default()),
            devices,
            edge_devices,
            concentrators,
        }
    }

    pub async fn get_metric(&self) -> PortalMetric {
        self.metric.read().await.clone()
    }

    async fn count_devices(&self, is_connected: Option<bool>) -> Result<u64, ApiError> {
        let query = DeviceQuery {
            is_connected,
            page_size: 1,
            ..Default::default()
        };

        Ok(self.devices.get_devices(&query).await?.total_items)
    }

    pub async fn refresh(&self) -> Result<PortalMetric, ApiError> {
        let (device_count, connected_device_count) =
            try_join!(self.count_devices(None), self.count_devices(Some(true)))?;

        let mut metric = PortalMetric {
            device_count,
            connected_device_count,
            ..Default::default()
        };

        if let Some(edge_devices) = &self.edge_devices {
            (metric.edge_device_count, metric.connected_edge_device_count) =
                try_join!(edge_devices.count(None), edge_devices.count(Some(true)))?;
        }

        if let Some(concentrators) = &self.concentrators {
            (metric.concentrator_count, metric.connected_concentrator_count) =
                try_join!(concentrators.count(None), concentrators.count(Some(true)))?;
        }

        metric.last_update = Some(OffsetDateTime::now_utc());
        *self.metric.write().await = metric.clone();

        tracing::debug!(
            devices = metric.device_count,
            edge_devices = metric.edge_device_count,
            concentrators = metric.concentrator_count,
            "portal metrics refreshed"
        );

        Ok(metric)
    }

    /// Refreshes the counters now and then on every tick.
    pub fn spawn_refresh(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;

                if let Err(e) = self.refresh().await {
                    tracing::warn!("failed to refresh portal metrics: {}", e);
                }
            }
        })
    }
}
