use iotportal_api::models::{DeviceModel, LoRaDeviceModel};

use crate::models::{DEFAULT_PARTITION_KEY, DeviceModelEntity};

#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceModelMapper;

impl DeviceModelMapper {
    pub fn create_device_model(&self, entity: &DeviceModelEntity) -> DeviceModel {
        DeviceModel {
            model_id: entity.row_key.clone(),
            name: entity.name.clone(),
            description: entity.description.clone(),
            image_url: entity.image_url.clone(),
            is_builtin: entity.is_builtin,
            support_lora_features: entity.support_lorawan_features,
        }
    }

    /// Copies the editable fields; `is_builtin` stays under the service's control.
    pub fn update_table_entity(&self, entity: &mut DeviceModelEntity, model: &DeviceModel) {
        entity.partition_key = DEFAULT_PARTITION_KEY.to_string();
        entity.row_key = model.model_id.clone();
        entity.name = model.name.clone();
        entity.description = model.description.clone();
        entity.image_url = model.image_url.clone();
        entity.support_lorawan_features = model.support_lora_features;
    }

    pub fn create_lora_device_model(&self, entity: &DeviceModelEntity) -> LoRaDeviceModel {
        let mut model = LoRaDeviceModel::new(self.create_device_model(entity));
        model.model.support_lora_features = true;

        model.use_otaa = entity.use_otaa.unwrap_or(true);
        model.class_type = entity
            .class_type
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        model.deduplication = entity
            .deduplication
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        model.preferred_window = entity.preferred_window.unwrap_or(1);
        model.downlink = entity.downlink.unwrap_or(true);
        model.abp_relax_mode = entity.abp_relax_mode;
        model.rx1_dr_offset = entity.rx1_dr_offset;
        model.rx2_data_rate = entity.rx2_data_rate;
        model.rx_delay = entity.rx_delay;
        model.f_cnt_up_start = entity.f_cnt_up_start;
        model.f_cnt_down_start = entity.f_cnt_down_start;
        model.f_cnt_reset_counter = entity.f_cnt_reset_counter;
        model.supports_32bit_fcnt = entity.supports_32bit_fcnt;
        model.keep_alive_timeout = entity.keep_alive_timeout;
        model.sensor_decoder = entity.sensor_decoder.clone();
        model.app_eui = entity.app_eui.clone();

        model
    }

    pub fn update_lora_table_entity(&self, entity: &mut DeviceModelEntity, model: &LoRaDeviceModel) {
        self.update_table_entity(entity, &model.model);
        entity.support_lorawan_features = true;

        entity.use_otaa = Some(model.use_otaa);
        entity.class_type = Some(model.class_type.to_string());
        entity.deduplication = Some(model.deduplication.to_string());
        entity.preferred_window = Some(model.preferred_window);
        entity.downlink = Some(model.downlink);
        entity.abp_relax_mode = model.abp_relax_mode;
        entity.rx1_dr_offset = model.rx1_dr_offset;
        entity.rx2_data_rate = model.rx2_data_rate;
        entity.rx_delay = model.rx_delay;
        entity.f_cnt_up_start = model.f_cnt_up_start;
        entity.f_cnt_down_start = model.f_cnt_down_start;
        entity.f_cnt_reset_counter = model.f_cnt_reset_counter;
        entity.supports_32bit_fcnt = model.supports_32bit_fcnt;
        entity.keep_alive_timeout = model.keep_alive_timeout;
        entity.sensor_decoder = model.sensor_decoder.clone();
        entity.app_eui = model.app_eui.clone();
    }
}

#[cfg(test)]
mod tests {
    use iotportal_api::models::{ClassType, DeduplicationMode};

    use super::*;

    #[test]
    fn test_absent_lora_columns_take_defaults() {
        let entity = DeviceModelEntity {
            partition_key: DEFAULT_PARTITION_KEY.into(),
            row_key: "m1".into(),
            name: "Gauge".into(),
            support_lorawan_features: true,
            ..Default::default()
        };

        let model = DeviceModelMapper.create_lora_device_model(&entity);

        assert_eq!(model.model.model_id, "m1");
        assert!(model.use_otaa);
        assert!(model.downlink);
        assert_eq!(model.preferred_window, 1);
        assert_eq!(model.class_type, ClassType::A);
        assert_eq!(model.deduplication, DeduplicationMode::None);
    }

    #[test]
    fn test_lora_model_round_trip() {
        let mut model = LoRaDeviceModel::new(DeviceModel {
            model_id: "m2".into(),
            name: "Tracker".into(),
            description: Some("GPS".into()),
            ..Default::default()
        });
        model.class_type = ClassType::C;
        model.deduplication = DeduplicationMode::Mark;
        model.use_otaa = false;
        model.rx_delay = Some(2);

        let mut entity = DeviceModelEntity::default();
        DeviceModelMapper.update_lora_table_entity(&mut entity, &model);

        assert_eq!(entity.row_key, "m2");
        assert_eq!(entity.class_type.as_deref(), Some("C"));
        assert!(entity.support_lorawan_features);

        let read = DeviceModelMapper.create_lora_device_model(&entity);
        assert_eq!(read.class_type, ClassType::C);
        assert_eq!(read.deduplication, DeduplicationMode::Mark);
        assert!(!read.use_otaa);
        assert_eq!(read.rx_delay, Some(2));
        assert_eq!(read.model.description.as_deref(), Some("GPS"));
        assert!(read.model.support_lora_features);
    }

    #[test]
    fn test_update_keeps_builtin_flag() {
        let mut entity = DeviceModelEntity {
            is_builtin: true,
            ..Default::default()
        };
        let model = DeviceModel {
            model_id: "m3".into(),
            name: "Renamed".into(),
            is_builtin: false,
            ..Default::default()
        };

        DeviceModelMapper.update_table_entity(&mut entity, &model);

        assert!(entity.is_builtin);
        assert_eq!(entity.name, "Renamed");
    }
}
