use std::collections::HashMap;
use std::sync::Arc;

use iotportal_api::models::{DeviceDetails, DeviceTag, ImportResultLine, LoRaDeviceDetails};
use serde_json::Value;

use super::device_service::{DeviceQuery, DeviceService, MAX_PAGE_SIZE, load_device_tags};
use crate::errors::{ApiError, ImportError};
use crate::mappers::{LORA_DESIRED_PROPERTIES, LoRaDeviceTwinMapper, TwinMapper};
use crate::registry::Twin;
use crate::repositories::DeviceTagRepository;

const ID_COLUMN: &str = "Id";
const NAME_COLUMN: &str = "Name";
const MODEL_ID_COLUMN: &str = "ModelId";
const TAG_PREFIX: &str = "TAG:";
const PROPERTY_PREFIX: &str = "PROPERTY:";
const SUPPORT_LORA_TAG: &str = "supportLoRaFeatures";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Bulk export and import of devices as CSV.
pub struct ExportService {
    devices: Arc<dyn DeviceService<DeviceDetails>>,
    lora_devices: Option<Arc<dyn DeviceService<LoRaDeviceDetails>>>,
    device_tag_repository: Arc<DeviceTagRepository>,
}

impl ExportService {
    pub fn new(
        devices: Arc<dyn DeviceService<DeviceDetails>>,
        lora_devices: Option<Arc<dyn DeviceService<LoRaDeviceDetails>>>,
        device_tag_repository: Arc<DeviceTagRepository>,
    ) -> Self {
        Self {
            devices,
            lora_devices,
            device_tag_repository,
        }
    }

    fn header(&self, tags: &[DeviceTag]) -> Vec<String> {
        let mut header = vec![
            ID_COLUMN.to_string(),
            NAME_COLUMN.to_string(),
            MODEL_ID_COLUMN.to_string(),
        ];
        header.extend(tags.iter().map(|tag| format!("{TAG_PREFIX}{}", tag.name)));
        header.push(format!("{TAG_PREFIX}{SUPPORT_LORA_TAG}"));

        if self.lora_devices.is_some() {
            header.extend(
                LORA_DESIRED_PROPERTIES
                    .iter()
                    .map(|name| format!("{PROPERTY_PREFIX}{name}")),
            );
        }

        header
    }

    fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ApiError> {
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("failed to flush CSV output: {}", e.error()))?;

        Ok(String::from_utf8(bytes).map_err(anyhow::Error::from)?)
    }

    /// Header row only.
    pub async fn template(&self) -> Result<String, ApiError> {
        let tags = load_device_tags(&self.device_tag_repository).await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(self.header(&tags))
            .map_err(ImportError::from)?;

        Self::finish(writer)
    }

    pub async fn export(&self) -> Result<String, ApiError> {
        let tags = load_device_tags(&self.device_tag_repository).await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(self.header(&tags))
            .map_err(ImportError::from)?;

        let mut query = DeviceQuery {
            page_size: MAX_PAGE_SIZE,
            ..Default::default()
        };
        let mut exported = 0usize;

        loop {
            let page = self.devices.get_devices(&query).await?;

            for item in &page.items {
                let row = match (&self.lora_devices, item.support_lora_features) {
                    (Some(lora_devices), true) => {
                        let details = lora_devices.get_device(&item.device_id).await?;
                        self.lora_row(&details, &tags)
                    }
                    _ => {
                        let details = self.devices.get_device(&item.device_id).await?;
                        self.standard_row(&details, &tags, item.support_lora_features)
                    }
                };

                writer.write_record(&row).map_err(ImportError::from)?;
                exported += 1;
            }

            if page.next_page.is_none() {
                break;
            }
            query.page_number += 1;
        }

        tracing::info!(count = exported, "devices exported");

        Self::finish(writer)
    }

    fn standard_row(&self, device: &DeviceDetails, tags: &[DeviceTag], is_lora: bool) -> Vec<String> {
        let mut row = vec![
            device.device_id.clone(),
            device.device_name.clone(),
            device.model_id.clone(),
        ];
        row.extend(
            tags.iter()
                .map(|tag| device.tags.get(&tag.name).cloned().unwrap_or_default()),
        );
        row.push(is_lora.to_string());

        if self.lora_devices.is_some() {
            row.extend(LORA_DESIRED_PROPERTIES.iter().map(|_| String::new()));
        }

        row
    }

    fn lora_row(&self, device: &LoRaDeviceDetails, tags: &[DeviceTag]) -> Vec<String> {
        let mut twin = Twin::new(&device.device.device_id);
        LoRaDeviceTwinMapper.update_twin(&mut twin, device, tags);

        let mut row = vec![
            device.device.device_id.clone(),
            device.device.device_name.clone(),
            device.device.model_id.clone(),
        ];
        row.extend(
            tags.iter()
                .map(|tag| device.device.tags.get(&tag.name).cloned().unwrap_or_default()),
        );
        row.push(true.to_string());
        row.extend(
            LORA_DESIRED_PROPERTIES
                .iter()
                .map(|name| twin.desired_string(name).unwrap_or_default()),
        );

        row
    }

    /// Creates or updates one device per row; failed rows are reported, not fatal.
    pub async fn import(&self, content: &[u8]) -> Result<Vec<ImportResultLine>, ApiError> {
        let tags = load_device_tags(&self.device_tag_repository).await?;
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content);

        let columns: HashMap<String, usize> = reader
            .headers()
            .map_err(ImportError::from)?
            .iter()
            .enumerate()
            .map(|(index, name)| (name.to_string(), index))
            .collect();

        for required in [ID_COLUMN, NAME_COLUMN, MODEL_ID_COLUMN] {
            if !columns.contains_key(required) {
                return Err(ImportError::MissingHeader(required.to_string()).into());
            }
        }

        let mut results = Vec::new();
        let mut imported = 0usize;

        for (index, record) in reader.records().enumerate() {
            let fallback_line = index as u64 + 2;

            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    let line_number = e
                        .position()
                        .map_or(fallback_line, |position| position.line());
                    results.push(ImportResultLine {
                        line_number,
                        device_id: String::new(),
                        message: e.to_string(),
                        is_error_message: true,
                    });
                    continue;
                }
            };

            let line_number = record
                .position()
                .map_or(fallback_line, |position| position.line());
            let row = ImportRow {
                record: &record,
                columns: &columns,
            };
            let device_id = row.get(ID_COLUMN);

            if device_id.is_empty() {
                results.push(ImportResultLine {
                    line_number,
                    device_id,
                    message: format!("{ID_COLUMN} is required"),
                    is_error_message: true,
                });
                continue;
            }

            match self.import_row(&row, &tags).await {
                Ok(()) => imported += 1,
                Err(e) => {
                    tracing::debug!(line = line_number, device_id = %device_id, "import row rejected: {}", e);
                    results.push(ImportResultLine {
                        line_number,
                        device_id,
                        message: e.to_string(),
                        is_error_message: true,
                    });
                }
            }
        }

        tracing::info!(imported, failed = results.len(), "devices imported");

        Ok(results)
    }

    async fn import_row(&self, row: &ImportRow<'_>, tags: &[DeviceTag]) -> Result<(), ApiError> {
        let is_lora = row
            .get(&format!("{TAG_PREFIX}{SUPPORT_LORA_TAG}"))
            .eq_ignore_ascii_case("true");

        match (&self.lora_devices, is_lora) {
            (Some(lora_devices), true) => {
                let mut twin = Twin::new(row.get(ID_COLUMN));
                row.write_tags(&mut twin, tags);
                for name in LORA_DESIRED_PROPERTIES {
                    let value = row.get(&format!("{PROPERTY_PREFIX}{name}"));
                    if !value.is_empty() {
                        twin.set_desired(name, Some(Value::from(value)));
                    }
                }

                let mut device = LoRaDeviceTwinMapper.create_device_details(&twin, tags);
                let device_id = device.device.device_id.clone();

                if lora_devices.device_exists(&device_id).await? {
                    let existing = lora_devices.get_device(&device_id).await?;
                    device.device.is_enabled = existing.device.is_enabled;
                    lora_devices.update_device(device).await?;
                } else {
                    lora_devices.create_device(device).await?;
                }
            }
            _ => {
                let device = DeviceDetails {
                    device_id: row.get(ID_COLUMN),
                    device_name: row.get(NAME_COLUMN),
                    model_id: row.get(MODEL_ID_COLUMN),
                    is_enabled: true,
                    tags: tags
                        .iter()
                        .map(|tag| (tag.name.clone(), row.get(&format!("{TAG_PREFIX}{}", tag.name))))
                        .collect(),
                    ..Default::default()
                };

                if self.devices.device_exists(&device.device_id).await? {
                    let existing = self.devices.get_device(&device.device_id).await?;
                    self.devices
                        .update_device(DeviceDetails {
                            is_enabled: existing.is_enabled,
                            ..device
                        })
                        .await?;
                } else {
                    self.devices.create_device(device).await?;
                }
            }
        }

        Ok(())
    }
}

struct ImportRow<'a> {
    record: &'a csv::StringRecord,
    columns: &'a HashMap<String, usize>,
}

impl ImportRow<'_> {
    fn get(&self, column: &str) -> String {
        self.columns
            .get(column)
            .and_then(|index| self.record.get(*index))
            .unwrap_or_default()
            .to_string()
    }

    fn write_tags(&self, twin: &mut Twin, tags: &[DeviceTag]) {
        twin.set_tag("deviceName", self.get(NAME_COLUMN));
        twin.set_tag("modelId", self.get(MODEL_ID_COLUMN));

        for tag in tags {
            let value = self.get(&format!("{TAG_PREFIX}{}", tag.name));
            if !value.is_empty() {
                twin.set_tag(&tag.name, value);
            }
        }
    }
}
