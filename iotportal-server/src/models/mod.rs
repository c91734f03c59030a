mod device_model;
mod device_model_command;
mod device_model_property;
mod device_tag;
mod edge_device_model;
mod twin;

pub use device_model::{DeviceModelEntity, DeviceModelTable};
pub use device_model_command::{DeviceModelCommandEntity, DeviceModelCommandTable};
pub use device_model_property::{DeviceModelPropertyEntity, DeviceModelPropertyTable};
pub use device_tag::{DeviceTagEntity, DeviceTagTable};
pub use edge_device_model::{
    EdgeDeviceModelEntity, EdgeDeviceModelModuleEntity, EdgeDeviceModelModuleTable,
    EdgeDeviceModelTable,
};
pub use twin::{ConfigurationRow, ConfigurationTable, ModuleTwinTable, TwinRow, TwinTable};

/// Partition of entities that are not scoped to a parent row.
pub const DEFAULT_PARTITION_KEY: &str = "0";

pub trait Table {
    /// The name of the table
    fn name(&self) -> &'static str;

    /// The SQL statement to create the table
    fn create(&self) -> String;

    /// The SQL statement to dispose the table
    fn dispose(&self) -> String;

    /// The dependencies of the table
    fn dependencies(&self) -> Vec<&'static str>;
}
