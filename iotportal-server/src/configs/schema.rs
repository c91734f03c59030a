use std::collections::HashSet;

use crate::models::{
    ConfigurationTable, DeviceModelCommandTable, DeviceModelPropertyTable, DeviceModelTable,
    DeviceTagTable, EdgeDeviceModelModuleTable, EdgeDeviceModelTable, ModuleTwinTable, Table,
    TwinTable,
};

/// Orders the portal tables so every table is created after the tables it references.
pub struct SchemaManager {
    tables: Vec<Box<dyn Table>>,
}

impl SchemaManager {
    pub fn new(tables: Vec<Box<dyn Table>>) -> Self {
        Self {
            tables: Self::order_by_dependencies(tables),
        }
    }

    /// Keeps declaration order among tables whose references are already placed.
    fn order_by_dependencies(mut pending: Vec<Box<dyn Table>>) -> Vec<Box<dyn Table>> {
        let mut placed: HashSet<&'static str> = HashSet::new();
        let mut ordered = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let (ready, blocked): (Vec<_>, Vec<_>) = pending.into_iter().partition(|table| {
                table
                    .dependencies()
                    .iter()
                    .all(|dependency| placed.contains(dependency))
            });

            assert!(
                !ready.is_empty(),
                "tables {:?} reference missing or circular dependencies",
                blocked.iter().map(|table| table.name()).collect::<Vec<_>>()
            );

            placed.extend(ready.iter().map(|table| table.name()));
            ordered.extend(ready);
            pending = blocked;
        }

        ordered
    }

    pub fn create_schema(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.create()).collect()
    }

    pub fn dispose_schema(&self) -> Vec<String> {
        self.tables.iter().rev().map(|table| table.dispose()).collect()
    }
}

impl Default for SchemaManager {
    fn default() -> Self {
        SchemaManager::new(vec![
            Box::new(DeviceModelTable),
            Box::new(DeviceModelPropertyTable),
            Box::new(DeviceModelCommandTable),
            Box::new(DeviceTagTable),
            Box::new(EdgeDeviceModelTable),
            Box::new(EdgeDeviceModelModuleTable),
            // Local registry
            Box::new(TwinTable),
            Box::new(ModuleTwinTable),
            Box::new(ConfigurationTable),
        ])
    }
}
