//! Typed inventory of audio applications and output devices
//!
//! Built from scratch on every decode pass and swapped in whole; nothing
//! here is ever patched in place.

use crate::dump::{columns, ColumnSchema, Dump, Record};
use std::collections::HashMap;
use tracing::{debug, warn};

const RENDER: &str = "Render";
const APPLICATION: &str = "Application";
const DEVICE: &str = "Device";
const ACTIVE: &str = "Active";
const MUTED_YES: &str = "Yes";

/// Device an application currently plays through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentDevice {
    /// Single known output device
    Device(String),
    /// The process was seen on more than one stream in the same dump
    Unresolved,
}

impl CurrentDevice {
    pub fn device_id(&self) -> Option<&str> {
        match self {
            CurrentDevice::Device(id) => Some(id),
            CurrentDevice::Unresolved => None,
        }
    }

    /// Whether this is exactly `device_id`; an unresolved device matches nothing
    pub fn is(&self, device_id: &str) -> bool {
        self.device_id() == Some(device_id)
    }
}

/// A running process with a render stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationEntry {
    pub name: String,
    pub process_id: String,
    pub process_path: String,
    pub current_device: CurrentDevice,
    /// `None` when the dump has no `Muted` column
    pub muted: Option<bool>,
}

/// An active render device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub name: String,
    pub device_id: String,
    pub sub_name: String,
}

/// Column indices the inventory needs, resolved once per dump
#[derive(Debug, Clone, Copy)]
struct InventoryColumns {
    name: Option<usize>,
    muted: Option<usize>,
    process_id: Option<usize>,
    process_path: Option<usize>,
    item_id: Option<usize>,
    direction: Option<usize>,
    kind: Option<usize>,
    device_name: Option<usize>,
    device_state: Option<usize>,
}

impl InventoryColumns {
    fn resolve(schema: &ColumnSchema) -> Self {
        let cols = Self {
            name: schema.column_index(columns::NAME),
            muted: schema.column_index(columns::MUTED),
            process_id: schema.column_index(columns::PROCESS_ID),
            process_path: schema.column_index(columns::PROCESS_PATH),
            item_id: schema.column_index(columns::ITEM_ID),
            direction: schema.column_index(columns::DIRECTION),
            kind: schema.column_index(columns::TYPE),
            device_name: schema.column_index(columns::DEVICE_NAME),
            device_state: schema.column_index(columns::DEVICE_STATE),
        };
        cols.log_missing();
        cols
    }

    fn log_missing(&self) {
        let checks = [
            (columns::NAME, self.name),
            (columns::MUTED, self.muted),
            (columns::PROCESS_ID, self.process_id),
            (columns::PROCESS_PATH, self.process_path),
            (columns::ITEM_ID, self.item_id),
            (columns::DIRECTION, self.direction),
            (columns::TYPE, self.kind),
            (columns::DEVICE_NAME, self.device_name),
            (columns::DEVICE_STATE, self.device_state),
        ];
        let missing: Vec<&str> = checks
            .iter()
            .filter(|(_, index)| index.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "Dump is missing columns, related features disabled");
        }
    }

    fn text(&self, record: &Record, index: Option<usize>) -> String {
        record.cell(index).unwrap_or_default().to_string()
    }

    fn is_application(&self, record: &Record) -> bool {
        record.cell_is(self.direction, RENDER)
            && record.cell_is(self.kind, APPLICATION)
            && record.cell(self.process_id).is_some_and(|pid| !pid.is_empty())
    }

    fn is_active_device(&self, record: &Record) -> bool {
        record.cell_is(self.direction, RENDER)
            && record.cell_is(self.kind, DEVICE)
            && record.cell_is(self.device_state, ACTIVE)
    }
}

/// Applications with a render stream, one entry per process id.
///
/// A process seen again keeps its first position and name, but its
/// device becomes [`CurrentDevice::Unresolved`].
pub fn build_applications(records: &[Record], schema: &ColumnSchema) -> Vec<ApplicationEntry> {
    let cols = InventoryColumns::resolve(schema);
    applications_with(&cols, records)
}

/// Active render devices, in dump order, without deduplication
pub fn build_devices(records: &[Record], schema: &ColumnSchema) -> Vec<DeviceEntry> {
    let cols = InventoryColumns::resolve(schema);
    devices_with(&cols, records)
}

fn applications_with(cols: &InventoryColumns, records: &[Record]) -> Vec<ApplicationEntry> {
    let mut apps: Vec<ApplicationEntry> = Vec::new();
    let mut by_pid: HashMap<String, usize> = HashMap::new();

    for record in records.iter().filter(|r| cols.is_application(r)) {
        let pid = cols.text(record, cols.process_id);

        if let Some(&index) = by_pid.get(&pid) {
            debug!(pid = %pid, "Process has several streams, current device unresolved");
            apps[index].current_device = CurrentDevice::Unresolved;
            continue;
        }

        // Item ID lists every stream of the process separated by '|'
        let item_id = record.cell(cols.item_id).unwrap_or_default();
        let first_device = item_id.split('|').next().unwrap_or_default().to_string();

        by_pid.insert(pid.clone(), apps.len());
        apps.push(ApplicationEntry {
            name: cols.text(record, cols.name),
            process_id: pid,
            process_path: cols.text(record, cols.process_path),
            current_device: CurrentDevice::Device(first_device),
            muted: record.cell(cols.muted).map(|m| m == MUTED_YES),
        });
    }

    apps
}

fn devices_with(cols: &InventoryColumns, records: &[Record]) -> Vec<DeviceEntry> {
    records
        .iter()
        .filter(|r| cols.is_active_device(r))
        .map(|record| DeviceEntry {
            name: cols.text(record, cols.name),
            device_id: cols.text(record, cols.item_id),
            sub_name: cols.text(record, cols.device_name),
        })
        .collect()
}

/// Full inventory snapshot from one dump
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub applications: Vec<ApplicationEntry>,
    pub devices: Vec<DeviceEntry>,
}

impl Inventory {
    /// Build both collections, resolving columns once
    pub fn from_dump(dump: &Dump) -> Self {
        let cols = InventoryColumns::resolve(&dump.schema);
        let inventory = Self {
            applications: applications_with(&cols, &dump.records),
            devices: devices_with(&cols, &dump.records),
        };
        debug!(
            applications = inventory.applications.len(),
            devices = inventory.devices.len(),
            "Inventory rebuilt"
        );
        inventory
    }

    /// First running application with this executable path
    pub fn application_by_path(&self, path: &str) -> Option<&ApplicationEntry> {
        self.applications.iter().find(|a| a.process_path == path)
    }

    pub fn application_by_pid(&self, process_id: &str) -> Option<&ApplicationEntry> {
        self.applications.iter().find(|a| a.process_id == process_id)
    }

    pub fn device(&self, device_id: &str) -> Option<&DeviceEntry> {
        self.devices.iter().find(|d| d.device_id == device_id)
    }
}
