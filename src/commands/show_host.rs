//! `show host`: hosts seen by the device inventory.

use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::{Device, DeviceService};
use crate::core::{Command, CommandError, Console};
use crate::table::StringTable;

const HEADER: [&str; 7] = [
    "MAC Address",
    "VLAN",
    "Vendor",
    "IP Address",
    "Switch/OF Port (Physical Port)",
    "Tag",
    "Last Seen",
];

/// Lists hosts, optionally those matching a MAC or IPv4 address.
pub struct ShowHost {
    devices: Arc<dyn DeviceService>,
}

impl ShowHost {
    /// Query hosts from `devices`.
    pub fn new(devices: Arc<dyn DeviceService>) -> Self {
        Self { devices }
    }
}

#[async_trait]
impl Command for ShowHost {
    fn name(&self) -> &str {
        "show host"
    }

    fn usage(&self) -> Option<&str> {
        Some("[MAC|IP]")
    }

    fn help(&self) -> Option<&str> {
        Some("Show hosts attached to controlled switches")
    }

    async fn execute(&self, _console: &mut dyn Console, args: &str) -> Result<String, CommandError> {
        let filter = args.trim();
        let mut devices = self.devices.all_devices().await?;
        if !filter.is_empty() {
            devices.retain(|d| matches(d, filter));
        }
        devices.sort_by(|a, b| a.mac.cmp(&b.mac));

        let mut table = StringTable::new(HEADER);
        for device in &devices {
            table.add_row(row(device));
        }
        Ok(table.to_string())
    }
}

fn matches(device: &Device, filter: &str) -> bool {
    device.mac.eq_ignore_ascii_case(filter) || device.ipv4.iter().any(|ip| ip.to_string() == filter)
}

fn row(device: &Device) -> [String; 7] {
    let vlan = device.vlan.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
    let ips = device
        .ipv4
        .iter()
        .map(|ip| ip.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let attachments = device
        .attachment_points
        .iter()
        .map(|ap| ap.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    [
        device.mac.clone(),
        vlan,
        "unknown".to_string(),
        ips,
        attachments,
        String::new(),
        device.last_seen.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    ]
}
