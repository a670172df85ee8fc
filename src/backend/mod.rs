//! Controller state consumed by the `show` commands.
//!
//! Commands only see the traits here, so they can be exercised against
//! in-memory fixtures and pointed at a live controller in production.

use std::net::Ipv4Addr;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::core::CommandError;

/// Default switch status endpoint of the controller's REST API.
pub const DEFAULT_SWITCHES_URL: &str = "http://localhost:8080/wm/core/controller/switches/json";

/// Where a device is attached to the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPoint {
    /// DPID of the switch.
    pub switch_dpid: String,
    /// OpenFlow port number on that switch.
    pub port: u32,
}

impl std::fmt::Display for AttachmentPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.switch_dpid, self.port)
    }
}

/// A host known to the device inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// MAC address, colon separated.
    pub mac: String,
    /// VLAN tag, if the device is tagged.
    pub vlan: Option<u16>,
    /// IPv4 addresses seen for the device.
    pub ipv4: Vec<Ipv4Addr>,
    /// Switch ports the device is attached to.
    pub attachment_points: Vec<AttachmentPoint>,
    /// When the device was last seen.
    pub last_seen: DateTime<Utc>,
}

/// The device inventory.
#[async_trait]
pub trait DeviceService: Send + Sync {
    /// Every device currently known.
    async fn all_devices(&self) -> Result<Vec<Device>, CommandError>;
}

/// A [`DeviceService`] holding devices in memory, keyed by MAC.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    devices: RwLock<Vec<Device>>,
}

impl InMemoryInventory {
    /// Create an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a device, replacing one with the same MAC.
    pub fn insert(&self, device: Device) {
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        match devices.iter_mut().find(|d| d.mac.eq_ignore_ascii_case(&device.mac)) {
            Some(existing) => *existing = device,
            None => devices.push(device),
        }
    }

    /// Remove the device with this MAC.
    pub fn remove(&self, mac: &str) -> Option<Device> {
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        let index = devices.iter().position(|d| d.mac.eq_ignore_ascii_case(mac))?;
        Some(devices.remove(index))
    }

    /// Forget every device.
    pub fn clear(&self) {
        self.devices.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.devices.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the inventory is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DeviceService for InMemoryInventory {
    async fn all_devices(&self) -> Result<Vec<Device>, CommandError> {
        Ok(self.devices.read().unwrap_or_else(PoisonError::into_inner).clone())
    }
}

/// Source of the raw switch status document.
#[async_trait]
pub trait SwitchStatusSource: Send + Sync {
    /// Fetch the JSON body listing connected switches.
    async fn fetch(&self) -> Result<String, CommandError>;
}

/// Fetches switch status from the controller's REST API.
#[derive(Debug, Clone)]
pub struct HttpSwitchStatus {
    client: reqwest::Client,
    url: String,
}

impl HttpSwitchStatus {
    /// Create a source for `url` with a request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, CommandError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// The endpoint queried.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SwitchStatusSource for HttpSwitchStatus {
    async fn fetch(&self) -> Result<String, CommandError> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

/// One connected switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchRecord {
    /// Datapath ID.
    pub dpid: String,
    /// When the switch connected.
    pub connected_since: DateTime<Utc>,
    /// Address of the switch's control connection.
    pub ip: String,
    /// Source port of the control connection.
    pub port: String,
}

#[derive(Deserialize)]
struct RawSwitch {
    dpid: String,
    #[serde(rename = "connectedSince")]
    connected_since: i64,
    #[serde(rename = "inetAddress")]
    inet_address: String,
}

/// Parse the switch status document, a JSON array of switch objects.
///
/// Unknown fields are ignored. Errors keep the payload as received.
pub fn parse_switches(payload: &str) -> Result<Vec<SwitchRecord>, CommandError> {
    let raw: Vec<RawSwitch> =
        serde_json::from_str(payload).map_err(|e| CommandError::parse(e.to_string(), payload))?;

    raw.into_iter()
        .map(|switch| {
            let connected_since = DateTime::from_timestamp_millis(switch.connected_since).ok_or_else(|| {
                CommandError::parse(
                    format!("connectedSince out of range: {}", switch.connected_since),
                    payload,
                )
            })?;
            let (ip, port) = split_inet_address(&switch.inet_address);
            Ok(SwitchRecord {
                dpid: switch.dpid,
                connected_since,
                ip: ip.to_string(),
                port: port.to_string(),
            })
        })
        .collect()
}

/// Split `"/10.0.0.1:6633"` into address and port.
fn split_inet_address(inet: &str) -> (&str, &str) {
    let inet = inet.strip_prefix('/').unwrap_or(inet);
    inet.rsplit_once(':').unwrap_or((inet, ""))
}
