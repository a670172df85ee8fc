//! `show switch`: switches connected to the controller.

use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::{SwitchRecord, SwitchStatusSource, parse_switches};
use crate::core::{Command, CommandError, Console};
use crate::table::StringTable;

const HEADER: [&str; 10] = [
    "Switch DPID",
    "Switch Alias",
    "Active",
    "Core Switch",
    "Last Connect Time",
    "IP Address",
    "Port",
    "Controller ID",
    "Max Packets",
    "Max Tables",
];

/// Lists connected switches, optionally a single one by DPID.
pub struct ShowSwitch {
    source: Arc<dyn SwitchStatusSource>,
}

impl ShowSwitch {
    /// Query switches from `source`.
    pub fn new(source: Arc<dyn SwitchStatusSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Command for ShowSwitch {
    fn name(&self) -> &str {
        "show switch"
    }

    fn usage(&self) -> Option<&str> {
        Some("[SWITCH]")
    }

    fn help(&self) -> Option<&str> {
        Some("Show switches connected to the controller")
    }

    async fn execute(&self, _console: &mut dyn Console, args: &str) -> Result<String, CommandError> {
        let payload = self.source.fetch().await?;
        let mut switches = parse_switches(&payload)?;

        let filter = args.trim();
        if !filter.is_empty() && !filter.eq_ignore_ascii_case("all") {
            switches.retain(|s| s.dpid.eq_ignore_ascii_case(filter));
        }

        Ok(switch_table(&switches).to_string())
    }
}

fn switch_table(switches: &[SwitchRecord]) -> StringTable {
    let mut table = StringTable::new(HEADER);
    for switch in switches {
        table.add_row([
            switch.dpid.clone(),
            String::new(),
            String::new(),
            String::new(),
            switch.connected_since.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            switch.ip.clone(),
            switch.port.clone(),
            String::new(),
            String::new(),
            String::new(),
        ]);
    }
    table
}
