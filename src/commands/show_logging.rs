//! `show logging`: recent log records of the console process.

use async_trait::async_trait;

use crate::core::{Command, CommandError, Console};
use crate::logging::LogBuffer;
use crate::table::StringTable;

/// Records shown when no count is given.
pub const DEFAULT_COUNT: usize = 20;

/// Shows the last log records captured by [`crate::logging`].
pub struct ShowLogging {
    logs: LogBuffer,
}

impl ShowLogging {
    /// Read records from `logs`.
    pub fn new(logs: LogBuffer) -> Self {
        Self { logs }
    }
}

#[async_trait]
impl Command for ShowLogging {
    fn name(&self) -> &str {
        "show logging"
    }

    fn usage(&self) -> Option<&str> {
        Some("[COUNT]")
    }

    fn help(&self) -> Option<&str> {
        Some("Show recent log messages")
    }

    async fn execute(&self, _console: &mut dyn Console, args: &str) -> Result<String, CommandError> {
        let count = match args.trim() {
            "" => DEFAULT_COUNT,
            n => n
                .parse()
                .map_err(|_| CommandError::Usage(format!("expected a record count, got \"{n}\"")))?,
        };

        let mut table = StringTable::new(["Time", "Level", "Target", "Message"]);
        for record in self.logs.recent(count) {
            table.add_row([
                record.time.format("%Y-%m-%d %H:%M:%S").to_string(),
                record.level.to_string(),
                record.target,
                record.message,
            ]);
        }
        Ok(table.to_string())
    }
}
