//! Console commands.
//!
//! [`register_builtin_commands`] adds the commands every console has;
//! [`register_controller_commands`] adds the ones that query the controller.

mod builtin;
mod show_host;
mod show_logging;
mod show_switch;

pub use builtin::{Exit, Help, ShowHistory, ShowMenu, register_builtin_commands};
pub use show_host::ShowHost;
pub use show_logging::ShowLogging;
pub use show_switch::ShowSwitch;

use std::sync::Arc;

use crate::backend::{DeviceService, SwitchStatusSource};
use crate::core::{CommandRegistry, RegistryError};
use crate::logging::LogBuffer;

/// Register `show switch`, `show host` and `show logging`.
pub fn register_controller_commands(
    registry: &CommandRegistry,
    devices: Arc<dyn DeviceService>,
    switches: Arc<dyn SwitchStatusSource>,
    logs: LogBuffer,
) -> Result<(), RegistryError> {
    registry.register(Arc::new(ShowSwitch::new(switches)))?;
    registry.register(Arc::new(ShowHost::new(devices)))?;
    registry.register(Arc::new(ShowLogging::new(logs)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryInventory;
    use crate::core::{CommandError, Resolution, resolve};
    use async_trait::async_trait;

    struct NoSwitches;

    #[async_trait]
    impl SwitchStatusSource for NoSwitches {
        async fn fetch(&self) -> Result<String, CommandError> {
            Ok("[]".into())
        }
    }

    fn full_registry() -> Arc<CommandRegistry> {
        let registry = Arc::new(CommandRegistry::new());
        register_builtin_commands(&registry).unwrap();
        register_controller_commands(
            &registry,
            Arc::new(InMemoryInventory::new()),
            Arc::new(NoSwitches),
            LogBuffer::new(10),
        )
        .unwrap();
        registry
    }

    #[test]
    fn test_console_command_set() {
        let registry = full_registry();
        assert_eq!(
            registry.paths(),
            vec![
                "exit",
                "help",
                "quit",
                "show",
                "show history",
                "show host",
                "show logging",
                "show switch",
            ]
        );
    }

    #[test]
    fn test_console_resolution() {
        let registry = full_registry();

        let name = |line: &str| match resolve(&registry, line) {
            Resolution::Resolved { command, args } => format!("{}|{}", command.name(), args),
            other => format!("{:?}", other),
        };

        assert_eq!(name("sh"), "show|");
        assert_eq!(name("show swi 00:00:00:00:00:00:00:01"), "show switch|00:00:00:00:00:00:00:01");
        assert_eq!(name("sh ho 10.0.0.1"), "show host|10.0.0.1");
        assert_eq!(name("q"), "quit|");
        assert!(name("show h").starts_with("Ambiguous"));
        assert_eq!(name("e"), "exit|");
    }
}
