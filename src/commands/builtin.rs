//! Commands every console has, independent of the controller.

use std::sync::{Arc, Weak};

use async_trait::async_trait;

use crate::core::{Command, CommandError, CommandRegistry, Console, RegistryError, Resolution, resolve};
use crate::table::StringTable;

/// Ends the session.
pub struct Exit {
    name: &'static str,
}

impl Exit {
    /// The `exit` command.
    pub fn new() -> Self {
        Self { name: "exit" }
    }

    /// The same command under another name, e.g. `quit`.
    pub fn alias(name: &'static str) -> Self {
        Self { name }
    }
}

impl Default for Exit {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Command for Exit {
    fn name(&self) -> &str {
        self.name
    }

    fn help(&self) -> Option<&str> {
        Some("Leave the console")
    }

    async fn execute(&self, console: &mut dyn Console, _args: &str) -> Result<String, CommandError> {
        console.close();
        Ok(String::new())
    }
}

/// Lists commands, or describes one.
pub struct Help {
    registry: Weak<CommandRegistry>,
}

impl Help {
    /// Describe the commands of `registry`.
    pub fn new(registry: &Arc<CommandRegistry>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
        }
    }
}

#[async_trait]
impl Command for Help {
    fn name(&self) -> &str {
        "help"
    }

    fn usage(&self) -> Option<&str> {
        Some("[COMMAND]")
    }

    fn help(&self) -> Option<&str> {
        Some("List commands, or show usage of one command")
    }

    async fn execute(&self, _console: &mut dyn Console, args: &str) -> Result<String, CommandError> {
        let Some(registry) = self.registry.upgrade() else {
            return Ok(String::new());
        };

        if args.is_empty() {
            return Ok(command_table(registry.commands()).to_string());
        }

        match resolve(&registry, args) {
            Resolution::Resolved { command, .. } => {
                let mut line = command.name().to_string();
                if let Some(usage) = command.usage() {
                    line.push(' ');
                    line.push_str(usage);
                }
                if let Some(help) = command.help() {
                    line.push_str(" - ");
                    line.push_str(help);
                }
                Ok(line)
            }
            Resolution::Ambiguous { candidates, .. } => Err(CommandError::Usage(format!(
                "ambiguous command \"{}\" ({})",
                args,
                candidates.join(", ")
            ))),
            Resolution::NotFound { input, .. } => Err(CommandError::Usage(format!("unknown command \"{input}\""))),
        }
    }
}

/// `show` on its own: lists what can be shown.
pub struct ShowMenu {
    registry: Weak<CommandRegistry>,
}

impl ShowMenu {
    /// List the `show` commands of `registry`.
    pub fn new(registry: &Arc<CommandRegistry>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
        }
    }
}

#[async_trait]
impl Command for ShowMenu {
    fn name(&self) -> &str {
        "show"
    }

    fn help(&self) -> Option<&str> {
        Some("List what can be shown")
    }

    async fn execute(&self, _console: &mut dyn Console, args: &str) -> Result<String, CommandError> {
        if !args.is_empty() {
            return Err(CommandError::Usage(format!("nothing to show for \"{args}\"")));
        }
        let Some(registry) = self.registry.upgrade() else {
            return Ok(String::new());
        };

        let shows = registry
            .commands()
            .into_iter()
            .filter(|(path, _)| path.starts_with("show "));
        Ok(command_table(shows).to_string())
    }
}

/// Prints the session's command history.
pub struct ShowHistory;

#[async_trait]
impl Command for ShowHistory {
    fn name(&self) -> &str {
        "show history"
    }

    fn help(&self) -> Option<&str> {
        Some("Show the commands entered in this session")
    }

    async fn execute(&self, console: &mut dyn Console, _args: &str) -> Result<String, CommandError> {
        let lines: Vec<String> = console
            .history()
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:>4}  {}", i + 1, line))
            .collect();
        Ok(lines.join("\n"))
    }
}

fn command_table(commands: impl IntoIterator<Item = (String, Arc<dyn Command>)>) -> StringTable {
    let mut table = StringTable::new(["Command", "Arguments", "Description"]);
    for (path, command) in commands {
        table.add_row([
            path,
            command.usage().unwrap_or_default().to_string(),
            command.help().unwrap_or_default().to_string(),
        ]);
    }
    table
}

/// Register `exit`, `quit`, `help`, `show` and `show history`.
pub fn register_builtin_commands(registry: &Arc<CommandRegistry>) -> Result<(), RegistryError> {
    // exit / quit - Leave the console
    registry.register(Arc::new(Exit::new()))?;
    registry.register(Arc::new(Exit::alias("quit")))?;

    // help - List commands or describe one
    registry.register(Arc::new(Help::new(registry)))?;

    // show - List the show commands
    registry.register(Arc::new(ShowMenu::new(registry)))?;

    // show history - This session's commands
    registry.register(Arc::new(ShowHistory))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FnCommand;
    use crate::core::console::testing::MockConsole;

    fn registry() -> Arc<CommandRegistry> {
        let registry = Arc::new(CommandRegistry::new());
        register_builtin_commands(&registry).unwrap();
        registry
            .register(Arc::new(
                FnCommand::new("show switch", |_| Ok(String::new()))
                    .with_usage("[SWITCH]")
                    .with_help("Show switches"),
            ))
            .unwrap();
        registry
    }

    #[test]
    fn test_register_twice_fails() {
        let registry = registry();
        assert!(matches!(
            register_builtin_commands(&registry),
            Err(RegistryError::DuplicatePath(_))
        ));
    }

    #[tokio::test]
    async fn test_exit_and_quit_close() {
        for name in ["exit", "quit"] {
            let mut console = MockConsole::new("root");
            let command = Exit::alias(name);
            assert_eq!(command.execute(&mut console, "").await.unwrap(), "");
            assert!(console.is_closed());
        }
    }

    #[tokio::test]
    async fn test_help_lists_all_commands() {
        let registry = registry();
        let mut console = MockConsole::new("root");
        let out = Help::new(&registry).execute(&mut console, "").await.unwrap();

        for path in registry.paths() {
            assert!(out.contains(&format!("| {path} ")), "missing {path} in\n{out}");
        }
        assert!(out.contains("[SWITCH]"));
        assert!(out.contains("Leave the console"));
    }

    #[tokio::test]
    async fn test_help_for_one_command() {
        let registry = registry();
        let mut console = MockConsole::new("root");
        let help = Help::new(&registry);

        let out = help.execute(&mut console, "sh sw").await.unwrap();
        assert_eq!(out, "show switch [SWITCH] - Show switches");

        assert!(matches!(
            help.execute(&mut console, "reload").await,
            Err(CommandError::Usage(_))
        ));
    }

    #[tokio::test]
    async fn test_show_lists_subcommands_only() {
        let registry = registry();
        let mut console = MockConsole::new("root");
        let out = ShowMenu::new(&registry).execute(&mut console, "").await.unwrap();

        assert!(out.contains("show switch"));
        assert!(out.contains("show history"));
        assert!(!out.contains("exit"));
        let rows = out.lines().filter(|l| l.starts_with("| show")).count();
        assert_eq!(rows, 2);
    }

    #[tokio::test]
    async fn test_show_with_unknown_argument() {
        let registry = registry();
        let mut console = MockConsole::new("root");
        let result = ShowMenu::new(&registry).execute(&mut console, "bogus").await;
        assert!(matches!(result, Err(CommandError::Usage(_))));
    }

    #[tokio::test]
    async fn test_show_history_numbered() {
        let mut console = MockConsole::new("root");
        console.history = vec!["show switch".into(), "show history".into()];
        let out = ShowHistory.execute(&mut console, "").await.unwrap();
        assert_eq!(out, "   1  show switch\n   2  show history");
    }

    #[tokio::test]
    async fn test_dropped_registry_is_harmless() {
        let registry = registry();
        let help = Help::new(&registry);
        drop(registry);

        let mut console = MockConsole::new("root");
        assert_eq!(help.execute(&mut console, "").await.unwrap(), "");
    }
}
