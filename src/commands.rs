use crate::calculator::Calculator;
use crate::error::{AbacusError, AbacusResult};
use crate::operations::Operation;
use regex::Regex;

/// A parsed line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    History,
    Clear,
    Undo,
    Redo,
    Save,
    Load,
    Exit,
    Calculate {
        operation: Operation,
        operands: Option<(String, String)>,
    },
}

/// What the caller should show after a command ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Info(String),
    Success(String),
    Warning(String),
    Listing { title: String, entries: Vec<String> },
    Exit,
}

pub struct CommandInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
}

pub struct CommandRegistry {
    commands: Vec<CommandInfo>,
    line_pattern: Regex,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let line_pattern = Regex::new(r"^\s*([A-Za-z_]+)(?:\s+(\S+))?(?:\s+(\S+))?\s*$")
            .expect("command line pattern is a valid regex");

        Self {
            commands: builtin_commands(),
            line_pattern,
        }
    }

    pub fn has_command(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.commands.iter().any(|c| c.name == name) || name.parse::<Operation>().is_ok()
    }

    pub fn list_commands(&self) -> &[CommandInfo] {
        &self.commands
    }

    pub fn help_text(&self) -> String {
        let mut help_text = String::from("Available commands:\n");

        let names: Vec<&str> = Operation::ALL.iter().map(|op| op.name()).collect();
        help_text.push_str(&format!("  {} - Perform calculations\n", names.join(", ")));
        for op in Operation::ALL {
            help_text.push_str(&format!("      {:<12} {}\n", op.name(), op.description()));
        }

        for cmd in &self.commands {
            help_text.push_str(&format!("  {:<8} - {} (usage: {})\n", cmd.name, cmd.description, cmd.usage));
        }

        help_text.push_str("Operations prompt for two numbers, or take them inline: add 2 3\n");
        help_text
    }

    /// Parse a line such as `undo`, `divide` or `power 2 10`
    pub fn parse(&self, line: &str) -> AbacusResult<Command> {
        let captures = self
            .line_pattern
            .captures(line)
            .ok_or_else(|| unknown_command(line.trim()))?;

        let name = captures[1].to_lowercase();
        let first = captures.get(2).map(|m| m.as_str().to_string());
        let second = captures.get(3).map(|m| m.as_str().to_string());

        let builtin = match name.as_str() {
            "help" => Some(Command::Help),
            "history" => Some(Command::History),
            "clear" => Some(Command::Clear),
            "undo" => Some(Command::Undo),
            "redo" => Some(Command::Redo),
            "save" => Some(Command::Save),
            "load" => Some(Command::Load),
            "exit" | "quit" => Some(Command::Exit),
            _ => None,
        };

        if let Some(command) = builtin {
            if first.is_some() {
                return Err(AbacusError::command(format!("'{}' takes no arguments", name)));
            }
            return Ok(command);
        }

        let operation: Operation = name.parse().map_err(|_| unknown_command(&name))?;
        let operands = match (first, second) {
            (None, None) => None,
            (Some(a), Some(b)) => Some((a, b)),
            _ => {
                return Err(AbacusError::command(format!(
                    "'{}' needs two numbers, e.g. {} 2 3",
                    name, name
                )))
            }
        };

        Ok(Command::Calculate { operation, operands })
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown_command(name: &str) -> AbacusError {
    AbacusError::command(format!(
        "Unknown command: '{}'. Type 'help' for available commands.",
        name
    ))
}

fn builtin_commands() -> Vec<CommandInfo> {
    vec![
        CommandInfo {
            name: "history",
            description: "Show calculation history",
            usage: "history",
        },
        CommandInfo {
            name: "clear",
            description: "Clear calculation history",
            usage: "clear",
        },
        CommandInfo {
            name: "undo",
            description: "Undo the last calculation",
            usage: "undo",
        },
        CommandInfo {
            name: "redo",
            description: "Redo the last undone calculation",
            usage: "redo",
        },
        CommandInfo {
            name: "save",
            description: "Save calculation history to file",
            usage: "save",
        },
        CommandInfo {
            name: "load",
            description: "Load calculation history from file",
            usage: "load",
        },
        CommandInfo {
            name: "help",
            description: "Show this help",
            usage: "help",
        },
        CommandInfo {
            name: "exit",
            description: "Save history and exit",
            usage: "exit",
        },
    ]
}

/// Run `command` against the calculator.
///
/// A calculation without operands is rejected; interactive callers collect
/// them before dispatching.
pub fn execute(calc: &mut Calculator, registry: &CommandRegistry, command: &Command) -> AbacusResult<Reply> {
    let reply = match command {
        Command::Help => Reply::Info(registry.help_text()),
        Command::History => {
            let entries = calc.show_history();
            if entries.is_empty() {
                Reply::Warning("No calculations in history".to_string())
            } else {
                Reply::Listing {
                    title: "Calculation History:".to_string(),
                    entries,
                }
            }
        }
        Command::Clear => {
            calc.clear_history();
            Reply::Info("History cleared".to_string())
        }
        Command::Undo => {
            if calc.undo() {
                Reply::Success("Operation undone".to_string())
            } else {
                Reply::Info("Nothing to undo".to_string())
            }
        }
        Command::Redo => {
            if calc.redo() {
                Reply::Success("Operation redone".to_string())
            } else {
                Reply::Info("Nothing to redo".to_string())
            }
        }
        Command::Save => {
            calc.save_history()?;
            Reply::Success(format!("History saved to {}", calc.store().path().display()))
        }
        Command::Load => {
            let count = calc.load_history()?;
            Reply::Success(format!("Loaded {} calculations", count))
        }
        Command::Exit => Reply::Exit,
        Command::Calculate { operation, operands } => {
            let (a, b) = operands.as_ref().ok_or_else(|| {
                AbacusError::command(format!("'{}' needs two numbers", operation))
            })?;
            let record = calc.perform_operation(operation.name(), a, b)?;
            Reply::Success(format!("Result: {}", record.result()))
        }
    };

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryOptions;
    use crate::persistence::HistoryStore;
    use tempfile::tempdir;

    #[test]
    fn test_command_registry() {
        let registry = CommandRegistry::new();
        assert!(registry.has_command("undo"));
        assert!(registry.has_command("int_divide"));
        assert!(!registry.has_command("nonexistent"));
    }

    #[test]
    fn test_help_command() {
        let registry = CommandRegistry::new();
        let help = registry.help_text();
        assert!(help.contains("Available commands"));
        assert!(help.contains("abs_diff"));
        assert!(help.contains("redo"));
    }

    #[test]
    fn test_parse_commands() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.parse("  UNDO ").unwrap(), Command::Undo);
        assert_eq!(registry.parse("quit").unwrap(), Command::Exit);
        assert_eq!(
            registry.parse("divide").unwrap(),
            Command::Calculate { operation: Operation::Divide, operands: None }
        );
        assert_eq!(
            registry.parse("power 2 -10.5").unwrap(),
            Command::Calculate {
                operation: Operation::Power,
                operands: Some(("2".to_string(), "-10.5".to_string())),
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        let registry = CommandRegistry::new();
        assert!(matches!(registry.parse("sqrt 4"), Err(AbacusError::Command { .. })));
        assert!(matches!(registry.parse("add 2"), Err(AbacusError::Command { .. })));
        assert!(matches!(registry.parse("undo 2"), Err(AbacusError::Command { .. })));
        assert!(matches!(registry.parse("add 1 2 3"), Err(AbacusError::Command { .. })));
    }

    #[test]
    fn test_execute_session() {
        let temp_dir = tempdir().unwrap();
        let registry = CommandRegistry::new();
        let mut calc = Calculator::with_observers(
            HistoryOptions::default(),
            HistoryStore::new(temp_dir.path().join("history.json")),
            Vec::new(),
        );

        let run = |calc: &mut Calculator, line: &str| {
            let command = registry.parse(line).unwrap();
            execute(calc, &registry, &command)
        };

        assert_eq!(run(&mut calc, "undo").unwrap(), Reply::Info("Nothing to undo".to_string()));
        assert_eq!(
            run(&mut calc, "history").unwrap(),
            Reply::Warning("No calculations in history".to_string())
        );
        assert_eq!(run(&mut calc, "add 2 3").unwrap(), Reply::Success("Result: 5".to_string()));
        assert!(run(&mut calc, "divide 10 0").is_err());
        assert_eq!(
            run(&mut calc, "history").unwrap(),
            Reply::Listing {
                title: "Calculation History:".to_string(),
                entries: vec!["add(2, 3) = 5".to_string()],
            }
        );
        assert!(run(&mut calc, "save").is_ok());
        assert_eq!(run(&mut calc, "clear").unwrap(), Reply::Info("History cleared".to_string()));
        assert_eq!(
            run(&mut calc, "load").unwrap(),
            Reply::Success("Loaded 1 calculations".to_string())
        );
        assert_eq!(run(&mut calc, "exit").unwrap(), Reply::Exit);
        assert!(run(&mut calc, "multiply").is_err());
    }
}
