use crate::commands::Reply;
use crossterm::style::Stylize;
use nu_ansi_term::{Color, Style};

/// Utility functions for console output

pub fn print_info(message: &str) {
    println!("{}", message.cyan());
}

pub fn print_success(message: &str) {
    println!("{}", message.green());
}

pub fn print_warning(message: &str) {
    println!("{}", message.yellow());
}

pub fn print_error(message: &str) {
    println!("{}", message.red());
}

/// Render a command reply. Returns false when the reply asks to exit.
pub fn print_reply(reply: &Reply) -> bool {
    match reply {
        Reply::Info(text) => print_info(text),
        Reply::Success(text) => print_success(text),
        Reply::Warning(text) => print_warning(text),
        Reply::Listing { title, entries } => {
            print_info(title);
            for line in numbered(entries) {
                println!("{}", line);
            }
        }
        Reply::Exit => return false,
    }
    true
}

/// Prefix each entry with its 1-based position
pub fn numbered(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{}. {}", i + 1, entry))
        .collect()
}

pub fn banner(version: &str) -> String {
    let title = Style::new().bold().fg(Color::Cyan).paint(format!("Abacus calculator v{}", version));
    let hint = Color::DarkGray.paint("Type 'help' for commands, 'exit' or Ctrl+D to quit");
    format!("{}\n{}", title, hint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered() {
        let entries = vec!["add(1, 1) = 2".to_string(), "add(2, 2) = 4".to_string()];
        assert_eq!(numbered(&entries), vec!["1. add(1, 1) = 2", "2. add(2, 2) = 4"]);
    }

    #[test]
    fn test_print_reply_exit() {
        assert!(!print_reply(&Reply::Exit));
        assert!(print_reply(&Reply::Info("hello".to_string())));
    }

    #[test]
    fn test_banner_mentions_version() {
        assert!(banner("1.2.3").contains("1.2.3"));
    }
}
