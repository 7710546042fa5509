use crate::calculator::Calculator;
use crate::commands::{execute, Command, CommandRegistry, Reply};
use crate::config::Config;
use crate::error::{AbacusError, AbacusResult};
use crate::utils::{banner, print_error, print_info, print_reply, print_warning};
use reedline::{Prompt, PromptEditMode, PromptHistorySearch, Reedline, Signal};
use std::borrow::Cow;

pub struct ReplEngine {
    config: Config,
    editor: Reedline,
    calculator: Calculator,
    commands: CommandRegistry,
    prompt: CalcPrompt,
}

struct CalcPrompt {
    base_prompt: String,
    operand_prompt: String,
    operand_label: Option<&'static str>,
}

impl CalcPrompt {
    fn new(config: &Config) -> Self {
        Self {
            base_prompt: config.repl.prompt.clone(),
            operand_prompt: config.repl.operand_prompt.clone(),
            operand_label: None,
        }
    }

    fn set_operand(&mut self, label: Option<&'static str>) {
        self.operand_label = label;
    }
}

impl Prompt for CalcPrompt {
    fn render_prompt_left(&self) -> Cow<str> {
        match self.operand_label {
            Some(label) => Cow::Owned(format!("{}{}: ", self.operand_prompt, label)),
            None => Cow::Borrowed(&self.base_prompt),
        }
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed("...")
    }

    fn render_prompt_history_search_indicator(&self, _history_search: PromptHistorySearch) -> Cow<str> {
        Cow::Borrowed("(search) ")
    }
}

impl ReplEngine {
    pub fn new(config: Config, calculator: Calculator) -> Self {
        let prompt = CalcPrompt::new(&config);

        Self {
            config,
            editor: Reedline::create(),
            calculator,
            commands: CommandRegistry::new(),
            prompt,
        }
    }

    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    pub fn run_interactive(&mut self) -> AbacusResult<()> {
        println!("{}", banner(crate::VERSION));
        println!();

        if self.config.history.load_on_start {
            match self.calculator.restore() {
                Ok(0) => {}
                Ok(count) => print_info(&format!("Restored {} calculations", count)),
                Err(e) => print_warning(&format!("Warning: Could not load history: {}", e)),
            }
        }

        loop {
            let sig = self.editor.read_line(&self.prompt);

            match sig {
                Ok(Signal::Success(buffer)) => {
                    let line = buffer.trim();
                    if line.is_empty() {
                        continue;
                    }

                    match self.handle_line(line) {
                        Ok(Some(reply)) => {
                            if !print_reply(&reply) {
                                self.shutdown();
                                break;
                            }
                        }
                        Ok(None) => print_info("Operation cancelled"),
                        Err(e) if e.is_recoverable() => print_error(&format!("Error: {}", e)),
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => print_error(&format!("Unexpected error: {}", e)),
                    }
                }
                Ok(Signal::CtrlD) => {
                    print_info("Input terminated. Exiting...");
                    self.shutdown();
                    break;
                }
                Ok(Signal::CtrlC) => {
                    print_info("Operation cancelled");
                }
                Err(e) => {
                    return Err(AbacusError::repl(format!("Failed to read input: {}", e)));
                }
            }
        }

        Ok(())
    }

    /// Parse and run one line. `Ok(None)` means the user cancelled operand entry.
    fn handle_line(&mut self, line: &str) -> AbacusResult<Option<Reply>> {
        let command = match self.commands.parse(line)? {
            Command::Calculate { operation, operands: None } => match self.read_operands()? {
                Some(operands) => Command::Calculate {
                    operation,
                    operands: Some(operands),
                },
                None => return Ok(None),
            },
            command => command,
        };

        execute(&mut self.calculator, &self.commands, &command).map(Some)
    }

    fn read_operands(&mut self) -> AbacusResult<Option<(String, String)>> {
        print_info("Enter numbers (or 'cancel' to abort):");

        let first = self.read_operand("First number");
        let first = match first? {
            Some(value) => value,
            None => return Ok(None),
        };
        let second = match self.read_operand("Second number")? {
            Some(value) => value,
            None => return Ok(None),
        };

        Ok(Some((first, second)))
    }

    fn read_operand(&mut self, label: &'static str) -> AbacusResult<Option<String>> {
        self.prompt.set_operand(Some(label));
        let sig = self.editor.read_line(&self.prompt);
        self.prompt.set_operand(None);

        match sig {
            Ok(Signal::Success(buffer)) => {
                let value = buffer.trim();
                if value.eq_ignore_ascii_case("cancel") {
                    Ok(None)
                } else {
                    Ok(Some(value.to_string()))
                }
            }
            Ok(Signal::CtrlC) | Ok(Signal::CtrlD) => Ok(None),
            Err(e) => Err(AbacusError::repl(format!("Failed to read input: {}", e))),
        }
    }

    fn shutdown(&self) {
        if self.config.repl.save_on_exit {
            match self.calculator.save_history() {
                Ok(()) => print_info("History saved successfully."),
                Err(e) => print_warning(&format!("Warning: Could not save history: {}", e)),
            }
        }
        print_info("Goodbye!");
    }
}
