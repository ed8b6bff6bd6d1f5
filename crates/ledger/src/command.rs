//! Chat commands.

use teloxide::utils::command::BotCommands;

/// Bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Show help")]
    Help,
    #[command(description = "Show today's summary")]
    Today,
    #[command(description = "Show today's summary, or all-time stats. Usage: /stats all")]
    Stats(String),
    #[command(description = "Record an expense. Usage: /exp 450 ferry")]
    Exp(String),
}

/// What a chat message asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(Command),
    /// Plain text is an expense line.
    Expense(String),
    /// A slash command this bot does not know.
    Unknown(String),
    Empty,
}

pub fn classify(text: &str) -> Input {
    let text = text.trim();
    if text.is_empty() {
        return Input::Empty;
    }
    if !text.starts_with('/') {
        return Input::Expense(text.to_string());
    }
    match Command::parse(text, "") {
        Ok(cmd) => Input::Command(cmd),
        Err(_) => Input::Unknown(text.to_string()),
    }
}
