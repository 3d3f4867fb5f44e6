//! Chat-loop command words and tool narration.

/// Words that end the chat loop.
pub const EXIT_COMMANDS: [&str; 4] = ["sair", "quit", "exit", "q"];
/// Words that drop the active session and start over.
pub const CLEAR_COMMANDS: [&str; 3] = ["limpar", "clear", "reset"];

/// One line of user input, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand<'a> {
    Exit,
    Clear,
    Empty,
    /// Anything else, trimmed.
    Message(&'a str),
}

impl<'a> ReplCommand<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        let lower = trimmed.to_lowercase();
        if EXIT_COMMANDS.contains(&lower.as_str()) {
            Self::Exit
        } else if CLEAR_COMMANDS.contains(&lower.as_str()) {
            Self::Clear
        } else {
            Self::Message(trimmed)
        }
    }
}

/// Human wording for a tool the assistant is about to call.
pub fn tool_narration(name: &str) -> String {
    match name {
        "get_country_info" => "Looking up country information".to_string(),
        "get_exchange_rate" => "Looking up exchange rates".to_string(),
        other => format!("Looking up: {other}"),
    }
}
