//! Terminal output for the chat loop.
//!
//! The streamed answer goes to stdout; prompts, narration, and status lines
//! go to stderr so the answer stays pipeable.

use crossterm::style::{Color, Stylize};
use std::io::{self, Write};

const PROMPT_SYMBOL: &str = "•";
const LABEL_ASSISTANT: &str = "Assistant:";
const LABEL_WARNING: &str = "warning:";
const LABEL_ERROR: &str = "error:";
const GLYPH_TOOL: &str = "→";
const INDENT_1: &str = "  ";

/// Renderer with an ANSI colour switch.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Startup banner naming the model in use.
    pub fn banner(&self, model: &str) {
        if self.color {
            eprintln!(
                "{} {}",
                "mundi".with(Color::Cyan).bold(),
                format!("country & currency assistant ({model})").with(Color::DarkGrey)
            );
        } else {
            eprintln!("mundi country & currency assistant ({model})");
        }
    }

    /// Input prompt (stderr, no newline).
    pub fn prompt(&self, label: &str) {
        if self.color {
            eprint!(
                "{} {} ",
                PROMPT_SYMBOL.with(Color::Green).bold(),
                label.with(Color::Green)
            );
        } else {
            eprint!("{PROMPT_SYMBOL} {label} ");
        }
        let _ = io::stderr().flush();
    }

    /// Label printed once before the streamed reply.
    pub fn assistant_label(&self) {
        if self.color {
            print!("{} ", LABEL_ASSISTANT.with(Color::Cyan).bold());
        } else {
            print!("{LABEL_ASSISTANT} ");
        }
        let _ = io::stdout().flush();
    }

    /// One fragment of the streamed reply.
    pub fn text_delta(&self, delta: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(delta.as_bytes());
        let _ = stdout.flush();
    }

    /// Terminate the reply line.
    pub fn end_reply(&self) {
        println!();
        println!();
    }

    /// Narration shown when the assistant starts a lookup.
    pub fn tool_activity(&self, text: &str) {
        if self.color {
            eprintln!(
                "\r{INDENT_1}{} {}",
                GLYPH_TOOL.with(Color::Yellow),
                format!("{text}...").with(Color::DarkGrey)
            );
        } else {
            eprintln!("\r{INDENT_1}{GLYPH_TOOL} {text}...");
        }
    }

    /// Neutral informational line.
    pub fn info(&self, text: &str) {
        if self.color {
            eprintln!("{}", text.with(Color::DarkGrey));
        } else {
            eprintln!("{text}");
        }
    }

    /// One numbered menu entry.
    pub fn menu_item(&self, key: &str, label: &str, detail: Option<&str>) {
        let detail = detail.map(|d| format!(" ({d})")).unwrap_or_default();
        if self.color {
            eprintln!(
                "{INDENT_1}{} {label}{}",
                format!("[{key}]").with(Color::Cyan),
                detail.with(Color::DarkGrey)
            );
        } else {
            eprintln!("{INDENT_1}[{key}] {label}{detail}");
        }
    }

    pub fn warn(&self, msg: &str) {
        if self.color {
            eprintln!("{} {msg}", LABEL_WARNING.with(Color::Yellow).bold());
        } else {
            eprintln!("{LABEL_WARNING} {msg}");
        }
    }

    pub fn error(&self, msg: &str) {
        if self.color {
            eprintln!("{} {msg}", LABEL_ERROR.with(Color::Red).bold());
        } else {
            eprintln!("{LABEL_ERROR} {msg}");
        }
    }
}
