//! Message styling for the CLI's own output.
//!
//! Everything the `tkit` binary says about itself (config problems, command
//! errors, `config show`) goes through [`Style`]; the status lines produced on
//! behalf of user work come from the tkit-core renderers.
//!
//! ## Message Types
//!
//! | Prefix | Meaning | Color |
//! |--------|---------|-------|
//! | `[ok]` | Success | Green |
//! | `[err]` | Error | Red |
//! | `[warn]` | Warning | Yellow |
//! | `[info]` | Information | Blue |
//! | `[hint]` | Suggestion | Cyan |

use tkit_core::{render, Color, ColorMode, StyleFlags};

/// Message severity/type for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Success - operation completed successfully
    Ok,
    /// Error - operation failed, cannot continue
    Err,
    /// Warning - operation succeeded with caveats
    Warn,
    /// Information - neutral status
    Info,
    /// Hint - actionable next step or tip
    Hint,
}

impl MessageType {
    /// Returns the prefix text for this message type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ok => "[ok]",
            Self::Err => "[err]",
            Self::Warn => "[warn]",
            Self::Info => "[info]",
            Self::Hint => "[hint]",
        }
    }

    fn color(&self) -> Color {
        match self {
            Self::Ok => Color::Green,
            Self::Err => Color::Red,
            Self::Warn => Color::Yellow,
            Self::Info => Color::Blue,
            Self::Hint => Color::Cyan,
        }
    }
}

/// Main styling interface for CLI output.
#[derive(Debug, Clone)]
pub struct Style {
    color_mode: ColorMode,
}

impl Style {
    /// Create a Style instance with an explicit color mode.
    pub fn new(color_mode: ColorMode) -> Self {
        Self { color_mode }
    }

    /// Format a simple message with a type prefix, e.g. `[ok] Done`.
    pub fn message(&self, msg_type: MessageType, text: &str) -> String {
        let prefix = render(
            msg_type.prefix(),
            Some(msg_type.color()),
            StyleFlags::NONE,
            self.color_mode,
        );
        format!("{} {}", prefix, text)
    }

    /// Format a section header (bold cyan).
    pub fn section(&self, title: &str) -> String {
        render(title, Some(Color::Cyan), StyleFlags::BOLD, self.color_mode)
    }

    /// Format a structured error with optional cause and hint.
    pub fn error_with_context(&self, msg: &str, cause: Option<&str>, hint: Option<&str>) -> String {
        let mut output = self.message(MessageType::Err, msg);

        if let Some(cause_text) = cause {
            output.push('\n');
            output.push_str(&format!("      Cause: {}", cause_text));
        }

        if let Some(hint_text) = hint {
            output.push('\n');
            output.push_str(&format!("      Hint: {}", hint_text));
        }

        output
    }

    /// Format a key-value pair with a grey key.
    pub fn key_value(&self, key: &str, value: &str) -> String {
        format!(
            "{}: {}",
            render(key, Some(Color::Grey), StyleFlags::NONE, self.color_mode),
            value
        )
    }
}
