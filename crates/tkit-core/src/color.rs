//! Color handling for console output.
//!
//! Respects the `NO_COLOR` environment variable and TTY detection.
//! See https://no-color.org/ for the NO_COLOR standard.
//!
//! [`render`] is the single entry point every renderer goes through: it maps a
//! (text, color, style flags) triple to a string carrying SGR escape codes, or
//! returns the text untouched when styling is off.

use std::fmt;
use std::io::IsTerminal;
use std::str::FromStr;

use owo_colors::{AnsiColors, OwoColorize, Style};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TkitError};

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Always use colors, even when output is not a TTY.
    Always,
    /// Never use colors.
    Never,
    /// Automatically detect based on TTY and NO_COLOR env var.
    #[default]
    Auto,
}

impl ColorMode {
    /// Check if colors should be used based on current mode.
    ///
    /// `Auto` is resolved on every call, so a change to `NO_COLOR` is picked
    /// up by the next render.
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => Self::should_auto_colorize(),
        }
    }

    /// Determine if colors should be used in auto mode.
    ///
    /// Rules:
    /// 1. If `NO_COLOR` env var is set (any value), disable colors
    /// 2. If stdout is not a TTY, disable colors
    /// 3. Otherwise, enable colors
    fn should_auto_colorize() -> bool {
        if std::env::var_os("NO_COLOR").is_some() {
            return false;
        }
        std::io::stdout().is_terminal()
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::Never => write!(f, "never"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for ColorMode {
    type Err = TkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            "auto" => Ok(Self::Auto),
            _ => Err(TkitError::InvalidColorMode(s.to_string())),
        }
    }
}

/// Foreground colors known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Grey,
}

impl Color {
    /// Every known color, in listing order.
    pub const ALL: [Color; 9] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::White,
        Color::Grey,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
            Self::White => "white",
            Self::Grey => "grey",
        }
    }

    fn ansi(self) -> AnsiColors {
        match self {
            Self::Black => AnsiColors::Black,
            Self::Red => AnsiColors::Red,
            Self::Green => AnsiColors::Green,
            Self::Yellow => AnsiColors::Yellow,
            Self::Blue => AnsiColors::Blue,
            Self::Magenta => AnsiColors::Magenta,
            Self::Cyan => AnsiColors::Cyan,
            Self::White => AnsiColors::White,
            Self::Grey => AnsiColors::BrightBlack,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = TkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "black" => Ok(Self::Black),
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            "yellow" => Ok(Self::Yellow),
            "blue" => Ok(Self::Blue),
            "magenta" | "purple" => Ok(Self::Magenta),
            "cyan" => Ok(Self::Cyan),
            "white" => Ok(Self::White),
            "grey" | "gray" => Ok(Self::Grey),
            _ => Err(TkitError::UnknownColor(s.to_string())),
        }
    }
}

/// Parse a color name, treating the neutral names as "no color".
///
/// `""`, `"none"` and `"plain"` yield `Ok(None)`; anything else must be a
/// known color.
///
/// # Example
///
/// ```
/// use tkit_core::color::{parse_color, Color};
///
/// assert_eq!(parse_color("purple").unwrap(), Some(Color::Magenta));
/// assert_eq!(parse_color("none").unwrap(), None);
/// assert!(parse_color("mauve").is_err());
/// ```
pub fn parse_color(name: &str) -> Result<Option<Color>> {
    match name.trim().to_lowercase().as_str() {
        "" | "none" | "plain" => Ok(None),
        _ => name.parse().map(Some),
    }
}

/// Text attributes applied alongside a color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleFlags {
    pub bold: bool,
    pub dimmed: bool,
    pub italic: bool,
    pub underline: bool,
}

impl StyleFlags {
    /// No attributes.
    pub const NONE: StyleFlags = StyleFlags {
        bold: false,
        dimmed: false,
        italic: false,
        underline: false,
    };

    /// Bold only; the attribute every status tag uses.
    pub const BOLD: StyleFlags = StyleFlags {
        bold: true,
        dimmed: false,
        italic: false,
        underline: false,
    };

    fn apply(self, mut style: Style) -> Style {
        if self.bold {
            style = style.bold();
        }
        if self.dimmed {
            style = style.dimmed();
        }
        if self.italic {
            style = style.italic();
        }
        if self.underline {
            style = style.underline();
        }
        style
    }
}

/// Render `text` with an optional color and attributes.
///
/// Returns `text` unchanged when `color` is `None` or when `mode` resolves to
/// "disabled"; flags without a color are ignored.
///
/// # Example
///
/// ```
/// use tkit_core::color::{render, Color, ColorMode, StyleFlags};
///
/// assert_eq!(render("[DONE]", Some(Color::Green), StyleFlags::BOLD, ColorMode::Never), "[DONE]");
///
/// let styled = render("[DONE]", Some(Color::Green), StyleFlags::BOLD, ColorMode::Always);
/// assert!(styled.starts_with("\x1b["));
/// assert!(styled.ends_with("\x1b[0m"));
/// ```
pub fn render(text: &str, color: Option<Color>, flags: StyleFlags, mode: ColorMode) -> String {
    let Some(color) = color else {
        return text.to_string();
    };
    if !mode.is_enabled() {
        return text.to_string();
    }
    let style = flags.apply(Style::new().color(color.ansi()));
    text.style(style).to_string()
}

/// A piece of text paired with the color and attributes it should carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledText {
    text: String,
    color: Option<Color>,
    flags: StyleFlags,
}

impl StyledText {
    /// Unstyled text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            flags: StyleFlags::NONE,
        }
    }

    /// Bold text in `color`, or plain text when `color` is `None`.
    pub fn bold(text: impl Into<String>, color: Option<Color>) -> Self {
        Self {
            text: text.into(),
            color,
            flags: StyleFlags::BOLD,
        }
    }

    /// Text with explicit color and flags.
    pub fn new(text: impl Into<String>, color: Option<Color>, flags: StyleFlags) -> Self {
        Self {
            text: text.into(),
            color,
            flags,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn flags(&self) -> StyleFlags {
        self.flags
    }

    /// Render through [`render`].
    pub fn render(&self, mode: ColorMode) -> String {
        render(&self.text, self.color, self.flags, mode)
    }
}

/// Names of every known color, in listing order.
pub fn list_color_names() -> Vec<&'static str> {
    Color::ALL.iter().map(|c| c.name()).collect()
}

/// Every color name rendered in its own color, space-joined.
pub fn show_colors(mode: ColorMode) -> String {
    Color::ALL
        .iter()
        .map(|c| render(c.name(), Some(*c), StyleFlags::NONE, mode))
        .collect::<Vec<_>>()
        .join(" ")
}
