//! Tagged status lines in the style of init-system boot messages.
//!
//! ## Tags
//!
//! | Kind | Tag | Color |
//! |------|-----|-------|
//! | Processing | `[......]` | White |
//! | Done | `[  OK  ]` | Green |
//! | Fail | `[ FAIL ]` | Red |
//! | Info | `[ INFO ]` | Cyan |
//! | Warn | `[ WARN ]` | Yellow |
//!
//! Every tag is six characters wide so the message column never moves.
//! [`PrefixRenderer::write`] ends its line with a carriage return; the
//! following [`PrefixRenderer::ok`] or [`PrefixRenderer::fail`] overwrites it
//! on terminals that honor `\r`.

use std::io::{Read, Stdin, Stdout, Write};

use crate::color::{render, Color, ColorMode, StyleFlags};
use crate::config::PrefixConfig;
use crate::terminal::Terminal;

/// Default spacing between the tag and the message.
pub const DEFAULT_INDENT_WIDTH: usize = 2;

/// Kind of tagged line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Processing,
    Done,
    Fail,
    Info,
    Warn,
}

impl TagKind {
    /// The six-character text inside the brackets.
    pub fn text(&self) -> &'static str {
        match self {
            Self::Processing => "......",
            Self::Done => "  OK  ",
            Self::Fail => " FAIL ",
            Self::Info => " INFO ",
            Self::Warn => " WARN ",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Processing => Color::White,
            Self::Done => Color::Green,
            Self::Fail => Color::Red,
            Self::Info => Color::Cyan,
            Self::Warn => Color::Yellow,
        }
    }

    /// `[<tag>]` with the tag text styled bold in its color.
    pub fn render(&self, mode: ColorMode) -> String {
        format!("[{}]", render(self.text(), Some(self.color()), StyleFlags::BOLD, mode))
    }
}

/// Renderer that prefixes each message with a bracketed tag.
#[derive(Debug)]
pub struct PrefixRenderer<W = Stdout, R = Stdin> {
    terminal: Terminal<W, R>,
    color_mode: ColorMode,
    indent_width: usize,
    last_message: String,
}

impl PrefixRenderer<Stdout, Stdin> {
    /// Renderer on stdout/stdin with default settings.
    pub fn stdio(color_mode: ColorMode) -> Self {
        Self::new(Terminal::stdio(), color_mode)
    }
}

impl<W: Write, R: Read> PrefixRenderer<W, R> {
    pub fn new(terminal: Terminal<W, R>, color_mode: ColorMode) -> Self {
        Self {
            terminal,
            color_mode,
            indent_width: DEFAULT_INDENT_WIDTH,
            last_message: String::new(),
        }
    }

    pub fn from_config(terminal: Terminal<W, R>, color_mode: ColorMode, config: &PrefixConfig) -> Self {
        let mut renderer = Self::new(terminal, color_mode);
        renderer.set_indent_width(config.indent_width);
        renderer
    }

    pub fn set_indent_width(&mut self, width: usize) {
        self.indent_width = width;
    }

    pub fn last_message(&self) -> &str {
        &self.last_message
    }

    /// Announce `message` on an overwritable line.
    pub fn write(&mut self, message: &str) {
        self.last_message = message.to_string();
        let line = self.make(TagKind::Processing);
        self.terminal.write_overwritable(&line);
    }

    /// Mark the last message done, optionally replacing its text.
    pub fn ok(&mut self, message: Option<&str>) {
        self.finish(TagKind::Done, message);
    }

    /// Mark the last message failed, optionally replacing its text.
    pub fn fail(&mut self, message: Option<&str>) {
        self.finish(TagKind::Fail, message);
    }

    pub fn info(&mut self, message: &str) {
        self.finish(TagKind::Info, Some(message));
    }

    pub fn warn(&mut self, message: &str) {
        self.finish(TagKind::Warn, Some(message));
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<W, R> {
        &mut self.terminal
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn into_terminal(self) -> Terminal<W, R> {
        self.terminal
    }

    fn finish(&mut self, kind: TagKind, message: Option<&str>) {
        if let Some(message) = message {
            self.last_message = message.to_string();
        }
        let line = self.make(kind);
        self.terminal.write_line(&line);
    }

    fn make(&self, kind: TagKind) -> String {
        format!(
            "{}{}{}",
            kind.render(self.color_mode),
            " ".repeat(self.indent_width),
            self.last_message
        )
    }
}
