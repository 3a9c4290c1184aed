//! Column-aligned status lines.
//!
//! A status line is written in two halves. [`StatusRenderer::begin`] prints a
//! label and leaves the cursor at the end of it; a later completion call pads
//! the line with fill characters up to the configured column and prints the
//! outcome:
//!
//! ```text
//! Be ok...................................[DONE]
//! Will fail...............................[FAILED]
//! ```
//!
//! The renderer remembers how long the pending label was so the fill can be
//! computed. A completion with no pending label prints the outcome with no
//! fill at all.

use std::io::{Read, Stdin, Stdout, Write};

use crate::color::{parse_color, Color, ColorMode, StyledText};
use crate::config::StatusConfig;
use crate::errors::Result;
use crate::terminal::Terminal;

/// Default column at which outcomes start.
pub const DEFAULT_COLUMN_WIDTH: usize = 40;

/// Default fill character.
pub const DEFAULT_FILL_CHAR: char = '.';

/// Default success outcome text.
pub const DEFAULT_SUCCESS_TEXT: &str = "[DONE]";

/// Default failure outcome text.
pub const DEFAULT_FAILURE_TEXT: &str = "[FAILED]";

/// Terminal result of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Stateful single-line status printer.
#[derive(Debug)]
pub struct StatusRenderer<W = Stdout, R = Stdin> {
    terminal: Terminal<W, R>,
    color_mode: ColorMode,
    column_width: usize,
    fill_char: char,
    pending_label_len: usize,
    success_style: StyledText,
    failure_style: StyledText,
}

impl StatusRenderer<Stdout, Stdin> {
    /// Renderer on stdout/stdin with default settings.
    pub fn stdio(color_mode: ColorMode) -> Self {
        Self::new(Terminal::stdio(), color_mode)
    }
}

impl<W: Write, R: Read> StatusRenderer<W, R> {
    pub fn new(terminal: Terminal<W, R>, color_mode: ColorMode) -> Self {
        Self {
            terminal,
            color_mode,
            column_width: DEFAULT_COLUMN_WIDTH,
            fill_char: DEFAULT_FILL_CHAR,
            pending_label_len: 0,
            success_style: StyledText::bold(DEFAULT_SUCCESS_TEXT, Some(Color::Green)),
            failure_style: StyledText::bold(DEFAULT_FAILURE_TEXT, Some(Color::Red)),
        }
    }

    /// Build a renderer from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TkitError::UnknownColor`] if an outcome color is not
    /// a known color name.
    pub fn from_config(
        terminal: Terminal<W, R>,
        color_mode: ColorMode,
        config: &StatusConfig,
    ) -> Result<Self> {
        let mut renderer = Self::new(terminal, color_mode);
        renderer.set_column_width(config.column_width);
        renderer.set_fill_char(config.fill_char()?);
        renderer.success_style = config.success.to_styled()?;
        renderer.failure_style = config.failure.to_styled()?;
        Ok(renderer)
    }

    pub fn column_width(&self) -> usize {
        self.column_width
    }

    /// Length of the label awaiting completion; 0 when none is pending.
    pub fn pending_label_len(&self) -> usize {
        self.pending_label_len
    }

    pub fn success_style(&self) -> &StyledText {
        &self.success_style
    }

    pub fn failure_style(&self) -> &StyledText {
        &self.failure_style
    }

    /// Set the outcome column. Applies from the next completion on.
    pub fn set_column_width(&mut self, width: usize) {
        self.column_width = width;
    }

    pub fn set_fill_char(&mut self, fill: char) {
        self.fill_char = fill;
    }

    /// Replace the success outcome. `None` stores the text unstyled.
    pub fn set_success_style(&mut self, text: impl Into<String>, color: Option<Color>) {
        self.success_style = StyledText::bold(text, color);
    }

    /// Replace the failure outcome. `None` stores the text unstyled.
    pub fn set_failure_style(&mut self, text: impl Into<String>, color: Option<Color>) {
        self.failure_style = StyledText::bold(text, color);
    }

    /// Replace the success outcome with text in any color and attributes.
    pub fn set_success_styled(&mut self, style: StyledText) {
        self.success_style = style;
    }

    /// Replace the failure outcome with text in any color and attributes.
    pub fn set_failure_styled(&mut self, style: StyledText) {
        self.failure_style = style;
    }

    /// [`Self::set_success_style`] with a color name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TkitError::UnknownColor`] for an unknown name; the
    /// stored style is left untouched.
    pub fn set_success_style_named(&mut self, text: impl Into<String>, color: &str) -> Result<()> {
        let color = parse_color(color)?;
        self.set_success_style(text, color);
        Ok(())
    }

    /// [`Self::set_failure_style`] with a color name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TkitError::UnknownColor`] for an unknown name; the
    /// stored style is left untouched.
    pub fn set_failure_style_named(&mut self, text: impl Into<String>, color: &str) -> Result<()> {
        let color = parse_color(color)?;
        self.set_failure_style(text, color);
        Ok(())
    }

    /// Print `label` with no line break and remember its length.
    pub fn begin(&mut self, label: &str) {
        self.write(label);
    }

    /// Same as [`Self::begin`].
    pub fn write(&mut self, label: &str) {
        self.pending_label_len = label.chars().count();
        self.terminal.write_partial(label);
    }

    /// Finish the pending line with the success or failure outcome.
    pub fn complete(&mut self, outcome: Outcome) {
        let body = match outcome {
            Outcome::Success => self.success_style.render(self.color_mode),
            Outcome::Failure => self.failure_style.render(self.color_mode),
        };
        self.place_fill();
        self.terminal.write_line(&body);
    }

    pub fn success(&mut self) {
        self.complete(Outcome::Success);
    }

    pub fn failure(&mut self) {
        self.complete(Outcome::Failure);
    }

    /// Finish the pending line with an arbitrary message.
    ///
    /// With a color the message is printed bold in that color. When
    /// `wait_for_user` is set, blocks on the acknowledgment prompt afterwards.
    pub fn custom(&mut self, message: &str, color: Option<Color>, wait_for_user: bool) {
        let body = StyledText::bold(message, color).render(self.color_mode);
        self.place_fill();
        self.terminal.write_line(&body);
        if wait_for_user {
            self.terminal.wait_for_ack();
        }
    }

    /// Access the underlying terminal, e.g. to hand it to the failure reporter.
    pub fn terminal_mut(&mut self) -> &mut Terminal<W, R> {
        &mut self.terminal
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn into_terminal(self) -> Terminal<W, R> {
        self.terminal
    }

    /// Pad the current line up to the outcome column and clear the pending
    /// label.
    fn place_fill(&mut self) {
        let used = if self.pending_label_len == 0 {
            self.column_width
        } else {
            self.pending_label_len
        };
        let fill = self.column_width.saturating_sub(used);
        let padding: String = std::iter::repeat(self.fill_char).take(fill).collect();
        self.terminal.write_partial(&padding);
        self.pending_label_len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{render, StyleFlags};

    type BufferRenderer = StatusRenderer<Vec<u8>, &'static [u8]>;

    fn renderer(mode: ColorMode) -> BufferRenderer {
        StatusRenderer::new(Terminal::new(Vec::new(), &b"\n"[..]), mode)
    }

    fn output(renderer: BufferRenderer) -> String {
        let (out, _) = renderer.into_terminal().into_parts();
        String::from_utf8(out).unwrap()
    }

    fn green_bold(text: &str) -> String {
        render(text, Some(Color::Green), StyleFlags::BOLD, ColorMode::Always)
    }

    #[test]
    fn test_begin_writes_label_without_newline() {
        let mut status = renderer(ColorMode::Never);
        status.begin("Doing important task...");
        assert_eq!(status.pending_label_len(), 23);
        assert_eq!(output(status), "Doing important task...");
    }

    #[test]
    fn test_success_scenario() {
        let mut status = renderer(ColorMode::Always);
        status.begin("Be ok");
        status.complete(Outcome::Success);
        let expected = format!("Be ok{}{}\n", ".".repeat(35), green_bold("[DONE]"));
        assert_eq!(output(status), expected);
    }

    #[test]
    fn test_failure_with_custom_style() {
        let mut status = renderer(ColorMode::Always);
        status.set_failure_style("WRONG!", Some(Color::Yellow));
        status.begin("Will fail");
        status.failure();
        let expected = format!(
            "Will fail{}{}\n",
            ".".repeat(31),
            render("WRONG!", Some(Color::Yellow), StyleFlags::BOLD, ColorMode::Always)
        );
        assert_eq!(output(status), expected);
    }

    #[test]
    fn test_alignment_for_every_label_length() {
        for len in 0..=45 {
            let mut status = renderer(ColorMode::Never);
            let label = "x".repeat(len);
            status.begin(&label);
            status.success();
            let out = output(status);
            let fill = out.trim_start_matches('x').trim_end_matches("[DONE]\n").len();
            let expected = if len == 0 { 0 } else { 40usize.saturating_sub(len) };
            assert_eq!(fill, expected, "label length {len}");
        }
    }

    #[test]
    fn test_complete_without_label_has_no_fill() {
        let mut status = renderer(ColorMode::Never);
        status.success();
        assert_eq!(output(status), "[DONE]\n");
    }

    #[test]
    fn test_repeated_complete_has_no_fill() {
        let mut status = renderer(ColorMode::Never);
        status.begin("Task");
        status.success();
        status.failure();
        let expected = format!("Task{}[DONE]\n[FAILED]\n", ".".repeat(36));
        assert_eq!(output(status), expected);
    }

    #[test]
    fn test_complete_resets_pending_label() {
        let mut status = renderer(ColorMode::Never);
        status.begin("A long label that overflows the default column");
        status.failure();
        assert_eq!(status.pending_label_len(), 0);
        status.begin("Short");
        status.custom("[SKIP]", None, false);
        assert_eq!(status.pending_label_len(), 0);
    }

    #[test]
    fn test_long_label_gets_no_fill() {
        let mut status = renderer(ColorMode::Never);
        let label = "y".repeat(50);
        status.begin(&label);
        status.success();
        assert_eq!(output(status), format!("{label}[DONE]\n"));
    }

    #[test]
    fn test_column_width_applies_to_next_completion() {
        let mut status = renderer(ColorMode::Never);
        status.begin("abc");
        status.set_column_width(10);
        status.success();
        assert_eq!(output(status), "abc.......[DONE]\n");
    }

    #[test]
    fn test_label_length_counts_characters() {
        let mut status = renderer(ColorMode::Never);
        status.set_column_width(8);
        status.begin("héllo");
        status.success();
        assert_eq!(output(status), "héllo...[DONE]\n");
    }

    #[test]
    fn test_uncolored_outcome_stays_plain_when_colors_enabled() {
        let mut status = renderer(ColorMode::Always);
        status.set_success_style("ok", None);
        status.set_column_width(4);
        status.begin("a");
        status.success();
        assert_eq!(output(status), "a...ok\n");
    }

    #[test]
    fn test_outcome_style_without_bold() {
        let mut status = renderer(ColorMode::Always);
        status.set_success_styled(StyledText::new("[ OK ]", Some(Color::Green), StyleFlags::NONE));
        status.begin("Be ok");
        status.success();
        let expected = format!(
            "Be ok{}{}\n",
            ".".repeat(35),
            render("[ OK ]", Some(Color::Green), StyleFlags::NONE, ColorMode::Always)
        );
        assert_eq!(output(status), expected);
    }

    #[test]
    fn test_named_style_rejects_unknown_color() {
        let mut status = renderer(ColorMode::Never);
        assert!(status.set_success_style_named("YES", "mauve").is_err());
        assert_eq!(status.success_style().text(), "[DONE]");
        status.set_success_style_named("YES", "cyan").unwrap();
        assert_eq!(status.success_style().color(), Some(Color::Cyan));
    }

    #[test]
    fn test_custom_message_and_wait() {
        let mut status = renderer(ColorMode::Never);
        status.set_column_width(12);
        status.begin("Custom");
        status.custom("[COMPLETE]", Some(Color::Cyan), true);
        assert_eq!(
            output(status),
            "Custom......[COMPLETE]\n\nPress <Enter> to continue\n"
        );
    }

    #[test]
    fn test_fill_char() {
        let mut status = renderer(ColorMode::Never);
        status.set_column_width(6);
        status.set_fill_char('-');
        status.begin("ab");
        status.success();
        assert_eq!(output(status), "ab----[DONE]\n");
    }

    #[test]
    fn test_from_config() {
        let config: StatusConfig = serde_yaml::from_str(
            "columnWidth: 10\nfillChar: '_'\nsuccess:\n  text: OK\n  color: none\n",
        )
        .unwrap();
        let mut status =
            StatusRenderer::from_config(Terminal::new(Vec::new(), &b""[..]), ColorMode::Always, &config)
                .unwrap();
        status.begin("go");
        status.success();
        assert_eq!(output(status), "go________OK\n");
    }
}
