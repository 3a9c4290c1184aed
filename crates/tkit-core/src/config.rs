//! Configuration types for tkit.
//!
//! [`TkitConfig`] is loaded from `~/.tkit/config.yaml` (or an explicit path)
//! and carries the renderer defaults:
//!
//! ```yaml
//! color: auto
//! status:
//!   columnWidth: 40
//!   fillChar: "."
//!   success: { text: "[DONE]", color: green }
//!   failure: { text: "[FAILED]", color: red }
//! prefix:
//!   indentWidth: 2
//! failure:
//!   waitForAck: true
//! ```
//!
//! Every key is optional; missing keys take the built-in defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::color::{parse_color, Color, ColorMode, StyleFlags, StyledText};
use crate::errors::{Result, TkitError};
use crate::prefix::DEFAULT_INDENT_WIDTH;
use crate::status::{
    DEFAULT_COLUMN_WIDTH, DEFAULT_FAILURE_TEXT, DEFAULT_FILL_CHAR, DEFAULT_SUCCESS_TEXT,
};

/// Column widths beyond this are accepted but produce a warning.
pub const MAX_REASONABLE_COLUMN_WIDTH: usize = 200;

// ============================================================================
// TkitConfig
// ============================================================================

/// User-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TkitConfig {
    /// Color output mode (always/never/auto).
    #[serde(default)]
    pub color: ColorMode,

    #[serde(default)]
    pub status: StatusConfig,

    #[serde(default)]
    pub prefix: PrefixConfig,

    #[serde(default)]
    pub failure: FailureConfig,
}

impl TkitConfig {
    /// Load from the default location (`~/.tkit/config.yaml`).
    ///
    /// If the file does not exist, returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TkitError::InvalidConfigFile`] if the file exists but cannot
    /// be parsed, or a validation error.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::from_path(&path),
            None => {
                tracing::debug!("Could not determine home directory, using default config");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific path.
    ///
    /// If the file does not exist, returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TkitError::InvalidConfigFile`] if the file exists but cannot
    /// be read or parsed, and the errors of [`Self::validate`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let config = Self::read_path(path)?;
        config.log_warnings()?;
        Ok(config)
    }

    /// Read and parse a config file without validating it.
    ///
    /// A missing file yields the defaults. Used by `tkit config check`, which
    /// reports validation results itself.
    pub fn read_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            TkitError::InvalidConfigFile(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config = Self::parse_yaml(&content).map_err(|e| {
            TkitError::InvalidConfigFile(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config = Self::parse_yaml(content)
            .map_err(|e| TkitError::InvalidConfigFile(e.to_string()))?;
        config.log_warnings()?;
        Ok(config)
    }

    fn parse_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    fn log_warnings(&self) -> Result<()> {
        for warning in self.validate()? {
            tracing::warn!("Config warning: {}", warning);
        }
        Ok(())
    }

    /// Get the default config directory (`~/.tkit`).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".tkit"))
    }

    /// Get the default config file path (`~/.tkit/config.yaml`).
    pub fn default_path() -> Option<PathBuf> {
        Self::default_dir().map(|d| d.join("config.yaml"))
    }

    /// Validate every section, returning warnings for questionable values.
    ///
    /// # Errors
    ///
    /// Returns the first hard error found in any section.
    pub fn validate(&self) -> Result<Vec<String>> {
        let mut warnings = self.status.validate()?;
        warnings.extend(self.prefix.validate());
        Ok(warnings)
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Text and color of a status outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeStyleConfig {
    pub text: String,

    /// Color name; `none`, `plain` or a missing key print the text unstyled.
    #[serde(default)]
    pub color: Option<String>,

    /// Print the colored text bold.
    #[serde(default = "default_bold")]
    pub bold: bool,
}

impl OutcomeStyleConfig {
    fn new(text: &str, color: Color) -> Self {
        Self {
            text: text.to_string(),
            color: Some(color.name().to_string()),
            bold: default_bold(),
        }
    }

    /// Styled text for this outcome, bold unless `bold` is off.
    ///
    /// # Errors
    ///
    /// Returns [`TkitError::UnknownColor`] for an unknown color name.
    pub fn to_styled(&self) -> Result<StyledText> {
        let color = match &self.color {
            Some(name) => parse_color(name)?,
            None => None,
        };
        let flags = if self.bold { StyleFlags::BOLD } else { StyleFlags::NONE };
        Ok(StyledText::new(self.text.clone(), color, flags))
    }
}

/// Settings for [`crate::StatusRenderer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusConfig {
    #[serde(default = "default_column_width")]
    pub column_width: usize,

    #[serde(default = "default_fill_char")]
    pub fill_char: String,

    #[serde(default = "default_success")]
    pub success: OutcomeStyleConfig,

    #[serde(default = "default_failure")]
    pub failure: OutcomeStyleConfig,
}

fn default_column_width() -> usize {
    DEFAULT_COLUMN_WIDTH
}
fn default_fill_char() -> String {
    DEFAULT_FILL_CHAR.to_string()
}
fn default_bold() -> bool {
    true
}
fn default_success() -> OutcomeStyleConfig {
    OutcomeStyleConfig::new(DEFAULT_SUCCESS_TEXT, Color::Green)
}
fn default_failure() -> OutcomeStyleConfig {
    OutcomeStyleConfig::new(DEFAULT_FAILURE_TEXT, Color::Red)
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            column_width: DEFAULT_COLUMN_WIDTH,
            fill_char: default_fill_char(),
            success: default_success(),
            failure: default_failure(),
        }
    }
}

impl StatusConfig {
    /// The fill character as a `char`.
    ///
    /// # Errors
    ///
    /// Returns [`TkitError::InvalidConfiguration`] unless `fill_char` is
    /// exactly one character.
    pub fn fill_char(&self) -> Result<char> {
        let mut chars = self.fill_char.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(TkitError::InvalidConfiguration {
                message: format!(
                    "status.fillChar must be a single character, got {:?}",
                    self.fill_char
                ),
                hint: "Use a value such as \".\" or \"-\"".to_string(),
            }),
        }
    }

    /// # Errors
    ///
    /// Fails on a multi-character fill or an unknown outcome color.
    pub fn validate(&self) -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        self.fill_char()?;
        self.success.to_styled()?;
        self.failure.to_styled()?;

        if self.column_width == 0 {
            warnings.push(
                "status.columnWidth=0 disables alignment; outcomes follow labels directly"
                    .to_string(),
            );
        } else if self.column_width > MAX_REASONABLE_COLUMN_WIDTH {
            warnings.push(format!(
                "status.columnWidth={} is wider than most terminals",
                self.column_width
            ));
        }

        Ok(warnings)
    }
}

/// Settings for [`crate::PrefixRenderer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefixConfig {
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,
}

fn default_indent_width() -> usize {
    DEFAULT_INDENT_WIDTH
}

impl Default for PrefixConfig {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
        }
    }
}

impl PrefixConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.indent_width == 0 {
            warnings.push("prefix.indentWidth=0 prints messages flush against the tag".to_string());
        }
        warnings
    }
}

/// Settings for [`crate::FailureReporter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureConfig {
    /// Block on "Press <Enter>" after printing a failure.
    #[serde(default = "default_wait_for_ack")]
    pub wait_for_ack: bool,
}

fn default_wait_for_ack() -> bool {
    true
}

impl Default for FailureConfig {
    fn default() -> Self {
        Self { wait_for_ack: true }
    }
}

// ============================================================================
// Tests
// ============================================================================
