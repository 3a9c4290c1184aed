//! # tkit-core
//!
//! **Terminal kit** – console status reporting engine.
//!
//! This crate renders progress and outcome lines for long-running work on a
//! text terminal, and turns failures of that work into readable reports.
//! It is consumed by the `tkit` CLI and by any Rust tool that wants
//! "label ..... [DONE]" style output.
//!
//! ## Main Types
//!
//! - [`StatusRenderer`] – label, fill and aligned outcome suffix on one line
//! - [`PrefixRenderer`] – bracketed `[  OK  ]`-style tags before each message
//! - [`FailureReporter`] – prints a [`FailureReport`] and waits for Enter
//! - [`Instrumented`] – a unit of work wrapped so its outcome is reported
//! - [`TkitConfig`] – user configuration loaded from `~/.tkit/config.yaml`
//!
//! ## Modules
//!
//! - [`color`] – colors, color modes and styled text
//! - [`config`] – configuration types and loading
//! - [`errors`] – error types
//! - [`failure`] – failure reports and panic capture
//! - [`instrument`] – running work with outcome reporting
//! - [`label`] – work descriptors and `Msg:` labels
//! - [`prefix`] – the tagged renderer
//! - [`status`] – the aligned status renderer
//! - [`terminal`] – output/input handle shared by the renderers
//!
//! ## Example
//!
//! ```no_run
//! use tkit_core::{ColorMode, PrefixRenderer, StatusRenderer};
//!
//! let mut status = StatusRenderer::stdio(ColorMode::Auto);
//! status.begin("Compiling shaders");
//! status.success();
//!
//! let mut nix = PrefixRenderer::stdio(ColorMode::Auto);
//! nix.write("Mounting volumes");
//! nix.ok(None);
//! ```

// Modules
pub mod color;
pub mod config;
pub mod errors;
pub mod failure;
pub mod instrument;
pub mod label;
pub mod prefix;
pub mod status;
pub mod terminal;

// Re-exports for convenience
//
// Note on naming: `status::Outcome` (success/failure of a status line) is
// re-exported as `StatusOutcome`; `Outcome` is the result of instrumented work.
pub use color::{
    list_color_names, parse_color, render, show_colors, Color, ColorMode, StyleFlags, StyledText,
};
pub use config::{FailureConfig, OutcomeStyleConfig, PrefixConfig, StatusConfig, TkitConfig};
pub use errors::{Result, TkitError};
pub use failure::{FailureReport, FailureReporter, Location};
pub use instrument::{attempt, instrument, Instrumented, Outcome, Reporter, Step};
pub use label::{label_from_doc, WorkDescriptor};
pub use prefix::{PrefixRenderer, TagKind};
pub use status::{Outcome as StatusOutcome, StatusRenderer};
pub use terminal::{Terminal, ACK_PROMPT};
