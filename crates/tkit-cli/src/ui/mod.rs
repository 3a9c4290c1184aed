//! # CLI UI Module
//!
//! Styling for the messages the `tkit` binary prints about itself.
//!
//! Colors follow the resolved `--color` mode (and `NO_COLOR` in auto mode),
//! the same [`tkit_core::ColorMode`] the renderers use.

pub mod style;

pub use style::{MessageType, Style};
