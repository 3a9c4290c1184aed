//! Labels for units of work.
//!
//! A [`WorkDescriptor`] carries a unit of work's identifier and, optionally,
//! its documentation text. The label announced when the work starts is
//! taken from the documentation when it holds a `Msg:` marker line:
//!
//! ```text
//! Loads the parcel layer.
//! Msg:
//!     Loading parcels...
//! ```
//!
//! yields `Loading parcels...`. Without a marker the identifier is used.

use std::sync::LazyLock;

use regex::Regex;

static MSG_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)msg:\r?\n([^\r\n]*)").expect("Invalid regex"));

/// Identifier plus optional documentation for a unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDescriptor {
    name: String,
    doc: Option<String>,
}

impl WorkDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
        }
    }

    /// Attach documentation text.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Resolve the label announced when the work starts.
    ///
    /// # Example
    ///
    /// ```
    /// use tkit_core::WorkDescriptor;
    ///
    /// let work = WorkDescriptor::new("has_value").with_doc("Has value.\nMsg:\n    Doing stuff");
    /// assert_eq!(work.label(), "Doing stuff");
    /// assert_eq!(WorkDescriptor::new("has_value").label(), "has_value");
    /// ```
    pub fn label(&self) -> String {
        self.doc
            .as_deref()
            .and_then(label_from_doc)
            .unwrap_or_else(|| self.name.clone())
    }
}

/// Extract the line following a case-insensitive `Msg:` marker.
///
/// Returns `None` when the marker is absent or no line break follows it. A
/// blank following line yields an empty label.
pub fn label_from_doc(doc: &str) -> Option<String> {
    MSG_MARKER
        .captures(doc)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_start().to_string())
}

/// Build a [`WorkDescriptor`] named after a function or closure binding.
///
/// ```
/// use tkit_core::describe;
///
/// fn load_parcels() {}
/// let plain = describe!(load_parcels);
/// assert_eq!(plain.label(), "load_parcels");
///
/// let documented = describe!(load_parcels, "Msg:\n  Loading parcels...");
/// assert_eq!(documented.label(), "Loading parcels...");
/// ```
#[macro_export]
macro_rules! describe {
    ($work:ident) => {
        $crate::WorkDescriptor::new(stringify!($work))
    };
    ($work:ident, $doc:expr) => {
        $crate::WorkDescriptor::new(stringify!($work)).with_doc($doc)
    };
}
