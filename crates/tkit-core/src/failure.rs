//! Failure capture and the considerate traceback.
//!
//! A [`FailureReport`] is built from an error (via `anyhow`'s cause chain and
//! backtrace) or from a panic caught inside [`crate::instrument::attempt`].
//! [`FailureReporter`] prints it and then blocks until the user presses
//! Enter, so a script run from a double-click does not close its window
//! before the error can be read.
//!
//! ```text
//! Traceback (most recent call last):
//!   demo::load_layer at src/main.rs:12:5
//!   demo::parse_header at src/main.rs:30:9
//! ParseError: unexpected end of header; Line: 30
//! Caused by:
//!   truncated file
//!
//! Press <Enter> to continue
//! ```

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::io::{Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use crate::color::{render, Color, ColorMode, StyleFlags};
use crate::config::FailureConfig;
use crate::terminal::Terminal;

/// First line of every printed trace.
pub const TRACE_HEADER: &str = "Traceback (most recent call last):";

/// Kind recorded for panics.
pub const PANIC_KIND: &str = "panic";

/// Frames whose symbol starts with one of these belong to the engine, the
/// runtime or the test harness and are left out of printed traces.
const HIDDEN_FRAME_PREFIXES: &[&str] = &[
    "tkit_core::failure::catch_panic",
    "tkit_core::failure::install_panic_hook",
    "tkit_core::failure::FailureReport::from_",
    "tkit_core::instrument::attempt",
    "tkit_core::instrument::Instrumented",
    "<tkit_core::instrument::Instrumented",
    "std::",
    "core::",
    "alloc::",
    "anyhow::",
    "test::",
    "rust_begin_unwind",
    "__rust",
    "__libc_",
];

/// Bare symbols of thread and process entry points.
const HIDDEN_FRAME_SYMBOLS: &[&str] = &[
    "<unknown>",
    "main",
    "_start",
    "thread_start",
    "start_thread",
    "clone",
    "clone3",
    "__clone",
];

/// Crates whose trait impls (`<Type as Trait>::method`) are runtime frames.
const RUNTIME_CRATES: &[&str] = &["std::", "core::", "alloc::", "anyhow::"];

/// Source paths of the toolchain and of registry dependencies.
const RUNTIME_PATHS: &[&str] = &["/rustc/", "/.cargo/registry/", "/.cargo/git/", "/rustlib/src/"];

/// Source position a failure originated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    /// Parse `path:line:column`, as printed by backtraces.
    fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().rsplitn(3, ':');
        let column = parts.next()?.parse().ok()?;
        let line = parts.next()?.parse().ok()?;
        let file = parts.next()?.to_string();
        Some(Self { file, line, column })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

impl From<&panic::Location<'_>> for Location {
    fn from(loc: &panic::Location<'_>) -> Self {
        Self {
            file: loc.file().to_string(),
            line: loc.line(),
            column: loc.column(),
        }
    }
}

/// Everything known about a failed unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    kind: String,
    message: String,
    causes: Vec<String>,
    location: Option<Location>,
    frames: Vec<String>,
}

impl FailureReport {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            causes: Vec::new(),
            location: None,
            frames: Vec::new(),
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_frames(mut self, frames: Vec<String>) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_causes(mut self, causes: Vec<String>) -> Self {
        self.causes = causes;
        self
    }

    /// Build a report from an error chain.
    ///
    /// The top-level message becomes the report message; the rest of the
    /// chain becomes the causes. Frames come from the error's backtrace when
    /// one was captured (`RUST_BACKTRACE=1`), otherwise from a backtrace
    /// taken here. The location is the innermost frame in user code of the
    /// error's own backtrace.
    pub fn from_error(kind: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::from_error_traced(kind, err, true)
    }

    /// [`Self::from_error`] for an error converted after its origin returned.
    ///
    /// With `traced_at_origin` false the error's backtrace starts at the
    /// conversion, not where the error was raised, so no location is claimed.
    pub(crate) fn from_error_traced(
        kind: impl Into<String>,
        err: &anyhow::Error,
        traced_at_origin: bool,
    ) -> Self {
        let causes = err.chain().skip(1).map(|c| c.to_string()).collect();
        let mut report = Self::new(kind, err.to_string()).with_causes(causes);
        if err.backtrace().status() == BacktraceStatus::Captured {
            report.frames = backtrace_frames(err.backtrace());
            if traced_at_origin {
                report.location = innermost_location(&report.frames);
            }
        } else {
            report.frames = backtrace_frames(&Backtrace::force_capture());
        }
        report
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Frame descriptions, outermost call first.
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// One-line form: `kind: message`, plus `; Line: n` when known.
    pub fn summary(&self) -> String {
        match &self.location {
            Some(loc) => format!("{}: {}; Line: {}", self.kind, self.message, loc.line),
            None => format!("{}: {}", self.kind, self.message),
        }
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Prints failure reports and waits for acknowledgment.
#[derive(Debug, Clone, Copy)]
pub struct FailureReporter {
    color_mode: ColorMode,
    acknowledge: bool,
}

impl FailureReporter {
    pub fn new(color_mode: ColorMode) -> Self {
        Self {
            color_mode,
            acknowledge: true,
        }
    }

    pub fn from_config(color_mode: ColorMode, config: &FailureConfig) -> Self {
        Self::new(color_mode).with_acknowledge(config.wait_for_ack)
    }

    /// Whether [`Self::report`] blocks on the prompt. On by default.
    pub fn with_acknowledge(mut self, acknowledge: bool) -> Self {
        self.acknowledge = acknowledge;
        self
    }

    /// Print `report` and block for acknowledgment.
    ///
    /// `None` prints no trace; the prompt is still shown.
    pub fn report<W: Write, R: Read>(
        &self,
        terminal: &mut Terminal<W, R>,
        report: Option<&FailureReport>,
    ) {
        if let Some(report) = report {
            tracing::debug!(kind = report.kind(), "Reporting failure: {}", report.message());
            terminal.write_line(TRACE_HEADER);
            for frame in report.frames() {
                terminal.write_line(&format!("  {}", frame));
            }
            let last = render(
                &report.summary(),
                Some(Color::Red),
                StyleFlags::BOLD,
                self.color_mode,
            );
            terminal.write_line(&last);
            if !report.causes().is_empty() {
                terminal.write_line("Caused by:");
                for cause in report.causes() {
                    terminal.write_line(&format!("  {}", cause));
                }
            }
        }
        if self.acknowledge {
            terminal.wait_for_ack();
        }
    }
}

// ============================================================================
// Panic capture
// ============================================================================

struct PanicCapture {
    location: Option<Location>,
    backtrace: Backtrace,
}

thread_local! {
    static CATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
    static LAST_PANIC: RefCell<Option<PanicCapture>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chain a hook in front of the current one that records panics raised
/// inside [`catch_panic`] instead of printing them. Panics elsewhere still
/// reach the previous hook.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CATCH_DEPTH.with(Cell::get) > 0 {
                let capture = PanicCapture {
                    location: info.location().map(Location::from),
                    backtrace: Backtrace::force_capture(),
                };
                LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(capture));
            } else {
                previous(info);
            }
        }));
    });
}

/// Run `f`, turning a panic into a [`FailureReport`].
pub(crate) fn catch_panic<T>(f: impl FnOnce() -> T) -> Result<T, FailureReport> {
    install_panic_hook();
    CATCH_DEPTH.with(|d| d.set(d.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    CATCH_DEPTH.with(|d| d.set(d.get() - 1));

    result.map_err(|payload| {
        let capture = LAST_PANIC.with(|slot| slot.borrow_mut().take());
        panic_report(payload.as_ref(), capture)
    })
}

fn panic_report(payload: &(dyn Any + Send), capture: Option<PanicCapture>) -> FailureReport {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    };

    let mut report = FailureReport::new(PANIC_KIND, message);
    if let Some(capture) = capture {
        report.frames = backtrace_frames(&capture.backtrace);
        report.location = capture.location;
    }
    report
}

// ============================================================================
// Backtrace parsing
// ============================================================================

/// Turn a captured backtrace into frame descriptions, outermost call first,
/// without engine and runtime frames.
fn backtrace_frames(backtrace: &Backtrace) -> Vec<String> {
    if backtrace.status() != BacktraceStatus::Captured {
        return Vec::new();
    }
    visible_frames(&backtrace.to_string())
}

fn visible_frames(text: &str) -> Vec<String> {
    let mut frames = parse_backtrace(text);
    frames.retain(|f| !is_hidden_frame(f));
    frames.reverse();
    frames
}

/// Parse the `Display` form of a backtrace: numbered symbol lines, each
/// optionally followed by an `at path:line:col` line. Inlined calls are listed
/// under the same number without an index and become frames of their own.
fn parse_backtrace(text: &str) -> Vec<String> {
    let mut frames: Vec<String> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(at) = trimmed.strip_prefix("at ") {
            if let Some(last) = frames.last_mut() {
                if !last.contains(" at ") {
                    last.push_str(" at ");
                    last.push_str(at);
                }
            }
            continue;
        }
        match trimmed.split_once(": ") {
            Some((index, symbol)) if !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()) => {
                frames.push(symbol.trim().to_string());
            }
            _ if !frames.is_empty() => frames.push(trimmed.to_string()),
            _ => {}
        }
    }
    frames
}

fn frame_symbol(frame: &str) -> &str {
    frame.split_once(" at ").map_or(frame, |(symbol, _)| symbol)
}

fn is_hidden_frame(frame: &str) -> bool {
    let symbol = frame_symbol(frame);
    if HIDDEN_FRAME_SYMBOLS.contains(&symbol)
        || HIDDEN_FRAME_PREFIXES.iter().any(|p| symbol.starts_with(p))
        || is_runtime_impl(symbol)
    {
        return true;
    }
    frame_location(frame).is_some_and(|loc| is_runtime_path(&loc.file))
}

/// `<std::..>::f`, `<T as core::..>::f` and the like. A bare implementing
/// type (a generic parameter or a primitive) counts as the trait's crate.
fn is_runtime_impl(symbol: &str) -> bool {
    let Some(qualified) = symbol.strip_prefix('<') else {
        return false;
    };
    if RUNTIME_CRATES.iter().any(|c| qualified.starts_with(c)) {
        return true;
    }
    match qualified.split_once(" as ") {
        Some((ty, tr)) => !ty.contains("::") && RUNTIME_CRATES.iter().any(|c| tr.starts_with(c)),
        None => false,
    }
}

fn is_runtime_path(file: &str) -> bool {
    let file = file.replace('\\', "/");
    RUNTIME_PATHS.iter().any(|p| file.contains(p))
}

fn frame_location(frame: &str) -> Option<Location> {
    frame
        .rsplit_once(" at ")
        .and_then(|(_, loc)| Location::parse(loc))
}

/// Location of the innermost frame that has one. `frames` is outermost first
/// and already filtered.
fn innermost_location(frames: &[String]) -> Option<Location> {
    frames.iter().rev().find_map(|f| frame_location(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_terminal() -> Terminal<Vec<u8>, &'static [u8]> {
        Terminal::new(Vec::new(), &b"\n"[..])
    }

    fn written(term: Terminal<Vec<u8>, &'static [u8]>) -> String {
        String::from_utf8(term.into_parts().0).unwrap()
    }

    #[test]
    fn test_summary_with_and_without_location() {
        let report = FailureReport::new("ValueError", "bad input");
        assert_eq!(report.summary(), "ValueError: bad input");

        let report = report.with_location(Location {
            file: "src/main.rs".to_string(),
            line: 12,
            column: 5,
        });
        assert_eq!(report.summary(), "ValueError: bad input; Line: 12");
    }

    #[test]
    fn test_from_error_collects_causes() {
        let err = anyhow::anyhow!("truncated file").context("unexpected end of header");
        let report = FailureReport::from_error("ParseError", &err);
        assert_eq!(report.kind(), "ParseError");
        assert_eq!(report.message(), "unexpected end of header");
        assert_eq!(report.causes(), ["truncated file".to_string()]);
    }

    #[test]
    fn test_report_prints_trace_and_waits() {
        let report = FailureReport::new("BaseException", "Test Exception")
            .with_frames(vec!["demo::level1".to_string(), "demo::level2".to_string()]);
        let mut term = buffer_terminal();
        FailureReporter::new(ColorMode::Never).report(&mut term, Some(&report));
        assert_eq!(
            written(term),
            "Traceback (most recent call last):\n  demo::level1\n  demo::level2\n\
             BaseException: Test Exception\n\nPress <Enter> to continue\n"
        );
    }

    #[test]
    fn test_report_final_line_is_red_bold() {
        let report = FailureReport::new("BaseException", "Test Exception");
        let mut term = buffer_terminal();
        FailureReporter::new(ColorMode::Always).report(&mut term, Some(&report));
        let expected = render(
            "BaseException: Test Exception",
            Some(Color::Red),
            StyleFlags::BOLD,
            ColorMode::Always,
        );
        let out = written(term);
        assert!(out.lines().any(|l| l == expected), "{out:?}");
        assert!(out.ends_with("Press <Enter> to continue\n"));
    }

    #[test]
    fn test_report_prints_causes() {
        let report = FailureReport::new("IoError", "copy failed").with_causes(vec!["disk full".into()]);
        let mut term = buffer_terminal();
        FailureReporter::new(ColorMode::Never)
            .with_acknowledge(false)
            .report(&mut term, Some(&report));
        assert_eq!(
            written(term),
            "Traceback (most recent call last):\nIoError: copy failed\nCaused by:\n  disk full\n"
        );
    }

    #[test]
    fn test_report_none_is_a_no_op_trace() {
        let mut term = buffer_terminal();
        FailureReporter::new(ColorMode::Always).report(&mut term, None);
        assert_eq!(written(term), "\nPress <Enter> to continue\n");
    }

    #[test]
    fn test_report_without_acknowledge_does_not_prompt() {
        let mut term = buffer_terminal();
        FailureReporter::new(ColorMode::Never)
            .with_acknowledge(false)
            .report(&mut term, Some(&FailureReport::new("E", "m")));
        assert!(!written(term).contains("Press <Enter>"));
    }

    #[test]
    fn test_catch_panic_records_message_and_location() {
        let err = catch_panic(|| -> u32 { panic!("boom {}", 7) }).unwrap_err();
        assert_eq!(err.kind(), PANIC_KIND);
        assert_eq!(err.message(), "boom 7");
        let loc = err.location().expect("panic location");
        assert!(loc.file.ends_with("failure.rs"));
    }

    #[test]
    fn test_catch_panic_passes_values_through() {
        assert_eq!(catch_panic(|| 41 + 1).unwrap(), 42);
    }

    #[test]
    fn test_catch_panic_traces_frames_without_env() {
        let report = catch_panic(|| -> u32 { panic!("traced") }).unwrap_err();
        if Backtrace::force_capture().status() != BacktraceStatus::Captured {
            return;
        }
        let frames = report.frames();
        assert!(
            frames.iter().any(|f| f.contains("test_catch_panic_traces_frames_without_env")),
            "{frames:#?}"
        );
        assert!(frames.iter().all(|f| !f.contains("/rustc/")), "{frames:#?}");
        assert!(frames.iter().all(|f| !f.starts_with("std::")), "{frames:#?}");
    }

    #[test]
    fn test_from_error_without_backtrace_claims_no_location() {
        let err = anyhow::Error::new(std::fmt::Error);
        let report = FailureReport::from_error_traced("Error", &err, false);
        assert_eq!(report.location(), None);
        assert!(!report.summary().contains("Line:"));
    }

    #[test]
    fn test_visible_frames_hide_runtime_and_harness() {
        let text = "   0: <T as core::convert::Into<U>>::into\n\
                    \x20            at /rustc/90b35a6/library/core/src/convert/mod.rs:778:5\n\
                    \x20  1: demo::parse_count\n\
                    \x20            at ./src/parse.rs:14:17\n\
                    \x20     demo::load\n\
                    \x20            at ./src/lib.rs:8:5\n\
                    \x20  2: anyhow::error::<impl anyhow::Error>::msg\n\
                    \x20            at /home/u/.cargo/registry/src/index/anyhow-1.0.86/src/error.rs:83:36\n\
                    \x20  3: <core::panic::unwind_safe::AssertUnwindSafe<F> as core::ops::function::FnOnce<()>>::call_once\n\
                    \x20  4: <alloc::boxed::Box<F,A> as core::ops::function::FnOnce<Args>>::call_once\n\
                    \x20  5: <&mut F as core::ops::function::FnOnce<A>>::call_once\n\
                    \x20  6: tkit_core::instrument::attempt\n\
                    \x20  7: demo::main\n\
                    \x20            at ./src/main.rs:3:5\n\
                    \x20  8: test::run_test_in_process\n\
                    \x20  9: std::sys::pal::unix::thread::Thread::new::thread_start\n\
                    \x20 10: thread_start\n\
                    \x20 11: <unknown>\n\
                    \x20 12: <demo::Header as core::str::FromStr>::from_str\n\
                    \x20            at ./src/header.rs:40:9\n";
        let frames = visible_frames(text);
        assert_eq!(
            frames,
            vec![
                "<demo::Header as core::str::FromStr>::from_str at ./src/header.rs:40:9".to_string(),
                "demo::main at ./src/main.rs:3:5".to_string(),
                "demo::load at ./src/lib.rs:8:5".to_string(),
                "demo::parse_count at ./src/parse.rs:14:17".to_string(),
            ]
        );
        assert_eq!(
            innermost_location(&frames),
            Some(Location {
                file: "./src/parse.rs".to_string(),
                line: 14,
                column: 17
            })
        );
    }

    #[test]
    fn test_runtime_paths_and_impls() {
        assert!(is_runtime_path("/rustc/abc/library/core/src/convert/mod.rs"));
        assert!(is_runtime_path("C:\\Users\\u\\.cargo\\registry\\src\\anyhow\\src\\error.rs"));
        assert!(!is_runtime_path("./src/main.rs"));
        assert!(is_runtime_impl("<i32 as core::str::FromStr>::from_str"));
        assert!(is_runtime_impl("<std::io::Stdout as std::io::Write>::flush"));
        assert!(!is_runtime_impl("<demo::Header as core::fmt::Display>::fmt"));
        assert!(!is_runtime_impl("demo::main"));
    }

    #[test]
    fn test_parse_backtrace() {
        let text = "   0: std::backtrace::Backtrace::capture\n\
                    \x20            at /rustc/library/std/src/backtrace.rs:296:9\n\
                    \x20  1: demo::parse_header\n\
                    \x20            at ./src/main.rs:30:9\n\
                    \x20  2: demo::main\n";
        let frames = parse_backtrace(text);
        assert_eq!(
            frames,
            vec![
                "std::backtrace::Backtrace::capture at /rustc/library/std/src/backtrace.rs:296:9"
                    .to_string(),
                "demo::parse_header at ./src/main.rs:30:9".to_string(),
                "demo::main".to_string(),
            ]
        );
        assert!(is_hidden_frame(&frames[0]));
        assert!(!is_hidden_frame(&frames[1]));
        assert_eq!(
            frame_location(&frames[1]),
            Some(Location {
                file: "./src/main.rs".to_string(),
                line: 30,
                column: 9
            })
        );
        assert_eq!(frame_location(&frames[2]), None);
    }
}
