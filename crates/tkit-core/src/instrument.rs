//! Instrumentation of units of work.
//!
//! [`instrument`] pairs a unit of work with a renderer. Running the result
//! announces the work's label, runs it through [`attempt`], and reports the
//! outcome: a success suffix, or a failure suffix followed by a full
//! [`FailureReport`] and an acknowledgment prompt.
//!
//! ```no_run
//! use tkit_core::{describe, instrument, ColorMode, StatusRenderer};
//!
//! fn copy_tiles() -> anyhow::Result<usize> {
//!     Ok(12)
//! }
//!
//! let mut status = StatusRenderer::stdio(ColorMode::Auto);
//! let copied = instrument(&describe!(copy_tiles, "Msg:\n  Copying tiles..."), copy_tiles, &mut status).run();
//! assert_eq!(copied, Some(12));
//! ```
//!
//! Failures are reported and swallowed: `run` returns `None`. Callers that
//! need to act on the failure use [`Instrumented::run_outcome`].

use std::io::{Read, Write};

use crate::color::ColorMode;
use crate::failure::{catch_panic, FailureReport, FailureReporter};
use crate::label::WorkDescriptor;
use crate::prefix::PrefixRenderer;
use crate::status::StatusRenderer;

/// Result of [`attempt`]: the work's value, or a report of what went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Failure(FailureReport),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The value on success, `None` on failure.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T, FailureReport> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(report) => Err(report),
        }
    }

    pub fn failure(&self) -> Option<&FailureReport> {
        match self {
            Self::Success(_) => None,
            Self::Failure(report) => Some(report),
        }
    }
}

/// Run `work`, converting both an `Err` and a panic into
/// [`Outcome::Failure`].
///
/// The report's kind is the short name of the error type (`ParseIntError`
/// for `std::num::ParseIntError`), or `panic`. For `anyhow::Error` it is taken
/// from the root cause instead; see [`error_kind`].
///
/// Only an `anyhow::Error` can carry a backtrace from where it was raised, so
/// only such errors get a location. Other errors are reported with the frames
/// active when the failure came back out of `work`.
pub fn attempt<T, E, F>(work: F) -> Outcome<T>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<anyhow::Error>,
{
    match catch_panic(work) {
        Ok(Ok(value)) => Outcome::Success(value),
        Ok(Err(err)) => {
            let traced_at_origin = is_anyhow::<E>();
            let err: anyhow::Error = err.into();
            let kind = error_kind::<E>(&err);
            Outcome::Failure(FailureReport::from_error_traced(kind, &err, traced_at_origin))
        }
        Err(report) => Outcome::Failure(report),
    }
}

fn is_anyhow<E>() -> bool {
    std::any::type_name::<E>() == std::any::type_name::<anyhow::Error>()
}

/// Kind of a failed work's error.
///
/// `anyhow::Error` hides the concrete type, so the kind is read from the
/// leading identifier of the root cause's `Debug` form (`ParseIntError { .. }`
/// gives `ParseIntError`). Root causes without one, such as the message
/// errors of `anyhow!` and `bail!`, fall back to `Error`.
fn error_kind<E>(err: &anyhow::Error) -> String {
    if !is_anyhow::<E>() {
        return short_type_name::<E>().to_string();
    }
    let root = err.root_cause();
    if root.is::<std::io::Error>() {
        return short_type_name::<std::io::Error>().to_string();
    }
    let debug = format!("{:?}", root);
    let ident: String = debug
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if ident.starts_with(|c: char| c.is_ascii_uppercase()) {
        ident
    } else {
        short_type_name::<E>().to_string()
    }
}

fn short_type_name<E>() -> &'static str {
    let full = std::any::type_name::<E>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// A renderer that can announce work and report its outcome.
pub trait Reporter {
    /// Announce the start of a unit of work.
    fn begin(&mut self, label: &str);

    fn succeed(&mut self);

    fn fail(&mut self);

    /// Print `report` through `failure` on this renderer's stream.
    fn report_failure(&mut self, failure: &FailureReporter, report: Option<&FailureReport>);

    fn color_mode(&self) -> ColorMode;
}

impl<W: Write, R: Read> Reporter for StatusRenderer<W, R> {
    fn begin(&mut self, label: &str) {
        StatusRenderer::begin(self, label);
    }

    fn succeed(&mut self) {
        self.success();
    }

    fn fail(&mut self) {
        self.failure();
    }

    fn report_failure(&mut self, failure: &FailureReporter, report: Option<&FailureReport>) {
        failure.report(self.terminal_mut(), report);
    }

    fn color_mode(&self) -> ColorMode {
        StatusRenderer::color_mode(self)
    }
}

impl<W: Write, R: Read> Reporter for PrefixRenderer<W, R> {
    fn begin(&mut self, label: &str) {
        self.write(label);
    }

    fn succeed(&mut self) {
        self.ok(None);
    }

    fn fail(&mut self) {
        PrefixRenderer::fail(self, None);
    }

    fn report_failure(&mut self, failure: &FailureReporter, report: Option<&FailureReport>) {
        failure.report(self.terminal_mut(), report);
    }

    fn color_mode(&self) -> ColorMode {
        PrefixRenderer::color_mode(self)
    }
}

/// A unit of work bound to the renderer that reports on it.
pub struct Instrumented<'r, F, Rep: ?Sized> {
    label: String,
    work: F,
    reporter: &'r mut Rep,
    failure: FailureReporter,
}

/// Wrap `work` so each run is announced and its outcome reported on
/// `reporter`.
///
/// The label is resolved from `descriptor` here, once. Failures are printed
/// with a [`FailureReporter`] using the renderer's color mode; replace it with
/// [`Instrumented::with_failure_reporter`].
pub fn instrument<'r, F, Rep>(
    descriptor: &WorkDescriptor,
    work: F,
    reporter: &'r mut Rep,
) -> Instrumented<'r, F, Rep>
where
    Rep: Reporter + ?Sized,
{
    let failure = FailureReporter::new(reporter.color_mode());
    Instrumented {
        label: descriptor.label(),
        work,
        reporter,
        failure,
    }
}

impl<'r, F, Rep: Reporter + ?Sized> Instrumented<'r, F, Rep> {
    pub fn with_failure_reporter(mut self, failure: FailureReporter) -> Self {
        self.failure = failure;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run the work, reporting its outcome. Returns `None` on failure.
    pub fn run<T, E>(&mut self) -> Option<T>
    where
        F: FnMut() -> Result<T, E>,
        E: Into<anyhow::Error>,
    {
        self.run_outcome().into_option()
    }

    /// Run the work, reporting its outcome, and hand back the full outcome.
    pub fn run_outcome<T, E>(&mut self) -> Outcome<T>
    where
        F: FnMut() -> Result<T, E>,
        E: Into<anyhow::Error>,
    {
        self.reporter.begin(&self.label);
        let outcome = attempt(&mut self.work);
        self.settle(&outcome);
        outcome
    }

    /// [`Self::run`] for work that takes arguments; pass several as a tuple.
    pub fn run_with<A, T, E>(&mut self, args: A) -> Option<T>
    where
        F: FnMut(A) -> Result<T, E>,
        E: Into<anyhow::Error>,
    {
        self.run_outcome_with(args).into_option()
    }

    pub fn run_outcome_with<A, T, E>(&mut self, args: A) -> Outcome<T>
    where
        F: FnMut(A) -> Result<T, E>,
        E: Into<anyhow::Error>,
    {
        self.reporter.begin(&self.label);
        let work = &mut self.work;
        let outcome = attempt(move || work(args));
        self.settle(&outcome);
        outcome
    }

    fn settle<T>(&mut self, outcome: &Outcome<T>) {
        match outcome {
            Outcome::Success(_) => {
                tracing::debug!(label = %self.label, "Work succeeded");
                self.reporter.succeed();
            }
            Outcome::Failure(report) => {
                tracing::debug!(label = %self.label, kind = report.kind(), "Work failed");
                self.reporter.fail();
                self.reporter.report_failure(&self.failure, Some(report));
            }
        }
    }
}

/// A started unit of work that reports failure unless finished.
///
/// Dropping the guard without calling [`Step::finish`] (an early return via
/// `?`, or a panic unwinding through the scope) prints the failure outcome.
/// When the failure is known, [`Step::fail_with`] prints the full report too.
pub struct Step<'r, Rep: Reporter + ?Sized> {
    reporter: &'r mut Rep,
    settled: bool,
}

impl<'r, Rep: Reporter + ?Sized> Step<'r, Rep> {
    /// Announce `label` and return the guard.
    pub fn start(reporter: &'r mut Rep, label: &str) -> Self {
        reporter.begin(label);
        Self {
            reporter,
            settled: false,
        }
    }

    /// Report success.
    pub fn finish(mut self) {
        self.settled = true;
        self.reporter.succeed();
    }

    /// Report failure explicitly.
    pub fn abort(mut self) {
        self.settled = true;
        self.reporter.fail();
    }

    /// Report failure and print `report` through `failure`, including its
    /// acknowledgment prompt.
    pub fn fail_with(mut self, failure: &FailureReporter, report: &FailureReport) {
        self.settled = true;
        self.reporter.fail();
        self.reporter.report_failure(failure, Some(report));
    }
}

impl<Rep: Reporter + ?Sized> Drop for Step<'_, Rep> {
    fn drop(&mut self) {
        if !self.settled {
            self.reporter.fail();
        }
    }
}
