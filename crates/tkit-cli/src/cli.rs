//! CLI definition and command dispatch for tkit.
//!
//! This module defines the command-line interface using `clap` and provides
//! the `run()` function that dispatches commands to the tkit-core renderers.
//!
//! ## Configuration Precedence
//!
//! Configuration is resolved with the following precedence (highest to lowest):
//! 1. CLI flags (e.g., `--config`, `--color`, `--no-wait`)
//! 2. Environment variables (`TKIT_CONFIG`, `TKIT_COLOR`, `TKIT_VERBOSE`)
//! 3. Config file (`~/.tkit/config.yaml` or path from `--config`/`TKIT_CONFIG`)
//! 4. Built-in defaults

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{self, ExitCode, ExitStatus, Output, Stdio};
use std::str::FromStr;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;

use crate::ui::{MessageType, Style};

use tkit_core::{
    describe, instrument, list_color_names, show_colors, Color, ColorMode, FailureReporter,
    Outcome, PrefixRenderer, Reporter, StatusRenderer, Step, TkitConfig, TkitError,
    WorkDescriptor,
};

// ============================================================================
// CLI Definition
// ============================================================================

/// Version string including git commit hash
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// Exit code used when the child command could not be started.
const SPAWN_FAILURE_CODE: u8 = 127;

/// tkit – console status reporting for scripts and long-running work
#[derive(Parser, Debug)]
#[command(name = "tkit")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, env = "TKIT_VERBOSE")]
    pub verbose: bool,

    /// Path to configuration file (default: ~/.tkit/config.yaml)
    #[arg(long, global = true, env = "TKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Color output mode: always, never, or auto (default: from config, else auto)
    #[arg(long, global = true, env = "TKIT_COLOR")]
    pub color: Option<String>,

    /// Do not wait for <Enter> after printing a failure report
    #[arg(long, global = true)]
    pub no_wait: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the known color names, each printed in its color
    #[command(after_help = r#"EXAMPLES:
    # Show every color
    tkit colors

    # Machine-readable list
    tkit colors --json
"#)]
    Colors {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print a single tagged message ([ INFO ], [ WARN ], [  OK  ], [ FAIL ])
    #[command(after_help = r#"EXAMPLES:
    # Informational line
    tkit msg info "Using cached tiles"

    # Outcome lines from a shell script
    make build && tkit msg ok "Build finished" || tkit msg fail "Build broke"
"#)]
    Msg {
        /// Kind of message
        #[arg(value_enum)]
        kind: MsgKind,

        /// Message text
        text: String,
    },

    /// Run a command, reporting its outcome on a status line
    #[command(after_help = r#"EXAMPLES:
    # Aligned status line labelled with the program name
    tkit run -- make test

    # Custom label and boot-style tags
    tkit run --label "Syncing assets" --style prefix -- rsync -a assets/ out/

    # Never block on failure (CI)
    tkit --no-wait run -- ./deploy.sh

The exit code of tkit is the exit code of the command.
"#)]
    Run {
        /// Label to print instead of the program name
        #[arg(long)]
        label: Option<String>,

        /// Renderer used for the outcome line
        #[arg(long, value_enum, default_value = "status")]
        style: RunStyle,

        /// Column at which the outcome suffix starts (status style only)
        #[arg(long)]
        column_width: Option<usize>,

        /// Command and arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Show every kind of output the renderers produce
    #[command(after_help = r#"EXAMPLES:
    # Full tour, including a failure report (press Enter at the prompt)
    tkit demo

    # Without the prompt
    tkit --no-wait demo
"#)]
    Demo,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings
    #[command(after_help = r#"EXAMPLES:
    # Validate ~/.tkit/config.yaml
    tkit config check

    # Validate another file
    tkit --config ./ci-tkit.yaml config check
"#)]
    Check,

    /// Show the resolved configuration
    #[command(after_help = r#"EXAMPLES:
    # Show resolved config
    tkit config show

    # Output as JSON
    tkit config show --json
"#)]
    Show {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MsgKind {
    Info,
    Warn,
    Ok,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunStyle {
    /// `label ....... [DONE]`
    Status,
    /// `[  OK  ]  label`
    Prefix,
}

// ============================================================================
// Entry point
// ============================================================================

/// Parse arguments, set up logging and configuration, and dispatch.
///
/// Configuration precedence:
/// 1. CLI flags (`--config`, `--color`, `--no-wait`)
/// 2. Environment variables (`TKIT_CONFIG`, `TKIT_COLOR`, `TKIT_VERBOSE`)
/// 3. Config file (`~/.tkit/config.yaml` or custom path)
/// 4. Built-in defaults
///
/// # Returns
///
/// `ExitCode::SUCCESS` on success, the child's exit code for `tkit run`, or
/// `ExitCode::FAILURE` on error.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Always show warnings (config issues); debug only with --verbose.
    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = format!("tkit_core={},tkit={}", log_level, log_level);

    tracing_subscriber::fmt()
        .with_env_filter(&filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // `config check` reports problems itself, so it reads without validating.
    if let Command::Config {
        action: ConfigAction::Check,
    } = &cli.command
    {
        let style = Style::new(flag_color_mode(&cli).unwrap_or_default());
        return handle_config_check(&style, cli.config.as_deref());
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            let style = Style::new(flag_color_mode(&cli).unwrap_or_default());
            let hint = match &cli.config {
                Some(path) => format!("Check your config at {}", path.display()),
                None => "Check your config at ~/.tkit/config.yaml".to_string(),
            };
            eprintln!(
                "{}",
                style.error_with_context("Failed to load configuration", Some(&e.to_string()), Some(&hint))
            );
            return ExitCode::FAILURE;
        }
    };

    let color_mode = match flag_color_mode(&cli) {
        Some(mode) => mode,
        None if cli.color.is_some() => {
            let style = Style::new(config.color);
            let value = cli.color.as_deref().unwrap_or_default();
            eprintln!(
                "{}",
                style.error_with_context(
                    &format!("Invalid color mode '{}'", value),
                    None,
                    Some("Valid options: always, never, auto"),
                )
            );
            return ExitCode::FAILURE;
        }
        None => config.color,
    };
    let style = Style::new(color_mode);
    let session = Session {
        color_mode,
        config,
        wait_for_ack: !cli.no_wait,
    };
    tracing::debug!(color = %color_mode, wait_for_ack = session.acknowledge(), "Session ready");

    let result = match cli.command {
        Command::Colors { json } => handle_colors(&session, json),
        Command::Msg { kind, text } => handle_msg(&session, kind, &text),
        Command::Run {
            label,
            style: run_style,
            column_width,
            command,
        } => return handle_run(&session, label, run_style, column_width, &command),
        Command::Demo => handle_demo(&session),
        Command::Config { action } => match action {
            ConfigAction::Show { json } => handle_config_show(&style, &session.config, color_mode, json),
            // Answered before configuration was loaded.
            ConfigAction::Check => Ok(()),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style.message(MessageType::Err, &format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

/// Settings shared by every command once configuration is resolved.
struct Session {
    color_mode: ColorMode,
    config: TkitConfig,
    wait_for_ack: bool,
}

impl Session {
    fn acknowledge(&self) -> bool {
        self.wait_for_ack && self.config.failure.wait_for_ack
    }

    fn failure_reporter(&self) -> FailureReporter {
        FailureReporter::from_config(self.color_mode, &self.config.failure)
            .with_acknowledge(self.acknowledge())
    }

    fn status_renderer(&self) -> Result<StatusRenderer, TkitError> {
        StatusRenderer::from_config(tkit_core::Terminal::stdio(), self.color_mode, &self.config.status)
    }

    fn prefix_renderer(&self) -> PrefixRenderer {
        PrefixRenderer::from_config(tkit_core::Terminal::stdio(), self.color_mode, &self.config.prefix)
    }
}

/// The `--color` value, if given and valid.
fn flag_color_mode(cli: &Cli) -> Option<ColorMode> {
    cli.color.as_deref().and_then(|value| ColorMode::from_str(value).ok())
}

fn load_config(cli: &Cli) -> Result<TkitConfig, TkitError> {
    match &cli.config {
        Some(path) => TkitConfig::from_path(path),
        None => TkitConfig::load_default(),
    }
}

// ============================================================================
// Command handlers
// ============================================================================

#[derive(Debug, Serialize)]
struct ColorList {
    colors: Vec<&'static str>,
}

fn handle_colors(session: &Session, json: bool) -> anyhow::Result<()> {
    if json {
        let list = ColorList {
            colors: list_color_names(),
        };
        println!("{}", serde_json::to_string_pretty(&list)?);
    } else {
        println!("{}", show_colors(session.color_mode));
    }
    Ok(())
}

fn handle_msg(session: &Session, kind: MsgKind, text: &str) -> anyhow::Result<()> {
    let mut nix = session.prefix_renderer();
    match kind {
        MsgKind::Info => nix.info(text),
        MsgKind::Warn => nix.warn(text),
        MsgKind::Ok => nix.ok(Some(text)),
        MsgKind::Fail => nix.fail(Some(text)),
    }
    Ok(())
}

/// Failure of the command run by `tkit run`.
#[derive(Debug, Error)]
enum ChildError {
    #[error("failed to start `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}")]
    Exit { program: String, status: ExitStatus },
}

fn handle_run(
    session: &Session,
    label: Option<String>,
    run_style: RunStyle,
    column_width: Option<usize>,
    command: &[String],
) -> ExitCode {
    let style = Style::new(session.color_mode);
    let Some((program, args)) = command.split_first() else {
        eprintln!("{}", style.message(MessageType::Err, "No command given"));
        return ExitCode::FAILURE;
    };
    let descriptor = WorkDescriptor::new(label.unwrap_or_else(|| program.clone()));

    let (outcome, output) = match run_style {
        RunStyle::Status => {
            let mut status = match session.status_renderer() {
                Ok(status) => status,
                Err(e) => {
                    eprintln!("{}", style.message(MessageType::Err, &e.to_string()));
                    return ExitCode::FAILURE;
                }
            };
            if let Some(width) = column_width {
                status.set_column_width(width);
            }
            run_child(&mut status, session, &descriptor, program, args)
        }
        RunStyle::Prefix => {
            let mut nix = session.prefix_renderer();
            run_child(&mut nix, session, &descriptor, program, args)
        }
    };

    // Child output is held back so the status line stays intact.
    let Some(output) = output else {
        tracing::debug!(failed = outcome.failure().is_some(), "Command did not start");
        return ExitCode::from(SPAWN_FAILURE_CODE);
    };
    forward_child_output(&output, &mut std::io::stdout(), &mut std::io::stderr());

    ExitCode::from(exit_code_of(output.status))
}

/// Run `program` under `reporter`, capturing its output.
///
/// The output is `None` when the program could not be started.
fn run_child<Rep: Reporter>(
    reporter: &mut Rep,
    session: &Session,
    descriptor: &WorkDescriptor,
    program: &str,
    args: &[String],
) -> (Outcome<()>, Option<Output>) {
    let mut captured = None;
    let outcome = {
        let child = || -> Result<(), ChildError> {
            tracing::debug!(program, ?args, "Starting command");
            let output = process::Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .output()
                .map_err(|source| ChildError::Spawn {
                    program: program.to_string(),
                    source,
                })?;
            let status = output.status;
            captured = Some(output);
            if status.success() {
                Ok(())
            } else {
                Err(ChildError::Exit {
                    program: program.to_string(),
                    status,
                })
            }
        };
        instrument(descriptor, child, reporter)
            .with_failure_reporter(session.failure_reporter())
            .run_outcome()
    };
    (outcome, captured)
}

fn forward_child_output(output: &Output, stdout: &mut impl Write, stderr: &mut impl Write) {
    if let Err(e) = stdout.write_all(&output.stdout).and_then(|()| stdout.flush()) {
        tracing::trace!("Child stdout dropped: {}", e);
    }
    if let Err(e) = stderr.write_all(&output.stderr) {
        tracing::trace!("Child stderr dropped: {}", e);
    }
}

/// Exit code for `tkit` mirroring the child's; termination by signal maps to 1.
fn exit_code_of(status: ExitStatus) -> u8 {
    status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(1)
}

#[derive(Debug, Error)]
#[error("the parcel file ended before its header was complete")]
struct TruncatedHeader;

fn handle_demo(session: &Session) -> anyhow::Result<()> {
    let mut status = session.status_renderer()?;

    status.begin("Run important task");
    status.success();
    status.begin("Refresh tile cache");
    status.failure();

    status
        .set_failure_style_named("WRONG!", "yellow")
        .context("Failed to apply demo failure style")?;
    status.begin("Will fail");
    status.failure();
    status.custom("COMPLETE", Some(Color::Cyan), false);
    println!();

    let mut nix = session.prefix_renderer();
    nix.write("Doing important task");
    nix.ok(None);
    nix.write("Dang it");
    nix.fail(None);
    nix.info("Useless information");
    nix.warn("A hopeless warning");
    println!();

    let mut status = session.status_renderer()?;

    fn do_stuff() -> anyhow::Result<u32> {
        Ok(42)
    }
    let answer = instrument(
        &describe!(do_stuff, "Counts the parcels.\n\nMsg:\n    Doing stuff"),
        do_stuff,
        &mut status,
    )
    .run();
    tracing::debug!(?answer, "Demo work returned");

    {
        let step = Step::start(&mut status, "Scoped step");
        step.finish();
    }

    fn read_header() -> Result<(), TruncatedHeader> {
        Err(TruncatedHeader)
    }
    instrument(&describe!(read_header), read_header, &mut status)
        .with_failure_reporter(session.failure_reporter())
        .run();

    Ok(())
}

// ============================================================================
// Config handlers
// ============================================================================

fn handle_config_check(style: &Style, config_path: Option<&Path>) -> ExitCode {
    let path = match config_path.map(Path::to_path_buf).or_else(TkitConfig::default_path) {
        Some(path) => path,
        None => {
            eprintln!(
                "{}",
                style.error_with_context(
                    "Could not determine the config location",
                    None,
                    Some("Pass --config <PATH> or set TKIT_CONFIG"),
                )
            );
            return ExitCode::FAILURE;
        }
    };

    if !path.exists() {
        println!(
            "{}",
            style.message(
                MessageType::Info,
                &format!("No config at {}; built-in defaults apply", path.display())
            )
        );
        return ExitCode::SUCCESS;
    }

    let result = TkitConfig::read_path(&path).and_then(|config| config.validate());
    match result {
        Ok(warnings) if warnings.is_empty() => {
            println!(
                "{}",
                style.message(MessageType::Ok, &format!("Configuration is valid ({})", path.display()))
            );
            ExitCode::SUCCESS
        }
        Ok(warnings) => {
            println!(
                "{}",
                style.message(MessageType::Warn, &format!("{} warning(s):", warnings.len()))
            );
            for warning in &warnings {
                println!("  • {}", warning);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!(
                "{}",
                style.error_with_context(
                    &format!("Configuration is invalid ({})", path.display()),
                    Some(&e.to_string()),
                    None,
                )
            );
            println!(
                "{}",
                style.message(
                    MessageType::Hint,
                    "Fix the file, or remove it to fall back to the built-in defaults"
                )
            );
            ExitCode::FAILURE
        }
    }
}

fn handle_config_show(
    style: &Style,
    config: &TkitConfig,
    color_mode: ColorMode,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    let status = &config.status;
    let color_name = |color: &Option<String>| color.clone().unwrap_or_else(|| "none".to_string());

    println!("{}", style.section("CONFIG"));
    println!();
    println!("  {}", style.key_value("Color", &color_mode.to_string()));
    println!("  {}", style.key_value("Column width", &status.column_width.to_string()));
    println!("  {}", style.key_value("Fill char", &format!("{:?}", status.fill_char)));
    println!(
        "  {}",
        style.key_value(
            "Success",
            &format!("{} ({})", status.success.text, color_name(&status.success.color))
        )
    );
    println!(
        "  {}",
        style.key_value(
            "Failure",
            &format!("{} ({})", status.failure.text, color_name(&status.failure.color))
        )
    );
    println!("  {}", style.key_value("Indent width", &config.prefix.indent_width.to_string()));
    println!(
        "  {}",
        style.key_value(
            "Wait for ack",
            if config.failure.wait_for_ack { "yes" } else { "no" }
        )
    );
    Ok(())
}
