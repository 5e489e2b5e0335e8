//! Logging setup for gitshield
//!
//! All modules log through `tracing`. Two subscriber backends are
//! available:
//!
//! - `Console`: human-readable lines on stderr, filtered by `RUST_LOG`
//! - `Github`: GitHub Actions workflow commands (`::warning::` etc.) on stdout
//!
//! Events logged with `target: "notice"` become `::notice::` annotations in
//! GitHub mode and plain info lines on the console.

use std::fmt;
use std::sync::OnceLock;

use clap::ValueEnum;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Target used for operator-facing notices
pub const NOTICE_TARGET: &str = "notice";

static ACTIVE_FORMAT: OnceLock<LogFormat> = OnceLock::new();

/// Logging backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Plain console output
    Console,
    /// GitHub Actions workflow commands
    Github,
}

impl LogFormat {
    /// Pick GitHub mode when running inside GitHub Actions
    pub fn detect() -> Self {
        match std::env::var("GITHUB_ACTIONS") {
            Ok(value) if value == "true" => Self::Github,
            _ => Self::Console,
        }
    }
}

/// Install the global subscriber
///
/// Calling this more than once keeps the first subscriber.
pub fn init(format: LogFormat) {
    let _ = ACTIVE_FORMAT.set(format);

    let result = match format {
        LogFormat::Console => tracing_subscriber::fmt()
            .with_env_filter(env_filter(default_directives(format)))
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init(),
        LogFormat::Github => tracing_subscriber::fmt()
            .with_env_filter(env_filter(default_directives(format)))
            .event_format(GithubActionsFormat)
            .with_writer(std::io::stdout)
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
}

/// Filter used when `RUST_LOG` is unset
///
/// GitHub mode shows this crate's debug output (the runner hides it unless
/// step debugging is on) but keeps dependencies at info.
fn default_directives(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Console => "info",
        LogFormat::Github => "gitshield=debug,info",
    }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Ask the log sink to hide a secret value from all further output
pub fn mask_secret(secret: &str) {
    if secret.is_empty() {
        return;
    }
    match ACTIVE_FORMAT.get() {
        Some(LogFormat::Github) => println!("::add-mask::{}", escape_command_data(secret)),
        _ => tracing::debug!("Secret registered (length: {})", secret.len()),
    }
}

/// Event formatter emitting GitHub Actions workflow commands
pub struct GithubActionsFormat;

impl<S, N> FormatEvent<S, N> for GithubActionsFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let prefix = command_prefix(*metadata.level(), metadata.target());

        let mut message = String::new();
        ctx.field_format()
            .format_fields(Writer::new(&mut message), event)?;

        if prefix.is_empty() {
            writeln!(writer, "{}", message)
        } else {
            writeln!(writer, "{}{}", prefix, escape_command_data(&message))
        }
    }
}

fn command_prefix(level: Level, target: &str) -> &'static str {
    if target == NOTICE_TARGET {
        return "::notice::";
    }
    match level {
        Level::ERROR => "::error::",
        Level::WARN => "::warning::",
        Level::INFO => "",
        _ => "::debug::",
    }
}

/// Escape a message so it survives as a single workflow command line
fn escape_command_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
