//! Console status lines and diagnostic logging setup.
//!
//! Status lines are the user-facing progress report of both pipelines.
//! Diagnostics go through `tracing` and are silent unless enabled with `-v`
//! or `RUST_LOG`.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;

const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Kind of status line. Decides the tag, the color and the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Step,
    Info,
    Success,
    Skip,
    Warn,
    Fail,
    Error,
}

impl LineKind {
    fn prefix(self) -> &'static str {
        match self {
            LineKind::Step | LineKind::Info => "",
            LineKind::Success => "✓ ",
            LineKind::Skip => "[SKIP] ",
            LineKind::Warn => "[WARN] ",
            LineKind::Fail => "✗ ",
            LineKind::Error => "[ERR] ",
        }
    }

    fn color(self) -> &'static str {
        match self {
            LineKind::Step => CYAN,
            LineKind::Info => "",
            LineKind::Success => GREEN,
            LineKind::Skip => DIM,
            LineKind::Warn => YELLOW,
            LineKind::Fail | LineKind::Error => RED,
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, LineKind::Warn | LineKind::Fail | LineKind::Error)
    }
}

/// Render one status line without the trailing newline.
pub fn format_line(kind: LineKind, message: &str, color: bool) -> String {
    let color_code = kind.color();
    if color && !color_code.is_empty() {
        format!("{color_code}{}{message}{RESET}", kind.prefix())
    } else {
        format!("{}{message}", kind.prefix())
    }
}

/// Prints progress and status lines for a command.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    quiet: bool,
    color: bool,
}

impl Console {
    /// Colors are used when stdout is a terminal and `NO_COLOR` is unset.
    pub fn new(quiet: bool) -> Self {
        let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self { quiet, color }
    }

    /// A console that prints nothing but errors.
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            color: false,
        }
    }

    pub fn line(&self, kind: LineKind, message: &str) {
        if self.quiet && kind != LineKind::Error {
            return;
        }
        let line = format_line(kind, message, self.color);
        if kind.to_stderr() {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    /// A tagged progress step, e.g. `[STT] talk.wav`.
    pub fn step(&self, tag: &str, message: &str) {
        self.line(LineKind::Step, &format!("[{tag}] {message}"));
    }

    pub fn info(&self, message: &str) {
        self.line(LineKind::Info, message);
    }

    pub fn success(&self, message: &str) {
        self.line(LineKind::Success, message);
    }

    pub fn skip(&self, message: &str) {
        self.line(LineKind::Skip, message);
    }

    pub fn warn(&self, message: &str) {
        self.line(LineKind::Warn, message);
    }

    pub fn fail(&self, message: &str) {
        self.line(LineKind::Fail, message);
    }

    /// Printed even when quiet.
    pub fn error(&self, message: &str) {
        self.line(LineKind::Error, message);
    }
}

/// Filter directive for a `-v` count: warn, then info, then debug.
pub fn verbosity_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global tracing subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
pub fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_directive(verbosity)));

    let subscriber = tracing_subscriber::Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal()),
    );

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {e}"))
}
