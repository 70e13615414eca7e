//! Terminal output for stage logs.
//!
//! Log lines go to stderr, indented two spaces per level and prefixed with
//! the emitting stage as `[tag]`. Structured dumps from `inspect` go to
//! stdout as pretty JSON, since they are the output of `stagecraft debug`.

use stagecraft::{LogKind, Logger, Style};
use stagecraft_types::Params;

/// Which message kinds reach the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleLogger {
    debug: bool,
    verbose: bool,
    progress: bool,
    notice: bool,
}

impl ConsoleLogger {
    pub fn new(params: &Params) -> Self {
        Self {
            debug: params.debug,
            verbose: params.verbose,
            progress: params.progress || params.verbose,
            notice: params.notice,
        }
    }

    fn shows(&self, kind: LogKind) -> bool {
        match kind {
            LogKind::Error | LogKind::Warn | LogKind::Inspect => true,
            LogKind::Notice => self.notice,
            LogKind::Progress => self.progress,
            LogKind::Verbose => self.verbose,
            LogKind::Debug => self.debug,
        }
    }

    /// The line printed for a message, or `None` when it is filtered out.
    pub fn render(&self, kind: LogKind, msg: &str, level: usize, style: Style<'_>) -> Option<String> {
        if !self.shows(kind) {
            return None;
        }
        let indent = "  ".repeat(level);
        let marker = match kind {
            LogKind::Error => "[error] ",
            LogKind::Warn => "[warn] ",
            LogKind::Debug => "[debug] ",
            _ => "",
        };
        let tag = style.tag.map(|t| format!("[{t}] ")).unwrap_or_default();
        Some(format!("{indent}{marker}{tag}{msg}"))
    }

    /// Print `err` and its cause chain.
    pub fn report(&self, err: &anyhow::Error) {
        for line in error_lines(err) {
            eprintln!("{line}");
        }
    }
}

pub fn error_lines(err: &anyhow::Error) -> Vec<String> {
    let mut lines = vec![format!("[error] {err}")];
    lines.extend(err.chain().skip(1).map(|cause| format!("  caused by: {cause}")));
    lines
}

impl Logger for ConsoleLogger {
    fn log(&self, kind: LogKind, msg: &str, level: usize, style: Style<'_>) {
        if let Some(line) = self.render(kind, msg, level, style) {
            eprintln!("{line}");
        }
    }

    fn inspect(&self, label: &str, value: &serde_json::Value, level: usize) {
        let indent = "  ".repeat(level);
        let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        println!("{indent}{label}: {body}");
    }
}
