//! Leveled reporting.
//!
//! Every component reports through a [`Logger`]. Levels are absolute depths:
//! a stage adds its `log-base-level` before calling in, so nested stages
//! indent under their parent. Nothing in the engine branches on what a
//! logger does with a message.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

/// Message category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Error,
    Warn,
    Notice,
    Progress,
    Verbose,
    Debug,
    Inspect,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Error => "error",
            LogKind::Warn => "warn",
            LogKind::Notice => "notice",
            LogKind::Progress => "progress",
            LogKind::Verbose => "verbose",
            LogKind::Debug => "debug",
            LogKind::Inspect => "inspect",
        }
    }
}

/// Optional presentation overrides for one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style<'a> {
    /// Colour name of the emitting stage.
    pub clr: Option<&'a str>,
    /// Tag shown before the message, usually the stage name.
    pub tag: Option<&'a str>,
}

impl<'a> Style<'a> {
    pub fn tagged(tag: &'a str, clr: &'a str) -> Self {
        Self {
            clr: Some(clr),
            tag: Some(tag),
        }
    }
}

pub trait Logger {
    fn log(&self, kind: LogKind, msg: &str, level: usize, style: Style<'_>);

    /// Dump a structured value for debugging.
    fn inspect(&self, label: &str, value: &Value, level: usize);

    fn progress(&self, msg: &str, level: usize, style: Style<'_>) {
        self.log(LogKind::Progress, msg, level, style);
    }

    fn verbose(&self, msg: &str, level: usize, style: Style<'_>) {
        self.log(LogKind::Verbose, msg, level, style);
    }

    fn notice(&self, msg: &str, level: usize, style: Style<'_>) {
        self.log(LogKind::Notice, msg, level, style);
    }

    fn debug(&self, msg: &str, level: usize, style: Style<'_>) {
        self.log(LogKind::Debug, msg, level, style);
    }

    fn warn(&self, msg: &str, level: usize, style: Style<'_>) {
        self.log(LogKind::Warn, msg, level, style);
    }

    fn error(&self, msg: &str, level: usize, style: Style<'_>) {
        self.log(LogKind::Error, msg, level, style);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _kind: LogKind, _msg: &str, _level: usize, _style: Style<'_>) {}

    fn inspect(&self, _label: &str, _value: &Value, _level: usize) {}
}

/// A recorded log call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub kind: LogKind,
    pub message: String,
    pub level: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Records every call in memory.
///
/// Clones share the same buffer, so a test can hand one clone to a
/// [`crate::Project`] and read the entries back through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    entries: Rc<RefCell<Vec<LogEntry>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    /// Messages of one kind, in emission order.
    pub fn messages(&self, kind: LogKind) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn contains(&self, kind: LogKind, needle: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|e| e.kind == kind && e.message.contains(needle))
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, kind: LogKind, msg: &str, level: usize, style: Style<'_>) {
        self.entries.borrow_mut().push(LogEntry {
            kind,
            message: msg.to_string(),
            level,
            tag: style.tag.map(str::to_string),
            value: None,
        });
    }

    fn inspect(&self, label: &str, value: &Value, level: usize) {
        self.entries.borrow_mut().push(LogEntry {
            kind: LogKind::Inspect,
            message: label.to_string(),
            level,
            tag: None,
            value: Some(value.clone()),
        });
    }
}
