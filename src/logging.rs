//! Logger handles passed into each component.
//!
//! Components never call the global `log` macros. Each one owns a [`Logger`]
//! that forwards records synchronously to a `log::Log` sink, which is the
//! process-wide logger installed by `env_logger` unless a caller injects its
//! own.

use std::fmt;

use log::{Level, Log, Record};

/// A cheap, clonable handle that writes records for one target to a sink.
#[derive(Clone, Copy)]
pub struct Logger {
    sink: &'static dyn Log,
    target: &'static str,
}

impl Logger {
    /// A handle writing to `sink` under `target`.
    pub fn new(sink: &'static dyn Log, target: &'static str) -> Self {
        Self { sink, target }
    }

    /// A handle writing to the process-wide logger.
    pub fn global(target: &'static str) -> Self {
        Self::new(log::logger(), target)
    }

    /// Same sink, different target.
    pub fn with_target(self, target: &'static str) -> Self {
        Self { target, ..self }
    }

    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let metadata = log::Metadata::builder()
            .level(level)
            .target(self.target)
            .build();
        if !self.sink.enabled(&metadata) {
            return;
        }
        self.sink.log(
            &Record::builder()
                .metadata(metadata)
                .args(args)
                .module_path_static(Some(module_path!()))
                .build(),
        );
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// An in-memory sink, mostly useful for asserting on emitted records.
#[derive(Debug, Default)]
pub struct CapturingLog {
    records: std::sync::Mutex<Vec<(Level, String, String)>>,
}

impl CapturingLog {
    /// Leak a fresh sink so it can back a [`Logger`].
    pub fn leaked() -> &'static CapturingLog {
        Box::leak(Box::default())
    }

    /// `(level, target, message)` for every record seen so far.
    pub fn records(&self) -> Vec<(Level, String, String)> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|(l, _, msg)| *l == level && msg.contains(needle))
    }
}

impl Log for CapturingLog {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        let entry = (
            record.level(),
            record.target().to_string(),
            record.args().to_string(),
        );
        match self.records.lock() {
            Ok(mut records) => records.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }

    fn flush(&self) {}
}
