//! Leveled logging to stderr. Each message is prefixed with a local
//! timestamp, the level and the source location.

use std::{
    fmt::Arguments,
    io::{Write, stderr},
    sync::atomic::{AtomicU8, Ordering},
};

use anyhow::{Result, bail};
use chrono::{Local, SecondsFormat};

/// Ordered from least to most output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Nothing is logged
    Quiet,
    /// The default: only `warn!` messages
    Warn,
    /// What is being done, e.g. the summary of each log file read
    Info,
    /// Skipped run directories, malformed data lines and the like
    Debug,
}

impl LogLevel {
    const ALL: [LogLevel; 4] = [
        LogLevel::Quiet,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
    ];

    fn from_u8(level: u8) -> Option<Self> {
        Self::ALL.get(usize::from(level)).copied()
    }

    fn label(self) -> &'static str {
        match self {
            LogLevel::Quiet => "",
            LogLevel::Warn => "W",
            LogLevel::Info => "I",
            LogLevel::Debug => "D",
        }
    }
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);

pub fn set_log_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn log_level() -> LogLevel {
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed)).unwrap_or(LogLevel::Warn)
}

#[inline]
pub fn log_enabled(level: LogLevel) -> bool {
    log_level() >= level
}

/// Used by the macros. Failing to write to stderr is ignored, there is
/// nowhere left to report it.
pub fn write_message(level: LogLevel, file: &str, line: u32, message: Arguments) {
    let time = Local::now().to_rfc3339_opts(SecondsFormat::Millis, false);
    let mut out = stderr().lock();
    let _ = writeln!(out, "{time}\t{}\t{file}:{line}\t{message}", level.label());
}

#[macro_export]
macro_rules! log_at {
    { $level:ident, $($arg:tt)* } => {
        if $crate::utillib::logging::log_enabled($crate::utillib::logging::LogLevel::$level) {
            $crate::utillib::logging::write_message(
                $crate::utillib::logging::LogLevel::$level,
                file!(),
                line!(),
                format_args!($($arg)*),
            );
        }
    }
}

#[macro_export]
macro_rules! warn {
    { $($arg:tt)* } => { $crate::log_at!(Warn, $($arg)*) }
}

#[macro_export]
macro_rules! info {
    { $($arg:tt)* } => { $crate::log_at!(Info, $($arg)*) }
}

#[macro_export]
macro_rules! debug {
    { $($arg:tt)* } => { $crate::log_at!(Debug, $($arg)*) }
}

/// The logging flags shared by all subcommands. Fields stay private,
/// use `LogLevel::try_from`.
#[derive(Debug, clap::Args)]
pub struct LogLevelOpts {
    /// Show what is being done, e.g. the entry count, total and
    /// average for every log file read
    #[clap(short, long)]
    verbose: bool,

    /// Show information that helps debug this program, like skipped
    /// run directories and malformed data lines (implies `--verbose`)
    #[clap(short, long)]
    debug: bool,

    /// Disable warnings. Conflicts with `--verbose` and `--debug`.
    #[clap(short, long)]
    quiet: bool,
}

impl TryFrom<LogLevelOpts> for LogLevel {
    type Error = anyhow::Error;

    fn try_from(opts: LogLevelOpts) -> Result<Self> {
        let LogLevelOpts {
            verbose,
            debug,
            quiet,
        } = opts;
        if quiet {
            if verbose || debug {
                bail!("option `--quiet` conflicts with the options `--verbose` and `--debug`")
            }
            Ok(LogLevel::Quiet)
        } else if debug {
            Ok(LogLevel::Debug)
        } else if verbose {
            Ok(LogLevel::Info)
        } else {
            Ok(LogLevel::Warn)
        }
    }
}
