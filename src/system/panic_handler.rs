//! Panic hook shared by the server and the console commands.

use std::backtrace::Backtrace;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic::{self, PanicHookInfo};

use chrono::Utc;
use colored::Colorize;

const CRASH_LOG: &str = "crash.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Server,
    Cli,
}

struct CrashReport {
    at: String,
    message: String,
    location: String,
    backtrace: Backtrace,
}

impl CrashReport {
    fn capture(info: &PanicHookInfo<'_>) -> Self {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "<non-string panic payload>".to_string());
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "<unknown>".to_string());

        Self {
            at: Utc::now().to_rfc3339(),
            message,
            location,
            backtrace: Backtrace::force_capture(),
        }
    }

    fn append_to_log(&self) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(CRASH_LOG)?;
        writeln!(file, "{}", self)
    }
}

impl fmt::Display for CrashReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- panic at {} ---", self.at)?;
        writeln!(f, "message:  {}", self.message)?;
        writeln!(f, "location: {}", self.location)?;
        writeln!(f, "{}", self.backtrace)
    }
}

/// The server prints the whole report in red and also emits a tracing
/// event so the panic reaches the log file. Console commands get one line.
pub fn install_panic_hook(mode: RunMode) {
    panic::set_hook(Box::new(move |info| {
        let report = CrashReport::capture(info);
        let saved = report.append_to_log();

        match mode {
            RunMode::Server => {
                tracing::error!(
                    location = %report.location,
                    "worker panicked: {}",
                    report.message
                );
                eprintln!("{}", report.to_string().red());
            }
            RunMode::Cli => {
                eprintln!("{} {}", "error:".red().bold(), report.message);
            }
        }

        match saved {
            Ok(()) => eprintln!("{}", format!("details appended to {}", CRASH_LOG).dimmed()),
            Err(e) => eprintln!("could not write {}: {}", CRASH_LOG, e),
        }
    }));
}
