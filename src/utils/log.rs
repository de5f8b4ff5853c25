// src/utils/log.rs

//! Logging setup with server-style formatting.
//!
//! Records go through the `log` facade. Every line is written to stderr and
//! appended to the run's log file:
//!
//! ```text
//! [2024-05-01 12:00:00] [INFO] message
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use env_logger::{Builder, Env, Target};
use log::Level;

/// Initialize the global logger.
///
/// `verbose` forces the `debug` level. `RUST_LOG` still overrides both.
/// A log file that cannot be opened is reported and skipped.
pub fn init(level: &str, verbose: bool, log_file: Option<&Path>) {
    let level = if verbose { "debug" } else { level };

    let file = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Cannot open log file {}: {}", path.display(), e);
                None
            }
        }
    });

    let result = Builder::from_env(Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "{}",
                format_line(record.level(), &record.args().to_string())
            )
        })
        .target(Target::Pipe(Box::new(TeeWriter { file })))
        .try_init();

    if let Err(e) = result {
        eprintln!("Logger already initialized: {e}");
    }
}

/// Format a log line with timestamp and level.
pub fn format_line(level: Level, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("[{}] [{}] {}", timestamp, level, message)
}

/// Writes to stderr and, when present, to a file.
struct TeeWriter {
    file: Option<File>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = &mut self.file {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = &mut self.file {
            file.flush()?;
        }
        Ok(())
    }
}

/// Log a step in a process
pub fn step(step_num: usize, total: usize, message: &str) {
    log::info!("[STEP {}/{}] {}", step_num, total, message);
}

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(60);
    log::info!("{}", border);
    log::info!("  {}", title);
    log::info!("{}", border);
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    log::info!("    {}", message);
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {}", title);
    for (key, value) in items {
        log::info!("    {}: {}", key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        let line = format_line(Level::Warn, "cache flush failed");
        assert!(line.starts_with('['));
        assert!(line.ends_with("] [WARN] cache flush failed"));
        // "[YYYY-MM-DD HH:MM:SS]"
        assert_eq!(line.find(']'), Some(20));
    }

    #[test]
    fn test_tee_writer_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .unwrap();

        let mut writer = TeeWriter { file: Some(file) };
        writer.write_all(b"first\n").unwrap();
        writer.write_all(b"second\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
