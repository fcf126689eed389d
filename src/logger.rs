//! Session log: one file per process, truncated at launch, lines stamped
//! with the time elapsed since startup. Lives at
//! `<platform data dir>/MemeForge/memeforge.log`.
//!
//! Log through the `log_info!` / `log_warn!` / `log_err!` macros. Before
//! `init()` runs (or if the file cannot be opened) they are no-ops; logging
//! never brings the app down.

use std::env;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

struct Sink {
    file: Mutex<File>,
    started: Instant,
}

static SINK: OnceLock<Sink> = OnceLock::new();

/// Append one stamped line to the session log. I/O errors are swallowed.
pub fn log(level: &str, args: fmt::Arguments<'_>) {
    let Some(sink) = SINK.get() else {
        return;
    };
    let line = format_line(sink.started.elapsed(), level, args);
    if let Ok(mut file) = sink.file.lock() {
        let _ = writeln!(file, "{line}");
    }
}

fn format_line(elapsed: Duration, level: &str, args: fmt::Arguments<'_>) -> String {
    format!("[{:>9.3}s] [{:5}] {}", elapsed.as_secs_f64(), level, args)
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::log("INFO", format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::log("WARN", format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::log("ERROR", format_args!($($arg)*));
    };
}

/// Open (truncating) the session log and install a panic hook that mirrors
/// the panic into it before the default handler runs. Call once at startup.
pub fn init() {
    let path = log_file_path();
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }

    let file = match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("[logger] cannot open {}: {e}", path.display());
            return;
        }
    };
    if SINK
        .set(Sink {
            file: Mutex::new(file),
            started: Instant::now(),
        })
        .is_err()
    {
        return;
    }

    log(
        "INFO",
        format_args!(
            "MemeForge {} session log: {}",
            env!("CARGO_PKG_VERSION"),
            path.display()
        ),
    );
    if let Ok(since) = SystemTime::now().duration_since(UNIX_EPOCH) {
        log("INFO", format_args!("Launched at unix {}", since.as_secs()));
    }

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log("PANIC", format_args!("{info}"));
        prev(info);
    }));
}

fn log_file_path() -> PathBuf {
    data_dir().join("MemeForge").join("memeforge.log")
}

/// Platform data directory, without the app sub-folder.
fn data_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        if let Ok(appdata) = env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    } else if cfg!(target_os = "macos") {
        if let Ok(home) = env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support");
        }
    }
    env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|_| {
            env::var("HOME").map(|home| PathBuf::from(home).join(".local").join("share"))
        })
        .unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_carry_elapsed_time_and_padded_level() {
        let line = format_line(Duration::from_millis(61_500), "WARN", format_args!("x = {}", 7));
        assert_eq!(line, "[   61.500s] [WARN ] x = 7");

        let line = format_line(Duration::ZERO, "ERROR", format_args!("boom"));
        assert_eq!(line, "[    0.000s] [ERROR] boom");
    }
}
