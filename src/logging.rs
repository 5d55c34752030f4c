//! Session log for conditions that happen while the terminal is in the
//! alternate screen and stderr cannot be seen.

use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

static LOG_MUTEX: Mutex<()> = Mutex::new(());
static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
        }
    }
}

/// `<data_local_dir>/skyline/logs/session.log`, or `None` on platforms
/// without a data directory.
pub fn log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("skyline").join("logs").join("session.log"))
}

pub fn append(path: &Path, level: Level, msg: &str) -> io::Result<()> {
    let _lock = LOG_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    writeln!(file, "[{}] {} {}", timestamp, level.as_str(), msg)
}

/// Route `log_info!`/`log_warn!` to `path` for the rest of the process.
/// Until this is called the macros discard their messages.
pub fn init(path: PathBuf) {
    let _ = LOG_FILE.set(path);
}

/// Best effort: a log that cannot be written is dropped.
pub fn log(level: Level, msg: &str) {
    if let Some(path) = LOG_FILE.get() {
        let _ = append(path, level, msg);
    }
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::Level::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::Level::Warn, &format!($($arg)*))
    };
}
