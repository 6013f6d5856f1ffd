/// File persistence for log lines
///
/// One file per day under the logs directory. The writer is opened lazily on
/// first use; if the file cannot be opened, file logging is silently disabled
/// for the rest of the process and console output continues.
use chrono::Local;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};

use super::config::get_logger_config;
use crate::paths;

enum FileState {
    Uninitialized,
    Open(BufWriter<File>),
    Disabled,
}

static LOG_FILE: Lazy<Mutex<FileState>> = Lazy::new(|| Mutex::new(FileState::Uninitialized));

pub fn init_file_logging() {
    if !get_logger_config().file_logging {
        *LOG_FILE.lock() = FileState::Disabled;
        return;
    }

    let dir = paths::get_logs_directory();
    let path = dir.join(format!("coinscan_{}.log", Local::now().format("%Y-%m-%d")));

    let state = std::fs::create_dir_all(&dir)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(&path))
        .map(|file| FileState::Open(BufWriter::new(file)))
        .unwrap_or_else(|e| {
            eprintln!("Log file '{}' unavailable: {}", path.display(), e);
            FileState::Disabled
        });

    *LOG_FILE.lock() = state;
}

pub fn write_to_file(line: &str) {
    let mut state = LOG_FILE.lock();
    if let FileState::Open(writer) = &mut *state {
        if writeln!(writer, "{}", line).is_err() {
            *state = FileState::Disabled;
        }
    }
}

pub fn flush_file_logging() {
    if let FileState::Open(writer) = &mut *LOG_FILE.lock() {
        let _ = writer.flush();
    }
}
