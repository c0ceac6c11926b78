use env_logger::Target;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_FILE: &str = "/var/log/tn-installer.log";

/// Route logs to a file so they never draw over console dialogs.
///
/// Falls back to stderr when the file cannot be opened (read-only media).
/// `RUST_LOG` still overrides the default `info` level.
pub fn init_with(log_file: Option<PathBuf>) {
    let path = log_file.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    let target = match open_append(&path) {
        Ok(file) => Target::Pipe(Box::new(file)),
        Err(_) => Target::Stderr,
    };

    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(target)
        .try_init();
}

fn open_append(path: &Path) -> io::Result<fs::File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
