//! Logging setup - one dispatch feeding a daily log file and stdout

use chrono::Local;
use log::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};

/// Log file for today inside `log_dir`
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!("orion-gallery-{}.log", Local::now().format("%Y%m%d")))
}

/// Route `log` records at `level` and above to today's log file and stdout.
/// This crate's own records are kept down to debug in the file.
pub fn init_logging(log_dir: &Path, level: LevelFilter) -> Result<PathBuf, fern::InitError> {
    fs::create_dir_all(log_dir)?;
    let path = log_file_path(log_dir);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("orion_gallery", LevelFilter::Debug.max(level))
        .chain(fern::log_file(&path)?)
        .chain(fern::Dispatch::new().level(level).chain(std::io::stdout()))
        .apply()?;

    log::info!("Logging to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_creates_daily_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = init_logging(dir.path(), LevelFilter::Info).unwrap();
        log::info!("hello from the test");

        assert_eq!(path, log_file_path(dir.path()));
        assert!(path.exists());
    }
}
