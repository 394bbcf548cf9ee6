use std::path::Path;

use anyhow::{Result, Context};
use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

const FILE_LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l:<5} [{T}] {t} - {m}{n}";

/// Initialize console logging; `RUST_LOG` takes precedence over `default_level`
pub fn init_console_logging(default_level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level);
    builder.parse_default_env();
    // tests may have installed a logger already
    let _ = builder.try_init();
}

/// Initialize logging to a file through log4rs
pub fn init_file_logging(log_file: impl AsRef<Path>, level: LevelFilter) -> Result<()> {
    let log_file = log_file.as_ref();

    let appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FILE_LOG_PATTERN)))
        .append(false)
        .build(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(appender)))
        .build(Root::builder().appender("file").build(level))
        .context("Failed to build logging configuration")?;

    log4rs::init_config(config).context("Failed to initialize file logging")?;
    Ok(())
}
