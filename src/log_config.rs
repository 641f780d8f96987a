use chrono::Local;
use fern::{
    Dispatch,
    colors::{Color, ColoredLevelConfig},
};
use log::LevelFilter;
use std::io;
use std::path::Path;

/// Initialize logging to file and stdout with timestamps and colored levels.
pub fn init_logging(log_file: &str, level: LevelFilter) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(log_file).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Cyan)
        .trace(Color::BrightBlack);

    Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} - {} - {} - {}",
                Local::now().to_rfc3339(),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        // teloxide's polling internals are noisy below warn
        .level_for("teloxide", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .chain(fern::log_file(log_file)?)
        .chain(io::stdout())
        .apply()?;
    Ok(())
}
