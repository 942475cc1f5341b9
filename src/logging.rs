use std::env;
use std::io::Write;

use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};

/// Environment variable holding an env_logger filter spec (e.g. `debug`).
pub const LOG_ENV: &str = "AI_COMMIT_LOG";

pub fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Info // --verbose: progress and warnings
    } else {
        LevelFilter::Error // default: only errors
    };

    let mut builder = Builder::new();
    builder.filter_level(level);
    if let Ok(spec) = env::var(LOG_ENV) {
        builder.parse_filters(&spec);
    }

    builder.format(|buf, record| {
        let level = record.level();

        let level_label = match level {
            Level::Error => "ERROR".red().bold(),
            Level::Warn  => "WARN ".yellow().bold(),
            Level::Info  => "INFO ".white().bold(),
            Level::Debug => "DEBUG".bright_black(),
            Level::Trace => "TRACE".bright_black(),
        };

        writeln!(
            buf,
            "{} {}",
            level_label,
            record.args()
        )
    });

    builder.init();
}
