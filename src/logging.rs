//! Tracing subscriber setup.
//!
//! Logs go to stdout; setting `LOG_DIR` additionally writes daily-rolling
//! files there (`LOG_MAX_FILES` caps retention).

use std::{env, sync::OnceLock};

use tracing_appender::{
    non_blocking,
    non_blocking::NonBlocking,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter,
    fmt::{fmt, time::ChronoLocal, writer::MakeWriterExt},
};

/// Keeps the non-blocking writer alive so buffered logs flush on shutdown.
static LOG_GUARD: OnceLock<non_blocking::WorkerGuard> = OnceLock::new();

pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt()
        .with_env_filter(env_filter)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(false)
        .with_level(true);

    match env::var("LOG_DIR") {
        Ok(dir) => {
            let stdout = std::io::stdout.with_max_level(tracing::Level::INFO);
            builder.with_writer(stdout.and(file_writer(dir))).init();
        }
        Err(_) => builder.init(),
    }

    tracing::info!("logger initialized");
}

fn file_writer(dir: String) -> NonBlocking {
    let mut appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("zhonyas.log");

    if let Some(max_files) = env::var("LOG_MAX_FILES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
    {
        appender = appender.max_log_files(max_files);
    }

    let (writer, guard) = non_blocking(
        appender
            .build(&dir)
            .expect("failed to create log file appender"),
    );

    LOG_GUARD.set(guard).expect("LOG_GUARD already set");

    writer
}
