//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 内核日志
//!
//! 宿主环境下把 `log` 门面输出到 stderr。级别取自 `config::LOG_LEVEL`，
//! 启用 `debug_log` 特性时强制为 Trace。

use log::{LevelFilter, Log, Metadata, Record};
use std::eprintln;

use crate::config::LOG_LEVEL;

/// 安装 stderr 日志，重复调用无副作用
pub fn init() {
    if log::set_logger(&STDERR_LOGGER).is_ok() {
        log::set_max_level(max_level());
    }
}

/// 配置的日志级别
pub fn max_level() -> LevelFilter {
    if cfg!(feature = "debug_log") {
        return LevelFilter::Trace;
    }
    match LOG_LEVEL {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Warn,
    }
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if record.level() < log::Level::Info {
                eprintln!("[{}][{}:{}]: {}",
                    record.level(),
                    record.file().unwrap_or("<NONE>"),
                    record.line().unwrap_or_default(),
                    record.args());
            } else {
                eprintln!("[{}]: {}", record.level(), record.args());
            }
        }
    }

    fn flush(&self) {}
}

static STDERR_LOGGER: StderrLogger = StderrLogger;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        assert!(log::max_level() <= LevelFilter::Trace);
    }
}
