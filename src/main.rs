use std::backtrace::Backtrace;
use std::panic;

use anyhow::Context;
use log::{error, info, LevelFilter};

fn main() {
    setup_diagnostics();

    info!("Starting Relief...");

    if let Err(err) = run() {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    relief::run_native().context("relief viewer stopped with an error")
}

/// Logging plus a panic hook that prints a crash report to stderr.
fn setup_diagnostics() {
    env_logger::Builder::new()
        .filter_level(if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .format_timestamp_millis()
        .format_target(false)
        .parse_default_env()
        .init();

    panic::set_hook(Box::new(|panic_info| {
        let backtrace = Backtrace::force_capture();

        let msg = match panic_info.payload().downcast_ref::<&'static str>() {
            Some(s) => *s,
            None => match panic_info.payload().downcast_ref::<String>() {
                Some(s) => &s[..],
                None => "Box<dyn Any>",
            },
        };

        let location = panic_info
            .location()
            .map_or("unknown location".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));

        eprintln!(
            "\x1b[31;1m=== RELIEF CRASH ===\nReason: {}\nLocation: {}\n\nStack Trace:\n{}\x1b[0m",
            msg, location, backtrace
        );
    }));
}
