use std::io::Write;
use std::sync::Once;

use env_logger::fmt::{Color, Style, StyledValue};
use log::Level;

static SETUP_LOGS: Once = Once::new();

/// Install the global logger once. Defaults to `info` unless `RUST_LOG` is
/// set; later calls are no-ops.
pub fn setup_logger() {
    SETUP_LOGS.call_once(|| {
        build_logger().init();
    });
}

fn build_logger() -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();

    builder.format(|f, record| {
        let target = short_target(record.target());

        let mut style = f.style();
        let level = colored_level(&mut style, record.level());

        writeln!(f, "{} {} > {}", level, target, record.args())
    });

    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.parse_env("RUST_LOG");

    builder
}

/// "coredb::log::log_manager" -> "log::log_manager"
fn short_target(target: &str) -> &str {
    target
        .strip_prefix(concat!(env!("CARGO_PKG_NAME"), "::"))
        .unwrap_or(target)
}

fn colored_level(style: &mut Style, level: Level) -> StyledValue<'_, &'static str> {
    match level {
        Level::Trace => style.set_color(Color::Magenta).value("TRACE"),
        Level::Debug => style.set_color(Color::Blue).value("DEBUG"),
        Level::Info => style.set_color(Color::Green).value("INFO "),
        Level::Warn => style.set_color(Color::Yellow).value("WARN "),
        Level::Error => style.set_color(Color::Red).value("ERROR"),
    }
}
