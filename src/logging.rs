//! Logger initialisation for the binary.

use std::io::Write;

use chrono::Local;
use log::LevelFilter;

/// Installs a timestamped `env_logger` writing to stderr.
///
/// `default_level` applies unless `RUST_LOG` overrides it. Calling this more
/// than once is harmless; later calls are ignored.
pub fn init_logger(default_level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            writeln!(buf, "{} {} - {}", ts, record.level(), record.args())
        })
        .try_init()
        .ok();
}
