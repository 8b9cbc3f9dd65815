//! Process-wide logging setup.

/// Subscriber installation (format, filtering).
pub mod logging;

pub use logging::{LogFormat, LogSettings};

/// Install the default subscriber: JSON lines, `RUST_LOG` or `info`.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    logging::init(&LogSettings::default());
}

/// Install a subscriber configured by `settings`.
pub fn init_with(settings: &LogSettings) {
    logging::init(settings);
}
