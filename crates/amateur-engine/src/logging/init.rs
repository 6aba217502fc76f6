use std::io::Write;
use std::sync::{Mutex, Once, PoisonError};
use std::time::{Duration, Instant};

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info", "warn",
/// "amateur_engine=debug,gl=warn").
///
/// `write_style` controls ANSI coloring behavior.
///
/// `show_delta` prefixes every line with the time elapsed since the previous
/// line, which makes per-frame narration easy to read as a timeline.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    pub show_delta: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            show_delta: false,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// This function is idempotent; subsequent calls are ignored. A logger that
/// was installed by someone else is kept.
/// Intended usage is early in `main`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        builder.write_style(config.write_style);

        if config.show_delta {
            let last: Mutex<Option<Instant>> = Mutex::new(None);
            builder.format(move |buf, record| {
                let now = Instant::now();
                let delta = {
                    let mut last = last.lock().unwrap_or_else(PoisonError::into_inner);
                    let delta = last.map_or(Duration::ZERO, |prev| now.saturating_duration_since(prev));
                    *last = Some(now);
                    delta
                };

                let style = buf.default_level_style(record.level());
                writeln!(
                    buf,
                    "{} {} {style}[{:<5}]{style:#} {}: {}",
                    buf.timestamp_millis(),
                    format_delta(delta),
                    record.level(),
                    record.target(),
                    record.args()
                )
            });
        }

        match builder.try_init() {
            Ok(()) => log::debug!("logging initialized"),
            Err(e) => log::debug!("keeping the existing logger: {e}"),
        }
    });
}

/// Formats the gap between two log lines as `[+  Ns  NNNms]`.
pub(crate) fn format_delta(delta: Duration) -> String {
    format!("[+{:>3}s {:>3}ms]", delta.as_secs(), delta.subsec_millis())
}
