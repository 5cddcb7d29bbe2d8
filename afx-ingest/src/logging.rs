//! Tracing subscriber setup
//!
//! The subscriber is installed before the config file is read so that config
//! fallback warnings are visible. It starts at `info` (or `RUST_LOG`) and is
//! narrowed or widened to the configured level once the config is loaded.

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Level used until the config file has been read
pub const STARTUP_LEVEL: &str = "info";

/// Switches the active filter once the configured level is known
pub struct LogLevelHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogLevelHandle {
    /// Apply the configured level unless `RUST_LOG` already set one
    pub fn apply_config_level(&self, level: &str) -> Result<(), reload::Error> {
        if self.from_env {
            return Ok(());
        }
        self.handle.reload(EnvFilter::new(level))
    }

    /// Whether `RUST_LOG` chose the filter
    pub fn from_env(&self) -> bool {
        self.from_env
    }
}

/// Build a subscriber writing to `writer`
///
/// `env_filter` is the filter parsed from `RUST_LOG`, if any.
pub fn build<W>(
    env_filter: Option<EnvFilter>,
    writer: W,
) -> (impl Subscriber + Send + Sync + 'static, LogLevelHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let from_env = env_filter.is_some();
    let filter = env_filter.unwrap_or_else(|| EnvFilter::new(STARTUP_LEVEL));
    let (filter, handle) = reload::Layer::new(filter);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer));

    (subscriber, LogLevelHandle { handle, from_env })
}

/// Install the global subscriber on stdout
pub fn init() -> LogLevelHandle {
    use tracing_subscriber::util::SubscriberInitExt;

    let (subscriber, handle) = build(EnvFilter::try_from_default_env().ok(), std::io::stdout);
    subscriber.init();
    handle
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing::{debug, info, warn};

    #[derive(Clone, Default)]
    struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

    impl CapturedOutput {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for CapturedOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'w> MakeWriter<'w> for CapturedOutput {
        type Writer = CapturedOutput;

        fn make_writer(&'w self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_warnings_before_config_load_are_written() {
        let output = CapturedOutput::default();
        let (subscriber, handle) = build(None, output.clone());
        assert!(!handle.from_env());

        tracing::subscriber::with_default(subscriber, || {
            warn!("No config file found, using compiled defaults");
        });

        assert!(output.text().contains("No config file found"));
    }

    #[test]
    fn test_config_level_replaces_startup_level() {
        let output = CapturedOutput::default();
        let (subscriber, handle) = build(None, output.clone());

        tracing::subscriber::with_default(subscriber, || {
            info!("before reload");
            handle.apply_config_level("warn").unwrap();
            info!("after reload");
            warn!("still shown");
        });

        let text = output.text();
        assert!(text.contains("before reload"));
        assert!(!text.contains("after reload"));
        assert!(text.contains("still shown"));
    }

    #[test]
    fn test_env_filter_is_not_overridden() {
        let output = CapturedOutput::default();
        let (subscriber, handle) = build(Some(EnvFilter::new("debug")), output.clone());
        assert!(handle.from_env());

        tracing::subscriber::with_default(subscriber, || {
            handle.apply_config_level("error").unwrap();
            debug!("debug from env");
        });

        assert!(output.text().contains("debug from env"));
    }
}
