//! Tracing subscriber setup
//!
//! The subscriber is installed before the config file is resolved so that
//! resolution messages are not lost. `RUST_LOG` wins; otherwise logging starts
//! at `info` and is narrowed to `[logging] level` once the config is loaded.

use anyhow::{Context, Result};
use tracing::{debug, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, reload, EnvFilter, Registry};

/// Level used until the config file has been read
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Swaps the active filter once the configured level is known
pub struct LogLevelHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogLevelHandle {
    /// Switch to the configured level; a no-op when `RUST_LOG` set the filter
    pub fn apply_configured_level(&self, level: &str) -> Result<()> {
        if self.from_env {
            debug!("RUST_LOG is set, ignoring configured log level '{}'", level);
            return Ok(());
        }
        let filter = EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level '{}'", level))?;
        self.handle
            .reload(filter)
            .context("Failed to apply configured log level")?;
        Ok(())
    }
}

/// Build the subscriber writing formatted events to `writer`
pub fn build_subscriber<W>(writer: W) -> (impl Subscriber + Send + Sync + 'static, LogLevelHandle)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(DEFAULT_LOG_LEVEL), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer));

    (subscriber, LogLevelHandle { handle, from_env })
}
