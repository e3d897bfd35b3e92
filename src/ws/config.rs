#![expect(
    clippy::module_name_repetitions,
    reason = "Configuration types intentionally mirror the module name for clarity"
)]

use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use bon::Builder;
use url::Url;

const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);
pub(crate) const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.0;

/// Configuration for a feed session.
///
/// ```
/// use std::time::Duration;
///
/// use polymarket_feed::ws::config::{Config, ReconnectConfig};
///
/// let config = Config::builder()
///     .reconnect(ReconnectConfig::builder().max_attempts(3).build())
///     .debug(true)
///     .build();
///
/// assert_eq!(config.heartbeat_interval, Duration::from_secs(10));
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, Builder)]
pub struct Config {
    /// Interval between `PING` frames
    #[builder(default = DEFAULT_HEARTBEAT_INTERVAL)]
    pub heartbeat_interval: Duration,
    /// Reconnection strategy configuration
    #[builder(default)]
    pub reconnect: ReconnectConfig,
    /// Proxy to tunnel the connection through (`http` or `socks5`/`socks5h` URL, optionally
    /// with `user:password@` credentials)
    pub proxy: Option<Url>,
    /// Emit lifecycle logs at `debug` level (requires the `tracing` feature)
    #[builder(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Configuration for automatic reconnection behavior.
#[non_exhaustive]
#[derive(Debug, Clone, Builder)]
pub struct ReconnectConfig {
    /// Whether a dropped connection is redialed at all
    #[builder(default = true)]
    pub auto_reconnect: bool,
    /// Delay before the first redial. Zero falls back to the default of five seconds.
    #[builder(default = DEFAULT_RECONNECT_DELAY)]
    pub delay: Duration,
    /// Maximum number of consecutive redials before giving up. `0` retries forever.
    #[builder(default)]
    pub max_attempts: u32,
    /// Growth factor applied to the delay after each attempt. `1.0` keeps the delay constant.
    #[builder(default = DEFAULT_BACKOFF_MULTIPLIER)]
    pub backoff_multiplier: f64,
    /// Upper bound for the delay between attempts
    #[builder(default = DEFAULT_MAX_DELAY)]
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ReconnectConfig {
    /// The delay actually used for the first attempt.
    #[must_use]
    pub fn effective_delay(&self) -> Duration {
        if self.delay.is_zero() && self.auto_reconnect {
            DEFAULT_RECONNECT_DELAY
        } else {
            self.delay
        }
    }
}

impl From<&ReconnectConfig> for ExponentialBackoff {
    fn from(config: &ReconnectConfig) -> Self {
        let initial = config.effective_delay();

        ExponentialBackoffBuilder::default()
            .with_initial_interval(initial)
            .with_max_interval(config.max_delay.max(initial))
            .with_multiplier(config.backoff_multiplier)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None) // attempts are capped separately
            .build()
    }
}
