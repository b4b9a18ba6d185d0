use std::env;
use std::time::Duration;

use url::Url;

use crate::common::error::PanelError;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const CONTROL_SOCKET_PATH: &str = "ws/control";

/// Baud rates offered by the connection picker.
pub const BAUD_RATES: [u32; 8] = [9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600];

/// What to do after the control channel drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Throw the whole session away after `delay` and start over.
    Reload { delay: Duration },
    /// Keep the session and retry with exponential delay, giving up after `max_attempts`.
    Backoff {
        base: Duration,
        max_delay: Duration,
        max_attempts: u32,
    },
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (zero based) under a backoff policy.
    pub fn backoff_delay(base: Duration, max_delay: Duration, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        std::cmp::min(base.saturating_mul(factor), max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend_url: Url,
    pub reconnect: ReconnectPolicy,
    pub request_timeout: Duration,
    pub default_baud: u32,
    pub default_speed: u8,
    pub log_level: String,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, PanelError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup; missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PanelError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("PANEL_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let mut backend_url = Url::parse(&raw_url)?;
        if !matches!(backend_url.scheme(), "http" | "https") {
            return Err(PanelError::Config(format!(
                "PANEL_BACKEND_URL must be http or https, got {}",
                backend_url.scheme()
            )));
        }
        if !backend_url.path().ends_with('/') {
            let path = format!("{}/", backend_url.path());
            backend_url.set_path(&path);
        }

        let delay = Duration::from_millis(parse_or(&lookup, "PANEL_RECONNECT_DELAY_MS", 3000u64)?);
        let reconnect = match lookup("PANEL_RECONNECT_POLICY").as_deref().map(str::trim) {
            None | Some("") | Some("reload") => ReconnectPolicy::Reload { delay },
            Some("backoff") => ReconnectPolicy::Backoff {
                base: delay,
                max_delay: Duration::from_millis(parse_or(
                    &lookup,
                    "PANEL_RECONNECT_MAX_DELAY_MS",
                    30_000u64,
                )?),
                max_attempts: parse_or(&lookup, "PANEL_RECONNECT_MAX_ATTEMPTS", 5u32)?,
            },
            Some(other) => {
                return Err(PanelError::Config(format!(
                    "unknown PANEL_RECONNECT_POLICY '{}' (expected reload or backoff)",
                    other
                )))
            }
        };

        let default_speed = parse_or(&lookup, "PANEL_DEFAULT_SPEED", 50u8)?;
        if default_speed > 100 {
            return Err(PanelError::Config(format!(
                "PANEL_DEFAULT_SPEED must be within 0..=100, got {}",
                default_speed
            )));
        }

        Ok(Self {
            backend_url,
            reconnect,
            request_timeout: Duration::from_secs(parse_or(&lookup, "PANEL_REQUEST_TIMEOUT_SECS", 10u64)?),
            default_baud: parse_or(&lookup, "PANEL_DEFAULT_BAUD", 115_200u32)?,
            default_speed,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// `ws://` (or `wss://`) address of the control channel on the same backend.
    pub fn control_socket_url(&self) -> Result<Url, PanelError> {
        let mut url = self.backend_url.join(CONTROL_SOCKET_PATH)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| PanelError::Config(format!("cannot derive WebSocket URL from {}", self.backend_url)))?;
        Ok(url)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, PanelError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| PanelError::Config(format!("{}={}: {}", key, raw, e))),
        _ => Ok(default),
    }
}
