//! Hub configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// What the pool does when a broadcast write to one member fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadcastFaultPolicy {
    /// Stop the whole control loop on the first failed write.
    #[default]
    Abort,
    /// Drop the faulting members, notify the rest with a logout, keep running.
    Evict,
}

impl FromStr for BroadcastFaultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "evict" => Ok(Self::Evict),
            other => Err(format!("unknown broadcast fault policy: {other}")),
        }
    }
}

/// Settings consumed by the pool control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Depth of each intake channel. Register and unregister callers also
    /// wait for the loop to service their request, so this only bounds how
    /// many broadcasts can queue.
    pub intake_capacity: usize,
    /// Reaction to a failed broadcast write.
    pub broadcast_fault_policy: BroadcastFaultPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            intake_capacity: 1,
            broadcast_fault_policy: BroadcastFaultPolicy::Abort,
        }
    }
}

/// Settings consumed by each client read loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Artificial latency applied before answering a `ping`.
    pub ping_delay: Duration,
    /// Copy `action`/`body` into forwarded broadcasts instead of sending an
    /// empty envelope.
    pub forward_payload: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ping_delay: Duration::from_millis(100),
            forward_payload: false,
        }
    }
}

/// Top-level hub configuration.
///
/// Loaded once at startup via [`HubConfig::from_env`].
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Read buffer size hint used at handshake time.
    pub read_buffer_size: usize,

    /// Write buffer size hint used at handshake time.
    pub write_buffer_size: usize,

    /// Accepted `Origin` header values. Empty accepts every origin.
    pub allowed_origins: Vec<String>,

    /// Pool control loop settings.
    pub pool: PoolConfig,

    /// Client read loop settings.
    pub client: ClientConfig,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            read_buffer_size: 1024,
            write_buffer_size: 1024,
            allowed_origins: Vec::new(),
            pool: PoolConfig::default(),
            client: ClientConfig::default(),
            json_logs: false,
        }
    }
}

impl HubConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to the defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .map(|raw| parse_list(&raw))
            .unwrap_or_default();

        let pool = PoolConfig {
            intake_capacity: parse_env("POOL_INTAKE_CAPACITY", defaults.pool.intake_capacity)
                .max(1),
            broadcast_fault_policy: parse_env(
                "BROADCAST_FAULT_POLICY",
                defaults.pool.broadcast_fault_policy,
            ),
        };

        let client = ClientConfig {
            ping_delay: parse_env_millis("PING_DELAY_MS", defaults.client.ping_delay),
            forward_payload: parse_env_bool("FORWARD_PAYLOAD", defaults.client.forward_payload),
        };

        let json_logs = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            listen_addr,
            read_buffer_size: parse_env("WS_READ_BUFFER_SIZE", defaults.read_buffer_size),
            write_buffer_size: parse_env("WS_WRITE_BUFFER_SIZE", defaults.write_buffer_size),
            allowed_origins,
            pool,
            client,
            json_logs,
        })
    }

    /// Returns `true` if a handshake carrying `origin` may proceed.
    ///
    /// Requests without an `Origin` header are always accepted.
    #[must_use]
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            _ if self.allowed_origins.is_empty() => true,
            None => true,
            Some(origin) => self.allowed_origins.iter().any(|o| o == origin),
        }
    }
}

/// Splits a comma-separated list, trimming blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a whole number of milliseconds,
/// returning `default` on missing or invalid values.
fn parse_env_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map_or(default, Duration::from_millis)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|v| v.to_ascii_lowercase())
        .as_deref()
    {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_handshake_hints() {
        let cfg = HubConfig::default();
        assert_eq!(cfg.read_buffer_size, 1024);
        assert_eq!(cfg.write_buffer_size, 1024);
        assert_eq!(cfg.client.ping_delay, Duration::from_millis(100));
        assert_eq!(cfg.pool.intake_capacity, 1);
        assert_eq!(cfg.pool.broadcast_fault_policy, BroadcastFaultPolicy::Abort);
        assert!(!cfg.client.forward_payload);
    }

    #[test]
    fn unset_millis_variable_keeps_the_given_default() {
        let fallback = Duration::from_millis(250);
        assert_eq!(
            parse_env_millis("FANOUT_HUB_TEST_UNSET_DELAY_MS", fallback),
            fallback
        );
    }

    #[test]
    fn empty_allow_list_accepts_all_origins() {
        let cfg = HubConfig::default();
        assert!(cfg.origin_allowed(Some("https://anywhere.example")));
        assert!(cfg.origin_allowed(None));
    }

    #[test]
    fn allow_list_filters_origins() {
        let cfg = HubConfig {
            allowed_origins: parse_list(" https://a.example, ,https://b.example "),
            ..HubConfig::default()
        };
        assert_eq!(cfg.allowed_origins.len(), 2);
        assert!(cfg.origin_allowed(Some("https://b.example")));
        assert!(!cfg.origin_allowed(Some("https://c.example")));
        assert!(cfg.origin_allowed(None));
    }

    #[test]
    fn fault_policy_parses_case_insensitively() {
        assert_eq!("EVICT".parse::<BroadcastFaultPolicy>(), Ok(BroadcastFaultPolicy::Evict));
        assert_eq!("abort".parse::<BroadcastFaultPolicy>(), Ok(BroadcastFaultPolicy::Abort));
        assert!("skip".parse::<BroadcastFaultPolicy>().is_err());
    }
}
