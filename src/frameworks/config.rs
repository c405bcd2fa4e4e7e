use crate::use_cases::GameSettings;
use std::{env, net::IpAddr, time::Duration};

// Runtime/server constants and env-driven settings.

pub const DEFAULT_PORT: u16 = 12345;
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_millis(120_000);
pub const MAX_INVALID_REPLIES: u32 = 3;
// Bound on each GameOver delivery and each socket close during teardown.
pub const FAREWELL_TIMEOUT: Duration = Duration::from_secs(2);

pub fn http_port() -> u16 {
    env::var("RPS_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

pub fn bind_addr() -> IpAddr {
    env::var("RPS_BIND_ADDR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

pub fn reply_timeout() -> Duration {
    env::var("REPLY_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|millis| *millis > 0)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_REPLY_TIMEOUT)
}

/// Session limits built from the environment.
pub fn game_settings() -> GameSettings {
    GameSettings {
        reply_timeout: reply_timeout(),
        max_invalid_replies: MAX_INVALID_REPLIES,
        farewell_timeout: FAREWELL_TIMEOUT,
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            max_invalid_replies: MAX_INVALID_REPLIES,
            farewell_timeout: FAREWELL_TIMEOUT,
        }
    }
}
