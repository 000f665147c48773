//! Runtime configuration for the Lanewar server.

use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

#[derive(Debug)]
pub struct Settings {
    /// Address the HTTP/WS listener binds to.
    pub server_addr: String,
    /// Room simulation cadence.
    pub tick_hz: u32,
    /// Longest wall-clock gap one tick may simulate (milliseconds).
    pub max_tick_ms: u64,
    /// Whether a room whose match has ended still accepts a second player.
    pub join_ended_rooms: bool,
}

/// Per-room timing and admission rules, handed to the room registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomPolicy {
    pub tick_interval: Duration,
    pub max_tick: Duration,
    pub join_ended: bool,
}

impl Default for RoomPolicy {
    fn default() -> Self {
        RoomPolicy {
            tick_interval: Duration::from_millis(50),
            max_tick: Duration::from_millis(120),
            join_ended: false,
        }
    }
}

/// Accepted `MAX_TICK_MS` range; out-of-range values are clamped.
const MAX_TICK_MS_RANGE: (u64, u64) = (1, 250);

fn parse_max_tick_ms(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(120)
        .clamp(MAX_TICK_MS_RANGE.0, MAX_TICK_MS_RANGE.1)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Settings {
    fn from_env() -> Self {
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());

        let tick_hz = env::var("TICK_HZ")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(20)
            .clamp(1, 120);

        let max_tick_ms = parse_max_tick_ms(env::var("MAX_TICK_MS").ok().as_deref());

        let join_ended_rooms = env::var("JOIN_ENDED_ROOMS")
            .ok()
            .and_then(|v| parse_flag(&v))
            .unwrap_or(false);

        Settings {
            server_addr,
            tick_hz,
            max_tick_ms,
            join_ended_rooms,
        }
    }

    pub fn room_policy(&self) -> RoomPolicy {
        RoomPolicy {
            tick_interval: Duration::from_micros(1_000_000 / u64::from(self.tick_hz.max(1))),
            max_tick: Duration::from_millis(self.max_tick_ms),
            join_ended: self.join_ended_rooms,
        }
    }
}

static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);

pub fn settings() -> &'static Settings {
    &SETTINGS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 1 "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn max_tick_is_kept_within_bounds() {
        assert_eq!(parse_max_tick_ms(None), 120);
        assert_eq!(parse_max_tick_ms(Some("100")), 100);
        assert_eq!(parse_max_tick_ms(Some("0")), 1);
        assert_eq!(parse_max_tick_ms(Some("60000")), 250);
        assert_eq!(parse_max_tick_ms(Some("soon")), 120);
    }

    #[test]
    fn twenty_hz_is_fifty_ms() {
        let s = Settings {
            server_addr: String::new(),
            tick_hz: 20,
            max_tick_ms: 120,
            join_ended_rooms: true,
        };
        let p = s.room_policy();
        assert_eq!(p.tick_interval, Duration::from_millis(50));
        assert_eq!(p.max_tick, Duration::from_millis(120));
        assert!(p.join_ended);
    }
}
