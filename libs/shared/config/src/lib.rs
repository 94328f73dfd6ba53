use std::env;

use chrono::{NaiveTime, Weekday};
use tracing::warn;

/// Clinic-wide settings read from the environment with sensible fallbacks.
/// A missing variable degrades to the default rather than failing startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Fixed weekly rest day. The clinic never takes bookings on this day,
    /// regardless of any date-specific availability override.
    pub closed_weekday: Weekday,
    /// Fallback opening hours for clinicians who never configured availability.
    pub default_open: NaiveTime,
    pub default_close: NaiveTime,
    /// Width of a bookable slot in minutes.
    pub slot_width_minutes: i32,
    /// Rate charged for a standard paid session.
    pub standard_session_rate: f64,
    /// Flat per-session fee for subsidized-care patients past their quota.
    pub subsidized_flat_fee: f64,
    /// Free sessions granted to subsidized-care patients.
    pub free_session_quota: u32,
    /// Informational cap on patients sharing a slot. Never enforced by the
    /// slot generator; surfaced so callers can warn.
    pub max_slot_occupancy: Option<u32>,
    /// Bind address for the API server.
    pub listen_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            closed_weekday: parse_weekday_var("CLINIC_CLOSED_WEEKDAY", Weekday::Sun),
            default_open: parse_time_var("CLINIC_DEFAULT_OPEN", "09:00"),
            default_close: parse_time_var("CLINIC_DEFAULT_CLOSE", "18:00"),
            slot_width_minutes: parse_var("CLINIC_SLOT_WIDTH_MINUTES", 30),
            standard_session_rate: parse_var("CLINIC_STANDARD_SESSION_RATE", 1200.0),
            subsidized_flat_fee: parse_var("CLINIC_SUBSIDIZED_FLAT_FEE", 200.0),
            free_session_quota: parse_var("CLINIC_FREE_SESSION_QUOTA", 4),
            max_slot_occupancy: env::var("CLINIC_MAX_SLOT_OCCUPANCY")
                .ok()
                .and_then(|v| v.parse().ok()),
            listen_addr: env::var("CLINIC_LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            closed_weekday: Weekday::Sun,
            default_open: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            default_close: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            slot_width_minutes: 30,
            standard_session_rate: 1200.0,
            subsidized_flat_fee: 200.0,
            free_session_quota: 4,
            max_slot_occupancy: None,
            listen_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a valid value, using default", name);
            default
        }),
        Err(_) => default,
    }
}

fn parse_time_var(name: &str, default: &str) -> NaiveTime {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M").unwrap_or_else(|_| {
        warn!("{} is not a valid HH:MM time, using {}", name, default);
        NaiveTime::parse_from_str(default, "%H:%M").unwrap()
    })
}

fn parse_weekday_var(name: &str, default: Weekday) -> Weekday {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a valid weekday, using {:?}", name, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_unconfigured_clinic() {
        let config = AppConfig::default();
        assert_eq!(config.closed_weekday, Weekday::Sun);
        assert_eq!(config.slot_width_minutes, 30);
        assert_eq!(config.free_session_quota, 4);
        assert_eq!(config.default_open, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(config.default_close, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    }
}
