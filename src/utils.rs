use chrono::{DateTime, Utc};
use color_eyre::{eyre::WrapErr, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Round to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Parse a timestamp stored as RFC 3339 text back into a UTC instant.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .wrap_err_with(|| format!("invalid timestamp in storage: {value}"))
}
