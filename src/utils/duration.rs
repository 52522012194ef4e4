//! Timeout parsing utilities.
//!
//! This module turns timeout strings from the command line or the
//! environment ("3s", "500ms", "1m") into a [`Duration`].

use std::time::Duration;

use humantime_serde::re::humantime;

/// Parse a connection timeout
///
/// Accepts any `humantime` duration ("3s", "500ms", "1m 30s") as well as
/// bare whole seconds ("3"). A zero timeout is rejected because a zero
/// connect timeout is not a valid socket option.
///
/// # Examples
/// ```
/// use reachcheck::utils::duration::parse_timeout;
/// use std::time::Duration;
///
/// assert_eq!(parse_timeout("3s"), Ok(Duration::from_secs(3)));
/// assert_eq!(parse_timeout("3"), Ok(Duration::from_secs(3)));
/// assert_eq!(parse_timeout("250ms"), Ok(Duration::from_millis(250)));
/// assert!(parse_timeout("soon").is_err());
/// ```
pub fn parse_timeout(value: &str) -> Result<Duration, String> {
    let value = value.trim();

    let timeout = match value.parse::<u64>() {
        Ok(seconds) => Duration::from_secs(seconds),
        Err(_) => humantime::parse_duration(value)
            .map_err(|e| format!("Invalid timeout '{}': {}", value, e))?,
    };

    if timeout.is_zero() {
        return Err(format!("Invalid timeout '{}': must be greater than zero", value));
    }

    Ok(timeout)
}
