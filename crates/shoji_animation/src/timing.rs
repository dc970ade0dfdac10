//! CSS transition timing values

use std::time::Duration;

/// Parse a single CSS time value (e.g. "300ms", "0.5s", "1s")
///
/// Negative, non-numeric or unrepresentably large values are rejected.
pub fn parse_time_value(input: &str) -> Option<Duration> {
    let input = input.trim();

    let millis = if let Some(ms_str) = input.strip_suffix("ms") {
        ms_str.trim().parse::<f64>().ok()?
    } else if let Some(s_str) = input.strip_suffix('s') {
        s_str.trim().parse::<f64>().ok()? * 1000.0
    } else {
        return None;
    };

    if !millis.is_finite() || millis < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(millis / 1000.0).ok()
}

/// Effective duration of a `transition-duration` value
///
/// Comma-separated lists resolve to their longest entry. Unparsable entries
/// count as zero, so anything malformed means "no transition".
pub fn transition_duration(value: &str) -> Duration {
    value
        .split(',')
        .filter_map(parse_time_value)
        .max()
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_time_value("300ms"), Some(Duration::from_millis(300)));
        assert_eq!(parse_time_value("0.5s"), Some(Duration::from_millis(500)));
        assert_eq!(parse_time_value(" 0s "), Some(Duration::ZERO));
        assert_eq!(parse_time_value("fast"), None);
        assert_eq!(parse_time_value("-1s"), None);
        assert_eq!(parse_time_value("200"), None);
    }

    #[test]
    fn test_transition_duration_takes_longest() {
        assert_eq!(
            transition_duration("0.2s, 350ms"),
            Duration::from_millis(350)
        );
        assert_eq!(transition_duration(""), Duration::ZERO);
        assert_eq!(transition_duration("0s"), Duration::ZERO);
    }

    #[test]
    fn test_overflowing_duration_is_rejected() {
        assert_eq!(parse_time_value("1e20s"), None);
        assert_eq!(parse_time_value("1e300ms"), None);
        assert_eq!(
            transition_duration("1e20s, 200ms"),
            Duration::from_millis(200)
        );
    }
}
