//! Epoch parsing for catalogue timestamps.
//!
//! Catalogues stamp rows with a plain calendar date (`2014-05-14`) or a date
//! and time (`2014-05-14 10:21:00`, `2014-05-14T10:21:00Z`). Timestamps without
//! a time scale are UTC.

use std::str::FromStr;

use hifitime::Epoch;

/// Parse a UTC timestamp.
pub fn parse_epoch(text: &str) -> anyhow::Result<Epoch> {
    let text = text.trim();
    let bare = text.strip_suffix('Z').unwrap_or(text);
    if bare.is_empty() {
        anyhow::bail!("empty timestamp");
    }
    Epoch::from_str(bare).map_err(|e| anyhow::anyhow!("unrecognised timestamp {text:?}: {e}"))
}

/// Current UTC time from the system clock.
pub fn now() -> anyhow::Result<Epoch> {
    Epoch::now().map_err(|e| anyhow::anyhow!("system clock unavailable: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_only_is_midnight_utc() {
        assert_eq!(
            parse_epoch("2014-05-14").unwrap(),
            Epoch::from_gregorian_utc_at_midnight(2014, 5, 14)
        );
        assert_eq!(
            parse_epoch(" 2014-05-14\n").unwrap(),
            Epoch::from_gregorian_utc_at_midnight(2014, 5, 14)
        );
    }

    #[test]
    fn date_and_time_forms() {
        let expected = Epoch::from_gregorian_utc_hms(2023, 11, 2, 10, 21, 30);
        assert_eq!(parse_epoch("2023-11-02 10:21:30").unwrap(), expected);
        assert_eq!(parse_epoch("2023-11-02T10:21:30").unwrap(), expected);
        assert_eq!(parse_epoch("2023-11-02T10:21:30Z").unwrap(), expected);
        assert_eq!(
            parse_epoch("2023-11-02T10:21").unwrap(),
            Epoch::from_gregorian_utc_hms(2023, 11, 2, 10, 21, 0)
        );
    }

    #[test]
    fn fractional_seconds() {
        let e = parse_epoch("2023-11-02T10:21:30.5").unwrap();
        assert_eq!(
            e,
            Epoch::from_gregorian_utc(2023, 11, 2, 10, 21, 30, 500_000_000)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_epoch("").is_err());
        assert!(parse_epoch("  ").is_err());
        assert!(parse_epoch("Z").is_err());
        assert!(parse_epoch("yesterday").is_err());
        assert!(parse_epoch("2023-13-45").is_err());
    }
}
