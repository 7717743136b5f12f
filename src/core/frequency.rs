//! Administration frequency codes carried on medication orders.

use chrono::Duration;

/// Parses a frequency code into the interval between scheduled doses.
///
/// Accepts the common shorthand used on the orders ("qd", "bid", "tid",
/// "qid") plus explicit hourly codes "q1h".."q24h". PRN (as-needed)
/// orders have no fixed interval, and unknown codes are treated the
/// same way.
pub fn dose_interval(frequency: &str) -> Option<Duration> {
    let code = frequency.trim().to_ascii_lowercase();
    match code.as_str() {
        "qd" | "daily" => Some(Duration::hours(24)),
        "bid" => Some(Duration::hours(12)),
        "tid" => Some(Duration::hours(8)),
        "qid" => Some(Duration::hours(6)),
        "prn" => None,
        _ => {
            let hours: i64 = code.strip_prefix('q')?.strip_suffix('h')?.parse().ok()?;
            if (1..=24).contains(&hours) {
                Some(Duration::hours(hours))
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("qd", 24)]
    #[test_case("daily", 24)]
    #[test_case("bid", 12)]
    #[test_case("tid", 8)]
    #[test_case("qid", 6)]
    #[test_case("q1h", 1)]
    #[test_case("q6h", 6)]
    #[test_case("Q12H", 12)]
    #[test_case(" q8h ", 8)]
    fn known_codes(code: &str, hours: i64) {
        assert_eq!(dose_interval(code), Some(Duration::hours(hours)));
    }

    #[test_case("prn")]
    #[test_case("q0h")]
    #[test_case("q25h")]
    #[test_case("whenever")]
    #[test_case("")]
    fn unscheduled_codes(code: &str) {
        assert_eq!(dose_interval(code), None);
    }
}
