/// Days used when a timeframe cannot be read.
pub const DEFAULT_TIMEFRAME_DAYS: u32 = 7;

/// Read "3 days", "2 weeks", "1 month" style phrases into a day count.
/// Days win over weeks, weeks over months; anything else is a week.
pub fn parse_timeframe(text: &str) -> u32 {
    let text = text.to_lowercase();

    for (unit, multiplier) in [("day", 1u32), ("week", 7), ("month", 30)] {
        if let Some(n) = amount_before(&text, unit) {
            return n.saturating_mul(multiplier);
        }
    }

    DEFAULT_TIMEFRAME_DAYS
}

/// First `<digits><optional spaces><unit>` occurrence.
fn amount_before(text: &str, unit: &str) -> Option<u32> {
    text.match_indices(unit).find_map(|(idx, _)| {
        let head = text[..idx].trim_end();
        let digits: String = head
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        if digits.is_empty() {
            None
        } else {
            digits.parse().ok()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_units() {
        assert_eq!(parse_timeframe("past 40 days"), 40);
        assert_eq!(parse_timeframe("1 day"), 1);
        assert_eq!(parse_timeframe("2 weeks"), 14);
        assert_eq!(parse_timeframe("3months"), 90);
        assert_eq!(parse_timeframe("Last 10 Days"), 10);
    }

    #[test]
    fn days_take_precedence() {
        assert_eq!(parse_timeframe("1 month and 5 days"), 5);
    }

    #[test]
    fn unreadable_defaults_to_a_week() {
        assert_eq!(parse_timeframe("past week"), DEFAULT_TIMEFRAME_DAYS);
        assert_eq!(parse_timeframe("recently"), DEFAULT_TIMEFRAME_DAYS);
        assert_eq!(parse_timeframe(""), DEFAULT_TIMEFRAME_DAYS);
    }
}
