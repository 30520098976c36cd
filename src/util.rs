use chrono::{Local, NaiveDate};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// `mm:ss`; minutes keep counting past an hour instead of wrapping
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Long-form date for the start screen, e.g. "Wednesday, October 14, 2026"
pub fn long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// First whitespace-separated word of a display name, or "Anonymous".
pub fn first_name(display_name: &str) -> String {
    display_name
        .split_whitespace()
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| "Anonymous".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(3600), "60:00");
    }

    #[test]
    fn test_date_key_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(date_key(date), "2026-03-07");
        assert_eq!(parse_date("2026-03-07").unwrap(), date);
        assert_eq!(parse_date(" 2026-03-07 ").unwrap(), date);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("03/07/2026").is_err());
        assert!(parse_date("2026-13-01").is_err());
    }

    #[test]
    fn test_long_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        assert_eq!(long_date(date), "Wednesday, October 14, 2026");
    }

    #[test]
    fn test_first_name() {
        assert_eq!(first_name("Ada Lovelace"), "Ada");
        assert_eq!(first_name("  Grace  "), "Grace");
        assert_eq!(first_name(""), "Anonymous");
    }
}
