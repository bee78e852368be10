use std::sync::LazyLock;

use regex::Regex;

static WEEKDAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Pon\.|Wt\.|Śr\.|Czw\.|Pt\.|Sb\.|Nd\.").unwrap());

/// Normalize a date header such as `"Pon. 12-03-2024"` to `"12/03/2024"`.
///
/// Only the first weekday abbreviation is removed.
pub fn clean_date(date: &str) -> String {
    WEEKDAY.replace(date, "").replace('-', "/").trim().to_string()
}

/// Build start and end display strings from an `HH:MM-HH:MM` range and the
/// current date header.
pub fn format_hours(hours: &str, date: &str) -> (String, String) {
    let mut parts = hours.split('-');
    let start = parts.next().unwrap_or_default();
    let end = parts.next().unwrap_or_default();
    let date = clean_date(date);

    (format!("{}, {}", date, start), format!("{}, {}", date, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_weekday_and_slashes_date() {
        assert_eq!(clean_date("Pon. 12-03-2024"), "12/03/2024");
        assert_eq!(clean_date("Śr. 14-03-2024"), "14/03/2024");
        assert_eq!(clean_date("  Czw.15-03-2024 "), "15/03/2024");
        assert_eq!(clean_date("16-03-2024"), "16/03/2024");
    }

    #[test]
    fn only_first_weekday_is_removed() {
        assert_eq!(clean_date("Sb. Nd. 17-03-2024"), "Nd. 17/03/2024");
    }

    #[test]
    fn formats_start_and_end() {
        let (start, end) = format_hours("08:00-09:30", "Pon. 12-03-2024");
        assert_eq!(start, "12/03/2024, 08:00");
        assert_eq!(end, "12/03/2024, 09:30");
    }

    #[test]
    fn missing_end_is_empty() {
        let (start, end) = format_hours("08:00", "Pt. 15-03-2024");
        assert_eq!(start, "15/03/2024, 08:00");
        assert_eq!(end, "15/03/2024, ");
    }

    #[test]
    fn no_date_seen_yet() {
        let (start, _) = format_hours("08:00-09:30", "");
        assert_eq!(start, ", 08:00");
    }
}
