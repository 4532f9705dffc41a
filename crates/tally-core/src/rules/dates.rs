//! Purchase date extraction for receipts.

use chrono::NaiveDate;

use super::patterns::{DATE_DMY, DATE_YMD};
use super::{ExtractionMatch, FieldExtractor};

/// Date field extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text)
            .into_iter()
            .min_by_key(|m| m.position.map(|(start, _)| start).unwrap_or(usize::MAX))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        // DD.MM.YYYY, falling back to MM/DD/YYYY
        for caps in DATE_DMY.captures_iter(text) {
            let first: u32 = caps[1].parse().unwrap_or(0);
            let second: u32 = caps[2].parse().unwrap_or(0);
            let year = parse_year(&caps[3]);

            let date = NaiveDate::from_ymd_opt(year, second, first)
                .or_else(|| NaiveDate::from_ymd_opt(year, first, second));

            if let (Some(date), Some(full_match)) = (date, caps.get(0)) {
                results.push(
                    ExtractionMatch::new(date, full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                );
            }
        }

        // YYYY-MM-DD or YYYY/MM/DD
        for caps in DATE_YMD.captures_iter(text) {
            let year: i32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let day: u32 = caps[3].parse().unwrap_or(0);

            if let (Some(date), Some(full_match)) =
                (NaiveDate::from_ymd_opt(year, month, day), caps.get(0))
            {
                if results.iter().any(|r| r.value == date) {
                    continue;
                }
                results.push(
                    ExtractionMatch::new(date, full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                );
            }
        }

        results
    }
}

/// First purchase date printed on the receipt.
pub fn find_receipt_date(text: &str) -> Option<NaiveDate> {
    DateExtractor::new().extract(text).map(|m| m.value)
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if year <= 50 {
            2000 + year
        } else {
            1900 + year
        }
    } else {
        year
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_extract_date_dmy() {
        assert_eq!(find_receipt_date("Date: 15.01.2024"), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn test_extract_date_ymd() {
        assert_eq!(find_receipt_date("2024-01-15 14:02"), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn test_us_order_fallback() {
        assert_eq!(find_receipt_date("03/25/2024"), Some(ymd(2024, 3, 25)));
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(find_receipt_date("15/01/24"), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn test_earliest_date_wins() {
        let text = "2024-02-01\nValid until 31.12.2024";
        assert_eq!(find_receipt_date(text), Some(ymd(2024, 2, 1)));
    }

    #[test]
    fn test_no_date() {
        assert_eq!(find_receipt_date("Total 12.50"), None);
        assert_eq!(find_receipt_date("99.99.9999"), None);
    }
}
