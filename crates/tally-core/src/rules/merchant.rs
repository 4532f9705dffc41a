//! Merchant name guess from the receipt header.

const MAX_MERCHANT_LEN: usize = 80;

/// First line that reads like a name: at least two letters and no more
/// digits than letters.
pub fn guess_merchant(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| {
            let letters = line.chars().filter(|c| c.is_alphabetic()).count();
            let digits = line.chars().filter(|c| c.is_ascii_digit()).count();
            letters >= 2 && digits <= letters
        })
        .map(|line| line.chars().take(MAX_MERCHANT_LEN).collect::<String>().trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_named_line() {
        let text = "\n  \n 0042 \nPIZZA HUT #231\n12 Main St\nTotal 250.75";
        assert_eq!(guess_merchant(text), Some("PIZZA HUT #231".to_string()));
    }

    #[test]
    fn test_skips_numeric_lines() {
        let text = "12/03/2024 14:55\nCorner Cafe";
        assert_eq!(guess_merchant(text), Some("Corner Cafe".to_string()));
    }

    #[test]
    fn test_truncates_long_lines() {
        let text = "A".repeat(200);
        assert_eq!(guess_merchant(&text).map(|m| m.len()), Some(80));
    }

    #[test]
    fn test_nothing_found() {
        assert_eq!(guess_merchant(""), None);
        assert_eq!(guess_merchant("123\n45.00"), None);
    }
}
