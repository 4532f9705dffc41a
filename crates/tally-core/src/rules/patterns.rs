//! Common regex patterns for receipt text.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 1-3 digits, thousands groups, optional 1-2 digit fraction.
    // Separators: comma, period or space.
    pub static ref AMOUNT_TOKEN: Regex = Regex::new(
        r"[0-9]{1,3}(?:[,. ][0-9]{3})*(?:[,. ][0-9]{1,2})?"
    ).unwrap();

    pub static ref AMOUNT_SEPARATOR: Regex = Regex::new(r"[,. ]").unwrap();

    // DD.MM.YYYY, DD/MM/YY, DD-MM-YYYY (or MM/DD when the day cannot be a month)
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();
}
