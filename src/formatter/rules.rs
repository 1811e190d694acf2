//! Classification rules used by the formatter stages.
//!
//! Each rule is a small function over plain text so it can be checked on its
//! own; the stages in the parent module only decide where the rules apply.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

/// Marker that opens a list item in chat-service replies.
pub const BULLET: char = '•';

/// Digit runs at or below this length are never regrouped.
pub const MAX_UNGROUPED_LEN: usize = 4;

static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("url pattern compiles"));

static DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("digit run pattern compiles"));

/// A line is a list item when its first non-blank character is the bullet.
pub fn is_bullet_line(line: &str) -> bool {
    line.trim_start().starts_with(BULLET)
}

/// Visible text of a list item: the bullet and surrounding whitespace removed.
pub fn strip_bullet(line: &str) -> &str {
    let trimmed = line.trim_start();
    trimmed.strip_prefix(BULLET).unwrap_or(trimmed).trim()
}

/// Byte ranges of every http(s) URL in `text`. A URL ends at the first
/// whitespace character.
pub fn find_urls(text: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    URL.find_iter(text).map(|m| m.range())
}

/// Byte ranges of every maximal run of ASCII digits in `text`.
pub fn digit_runs(text: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    DIGIT_RUN.find_iter(text).map(|m| m.range())
}

/// `19xx` and `20xx`.
pub fn is_calendar_year(run: &str) -> bool {
    run.len() == 4
        && run.bytes().all(|b| b.is_ascii_digit())
        && (run.starts_with("19") || run.starts_with("20"))
}

/// True when the text right after a digit run is a decimal point followed by
/// a word character, as in `12.5` or `3.x`.
pub fn is_decimal_fraction(after: &str) -> bool {
    let mut chars = after.chars();
    chars.next() == Some('.')
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether a maximal digit run gets rewritten into lakh/crore grouping.
/// `after` is the text immediately following the run.
pub fn qualifies_for_grouping(run: &str, after: &str) -> bool {
    if run.len() <= MAX_UNGROUPED_LEN || run.starts_with('0') {
        return false;
    }
    if is_decimal_fraction(after) {
        return false;
    }
    !is_calendar_year(run)
}

/// Groups digits South-Asian style: three on the right, then pairs.
///
/// `1234567` becomes `12,34,567`, `100000` becomes `1,00,000`.
pub fn group_south_asian(digits: &str) -> String {
    let len = digits.chars().count();
    if len <= 3 {
        return digits.to_string();
    }

    let head_len = len - 3;
    let mut out = String::with_capacity(digits.len() + head_len / 2 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && i <= head_len && (head_len - i) % 2 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Short codes such as emergency numbers: exactly three or four digits.
pub fn is_short_number(run: &str) -> bool {
    matches!(run.len(), 3 | 4) && run.bytes().all(|b| b.is_ascii_digit())
}

/// Rupee amount with South-Asian grouping, e.g. `₹1,50,000`.
pub fn format_indian_currency(amount: u64) -> String {
    format!("₹{}", group_south_asian(&amount.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullet_lines_allow_leading_whitespace() {
        assert!(is_bullet_line("• Drink water"));
        assert!(is_bullet_line("   •Rest"));
        assert!(!is_bullet_line("Stay home • rest"));
        assert!(!is_bullet_line(""));
    }

    #[test]
    fn strip_bullet_removes_marker_and_padding() {
        assert_eq!(strip_bullet("  •   Wash hands  "), "Wash hands");
        assert_eq!(strip_bullet("•"), "");
    }

    #[test]
    fn urls_stop_at_whitespace() {
        let text = "see http://a.org/x and https://b.com/y?z=1\nnext";
        let found: Vec<&str> = find_urls(text).map(|r| &text[r]).collect();
        assert_eq!(found, vec!["http://a.org/x", "https://b.com/y?z=1"]);
    }

    #[test]
    fn ftp_and_bare_domains_are_not_urls() {
        assert_eq!(find_urls("ftp://host www.example.com http:/broken").count(), 0);
    }

    #[test]
    fn digit_runs_are_maximal() {
        let text = "a12b345 6789";
        let runs: Vec<&str> = digit_runs(text).map(|r| &text[r]).collect();
        assert_eq!(runs, vec!["12", "345", "6789"]);
    }

    #[test]
    fn calendar_years() {
        assert!(is_calendar_year("1999"));
        assert!(is_calendar_year("2023"));
        assert!(!is_calendar_year("2123"));
        assert!(!is_calendar_year("20234"));
    }

    #[test]
    fn decimal_fraction_needs_word_char_after_point() {
        assert!(is_decimal_fraction(".5 mg"));
        assert!(is_decimal_fraction(".x"));
        assert!(!is_decimal_fraction(". Next sentence"));
        assert!(!is_decimal_fraction("."));
        assert!(!is_decimal_fraction(" units"));
    }

    #[test]
    fn grouping_skips_short_leading_zero_and_fractional_runs() {
        assert!(!qualifies_for_grouping("9999", ""));
        assert!(!qualifies_for_grouping("012345", ""));
        assert!(!qualifies_for_grouping("123456", ".78"));
        assert!(qualifies_for_grouping("123456", ". Done"));
        assert!(qualifies_for_grouping("10000", " cases"));
    }

    #[test]
    fn groups_lakh_and_crore() {
        assert_eq!(group_south_asian("999"), "999");
        assert_eq!(group_south_asian("12345"), "12,345");
        assert_eq!(group_south_asian("100000"), "1,00,000");
        assert_eq!(group_south_asian("1234567"), "12,34,567");
        assert_eq!(group_south_asian("10000000"), "1,00,00,000");
        assert_eq!(group_south_asian("123456789012"), "1,23,45,67,89,012");
    }

    #[test]
    fn short_numbers() {
        assert!(is_short_number("911"));
        assert!(is_short_number("1075"));
        assert!(!is_short_number("12"));
        assert!(!is_short_number("12345"));
    }

    #[test]
    fn currency() {
        assert_eq!(format_indian_currency(500), "₹500");
        assert_eq!(format_indian_currency(150000), "₹1,50,000");
    }
}
