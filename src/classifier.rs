//! Input Classifier
//!
//! Reads free-text chat messages:
//! - Loan selection: a product keyword anywhere in the message (e.g. "I want an AUTO loan")
//! - Numeric answers: the first run of digits (e.g. "about 50000 a month")

use crate::models::LoanType;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DIGIT_RUN: Regex = Regex::new(r"[0-9]+").expect("digit pattern is valid");
}

/// Loan type named in the message, if any.
///
/// Case-insensitive substring match. When several keywords appear the
/// first one in canonical product order wins, not the first in the text.
pub fn detect_loan_type(message: &str) -> Option<LoanType> {
    let lowered = message.to_lowercase();

    LoanType::ALL
        .iter()
        .copied()
        .find(|loan_type| lowered.contains(loan_type.keyword()))
}

/// First contiguous run of ASCII digits in the message.
///
/// Returns `None` when there are no digits or the run does not fit in a `u64`.
pub fn extract_first_integer(message: &str) -> Option<u64> {
    DIGIT_RUN
        .find(message)
        .and_then(|digits| digits.as_str().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_each_product() {
        let cases = vec![
            ("personal loan", LoanType::Personal),
            ("I need an AUTO loan", LoanType::Auto),
            ("Mortgage please", LoanType::Mortgage),
            ("mortgage", LoanType::Mortgage),
        ];

        for (message, expected) in cases {
            assert_eq!(detect_loan_type(message), Some(expected), "{}", message);
        }
    }

    #[test]
    fn test_no_keyword() {
        assert_eq!(detect_loan_type("hello there"), None);
        assert_eq!(detect_loan_type("50000"), None);
        assert_eq!(detect_loan_type(""), None);
    }

    #[test]
    fn test_keyword_precedence_is_canonical_order() {
        assert_eq!(
            detect_loan_type("mortgage or maybe auto"),
            Some(LoanType::Auto)
        );
        assert_eq!(
            detect_loan_type("auto vs personal"),
            Some(LoanType::Personal)
        );
    }

    #[test]
    fn test_substring_match() {
        // "automobile" contains "auto"
        assert_eq!(detect_loan_type("automobile finance"), Some(LoanType::Auto));
    }

    #[test]
    fn test_extract_first_integer() {
        assert_eq!(extract_first_integer("50000"), Some(50000));
        assert_eq!(extract_first_integer("my income is 75000 per month"), Some(75000));
        assert_eq!(extract_first_integer("between 10 and 20"), Some(10));
        assert_eq!(extract_first_integer("50,000"), Some(50));
        assert_eq!(extract_first_integer("-300"), Some(300));
        assert_eq!(extract_first_integer("007"), Some(7));
    }

    #[test]
    fn test_extract_rejects_missing_or_oversized() {
        assert_eq!(extract_first_integer("fifty thousand"), None);
        assert_eq!(extract_first_integer(""), None);
        assert_eq!(extract_first_integer("99999999999999999999999"), None);
    }
}
