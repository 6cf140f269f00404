//! Data models for a search run.
//!
//! - [`Article`]: one news item extracted from the results list
//! - [`SearchQuery`]: the validated inputs of a run
//!
//! An [`Article`] is written once, when the item is extracted, and only read
//! afterwards. The spreadsheet columns that depend on the search phrase are
//! derived on demand by [`Article::phrase_count`] and
//! [`Article::mentions_money`].

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Amount of money: `$11.1`, `$111,111.11`, `11 dollars`, `11 USD`.
static MONEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\$\d{1,3}(,\d{3})*(\.\d{1,2})?|\d{1,3}(,\d{3})*(\.\d{1,2})?\s*dollars|\d{1,3}(,\d{3})*(\.\d{1,2})?\s*usd",
    )
    .expect("money pattern is valid")
});

/// A news item extracted from the search results.
///
/// `image_name` is the stem of the downloaded thumbnail inside the output
/// directory, or the download placeholder when the image could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub image_name: String,
}

impl Article {
    /// Count case-insensitive occurrences of `phrase` in the title plus the description.
    ///
    /// Occurrences do not overlap, and an empty phrase counts zero.
    pub fn phrase_count(&self, phrase: &str) -> usize {
        if phrase.is_empty() {
            return 0;
        }
        let phrase = phrase.to_lowercase();
        self.title.to_lowercase().matches(&phrase).count()
            + self.description.to_lowercase().matches(&phrase).count()
    }

    /// Whether the title or the description mentions an amount of money.
    pub fn mentions_money(&self) -> bool {
        MONEY_PATTERN.is_match(&self.title) || MONEY_PATTERN.is_match(&self.description)
    }
}

/// Validated inputs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub phrase: String,
    pub category: String,
    /// Recency window in calendar months. Zero behaves like one.
    pub months: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, description: &str) -> Article {
        Article {
            title: title.to_string(),
            description: description.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            image_name: "image".to_string(),
        }
    }

    #[test]
    fn test_phrase_count_sums_both_fields_ignoring_case() {
        let a = article("Dollars and Dollars", "dollars");
        assert_eq!(a.phrase_count("dollar"), 3);
        assert_eq!(a.phrase_count("DOLLARS"), 3);
    }

    #[test]
    fn test_phrase_count_absent_or_empty() {
        let a = article("Budget talks", "Parliament resumes");
        assert_eq!(a.phrase_count("election"), 0);
        assert_eq!(a.phrase_count(""), 0);
    }

    #[test]
    fn test_phrase_count_multi_word() {
        let a = article(
            "Climate change summit",
            "Leaders discuss climate change and climate CHANGE",
        );
        assert_eq!(a.phrase_count("climate change"), 3);
    }

    #[test]
    fn test_mentions_money_dollar_sign() {
        assert!(article("Stadium costs $1,234.50 per seat", "").mentions_money());
        assert!(article("", "A $11.1 fine").mentions_money());
    }

    #[test]
    fn test_mentions_money_words() {
        assert!(article("Grant of 1234 dollars", "").mentions_money());
        assert!(article("", "Valued at 500 USD").mentions_money());
        assert!(article("", "worth 20usd today").mentions_money());
    }

    #[test]
    fn test_mentions_money_absent() {
        let a = article("Dollars and sense", "Ten people attended in 2024");
        assert!(!a.mentions_money());
    }
}
