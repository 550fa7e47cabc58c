use super::FetchError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// CSS selectors locating the price and the title on a product page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRules {
    pub price_selector: String,
    pub title_selector: String,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            price_selector: ".a-price-whole".to_string(),
            title_selector: "#productTitle".to_string(),
        }
    }
}

/// Site locale for rendered prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    pub grouping_separator: char,
    pub decimal_separator: char,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            grouping_separator: ',',
            decimal_separator: '.',
        }
    }
}

impl NumberFormat {
    /// Convert rendered price text such as `"1,299."` into a decimal.
    ///
    /// Grouping separators and whitespace are dropped, the decimal separator
    /// becomes `.`, and a trailing separator with no fraction is ignored.
    pub fn parse_price(&self, raw: &str) -> Result<Decimal, FetchError> {
        let mut normalized: String = raw
            .trim()
            .chars()
            .filter(|c| *c != self.grouping_separator && !c.is_whitespace())
            .map(|c| if c == self.decimal_separator { '.' } else { c })
            .collect();

        if normalized.ends_with('.') {
            normalized.pop();
        }

        let parse_failure = || FetchError::ParseFailure {
            input: raw.to_string(),
        };

        let price = Decimal::from_str(&normalized).map_err(|_| parse_failure())?;
        if price.is_sign_negative() && !price.is_zero() {
            return Err(parse_failure());
        }

        Ok(price)
    }
}

/// Trim surrounding whitespace from a page title
pub fn clean_title(raw: &str) -> String {
    raw.trim().to_string()
}
