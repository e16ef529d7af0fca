use std::fmt::Write;

use chrono::NaiveDate;
use shop_config::Config;
use shop_core::{CurrencyFormatter, DateFormatter};

const ISO_DATE: &str = "%Y-%m-%d";

/// Locale-aware money and date formatting driven by [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigFormatters {
    pub decimal_separator: char,
    pub grouping_separator: char,
    pub precision: usize,
    pub date_pattern: String,
}

impl ConfigFormatters {
    pub fn from_config(config: &Config) -> Self {
        let (decimal_separator, grouping_separator) = if config.is_spanish() {
            (',', '.')
        } else {
            ('.', ',')
        };
        Self {
            decimal_separator,
            grouping_separator,
            precision: usize::from(config.currency_precision),
            date_pattern: config.date_format.clone(),
        }
    }

    fn format_number(&self, value: f64) -> String {
        let raw = format!("{:.prec$}", value, prec = self.precision);
        let (int_part, frac_part) = match raw.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (raw.as_str(), None),
        };
        let mut body = group_digits(int_part, self.grouping_separator);
        if let Some(frac) = frac_part {
            body.push(self.decimal_separator);
            body.push_str(frac);
        }
        body
    }
}

impl CurrencyFormatter for ConfigFormatters {
    fn format_amount(&self, amount: f64, currency: &str) -> String {
        let epsilon = 0.5 / 10f64.powi(self.precision as i32);
        let negative = amount < 0.0 && amount.abs() >= epsilon;
        let mut body = self.format_number(amount.abs());
        if negative {
            body.insert(0, '-');
        }
        if currency.is_empty() {
            body
        } else {
            format!("{body} {currency}")
        }
    }
}

impl DateFormatter for ConfigFormatters {
    /// Falls back to ISO dates when the pattern cannot render a plain date.
    fn format_date(&self, date: NaiveDate) -> String {
        let mut rendered = String::new();
        match write!(rendered, "{}", date.format(&self.date_pattern)) {
            Ok(()) => rendered,
            Err(_) => date.format(ISO_DATE).to_string(),
        }
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    for (index, ch) in digits.chars().enumerate() {
        if index != 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_locale_groups_with_commas() {
        let fmt = ConfigFormatters::from_config(&Config::default());
        assert_eq!(fmt.format_amount(1234.5, "EUR"), "1,234.50 EUR");
        assert_eq!(fmt.format_amount(-12.0, "EUR"), "-12.00 EUR");
        assert_eq!(fmt.format_amount(-0.001, ""), "0.00");
        assert_eq!(fmt.format_amount(999.0, "EUR"), "999.00 EUR");
    }

    #[test]
    fn spanish_locale_swaps_separators() {
        let config = Config {
            locale: "es-ES".into(),
            date_format: "%d/%m/%Y".into(),
            ..Config::default()
        };
        let fmt = ConfigFormatters::from_config(&config);
        assert_eq!(fmt.format_amount(1234567.891, "EUR"), "1.234.567,89 EUR");
        let date = NaiveDate::from_ymd_opt(2026, 7, 4).unwrap();
        assert_eq!(fmt.format_date(date), "04/07/2026");
    }

    #[test]
    fn unusable_date_patterns_fall_back_to_iso() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 4).unwrap();
        for pattern in ["%Q", "%H:%M"] {
            let fmt = ConfigFormatters {
                date_pattern: pattern.into(),
                ..ConfigFormatters::from_config(&Config::default())
            };
            assert_eq!(fmt.format_date(date), "2026-07-04");
        }
    }

    #[test]
    fn zero_precision_has_no_decimal_separator() {
        let config = Config {
            currency: "JPY".into(),
            currency_precision: 0,
            ..Config::default()
        };
        let fmt = ConfigFormatters::from_config(&config);
        assert_eq!(fmt.format_amount(1500.0, "JPY"), "1,500 JPY");
    }
}
