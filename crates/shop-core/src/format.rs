use chrono::NaiveDate;

/// Formats currency amounts for presentation.
pub trait CurrencyFormatter: Send + Sync {
    fn format_amount(&self, amount: f64, currency: &str) -> String;
}

/// Formats dates for presentation.
pub trait DateFormatter: Send + Sync {
    fn format_date(&self, date: NaiveDate) -> String;
}

/// Fixed-precision formatter: `12.50 EUR`, dates as `YYYY-MM-DD` unless overridden.
#[derive(Debug, Clone)]
pub struct PlainFormatters {
    pub precision: usize,
    pub date_pattern: String,
}

impl Default for PlainFormatters {
    fn default() -> Self {
        Self {
            precision: 2,
            date_pattern: "%Y-%m-%d".into(),
        }
    }
}

impl CurrencyFormatter for PlainFormatters {
    fn format_amount(&self, amount: f64, currency: &str) -> String {
        // Avoid printing "-0.00" for rounding noise.
        let amount = if amount.abs() < 0.5 / 10f64.powi(self.precision as i32) {
            0.0
        } else {
            amount
        };
        if currency.is_empty() {
            format!("{amount:.prec$}", prec = self.precision)
        } else {
            format!("{amount:.prec$} {currency}", prec = self.precision)
        }
    }
}

impl DateFormatter for PlainFormatters {
    fn format_date(&self, date: NaiveDate) -> String {
        date.format(&self.date_pattern).to_string()
    }
}
