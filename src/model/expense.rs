use crate::model::Amount;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The header row of the expenses file.
pub const EXPENSE_HEADERS: [&str; 4] = ["Date", "Category", "Description", "Amount"];

/// One row of the expenses file.
///
/// Rows have no identifier of their own. They are addressed by their 1-based position in the file,
/// and that position shifts down by one for every row deleted above it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Expense {
    pub(crate) date: NaiveDate,
    pub(crate) category: String,
    pub(crate) description: String,
    pub(crate) amount: Amount,
}

impl Expense {
    /// Creates an expense, title-casing `category`.
    pub fn new(
        date: NaiveDate,
        category: impl AsRef<str>,
        description: impl Into<String>,
        amount: Amount,
    ) -> Self {
        Self {
            date,
            category: title_case(category.as_ref()),
            description: description.into(),
            amount,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }
}

/// A raw expenses file row.
///
/// The ledger reads rows loosely so a hand-edited file with a bad date or amount is reported as
/// corrupt with its position instead of failing inside the CSV reader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ExpenseRow {
    pub(crate) date: String,
    pub(crate) category: String,
    pub(crate) description: String,
    pub(crate) amount: String,
}

impl From<&Expense> for ExpenseRow {
    fn from(e: &Expense) -> Self {
        Self {
            date: e.date.format("%Y-%m-%d").to_string(),
            category: e.category.clone(),
            description: e.description.clone(),
            amount: e.amount.to_string(),
        }
    }
}

impl ExpenseRow {
    /// The `YYYY-MM` key this row is grouped under.
    pub(crate) fn month(&self) -> &str {
        match self.date.char_indices().nth(7) {
            Some((ix, _)) => &self.date[..ix],
            None => &self.date,
        }
    }
}

/// Title-cases `s` the way the ledger normalizes categories: a letter that follows a non-letter
/// (or starts the string) is upper-cased and every other letter is lower-cased.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// The total spent in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthTotal {
    /// `YYYY-MM`
    pub month: String,
    pub total: Amount,
}

/// Per-month totals in the order each month was first seen in the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    months: Vec<MonthTotal>,
}

impl MonthlySummary {
    /// Adds `amount` to the total for `month`.
    ///
    /// # Errors
    /// - `ErrorType::Corrupt` if the month's total no longer fits in an `Amount`.
    pub(crate) fn add(&mut self, month: &str, amount: Amount) -> Result<()> {
        match self.months.iter_mut().find(|m| m.month == month) {
            Some(existing) => {
                existing.total = existing.total.checked_add(amount).ok_or_else(|| {
                    Error::corrupt(format!("The total for {month} is too large to represent"))
                })?;
            }
            None => self.months.push(MonthTotal {
                month: month.to_string(),
                total: amount,
            }),
        }
        Ok(())
    }

    pub fn months(&self) -> &[MonthTotal] {
        &self.months
    }

    /// The total for `month` (`YYYY-MM`), if any expense fell in it.
    pub fn get(&self, month: &str) -> Option<Amount> {
        self.months
            .iter()
            .find(|m| m.month == month)
            .map(|m| m.total)
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("food"), "Food");
        assert_eq!(title_case("FOOD court"), "Food Court");
        assert_eq!(title_case("bills/utilities"), "Bills/Utilities");
        assert_eq!(title_case("mcdonald's"), "Mcdonald'S");
        assert_eq!(title_case("a1b"), "A1B");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_new_title_cases_category() {
        let e = Expense::new(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            "travel",
            "Train",
            Amount::from_str("12").unwrap(),
        );
        assert_eq!(e.category(), "Travel");
    }

    #[test]
    fn test_row_month() {
        let mut row = ExpenseRow {
            date: "2024-01-15".to_string(),
            ..ExpenseRow::default()
        };
        assert_eq!(row.month(), "2024-01");
        row.date = "2024".to_string();
        assert_eq!(row.month(), "2024");
    }

    #[test]
    fn test_summary_keeps_first_seen_order() {
        let mut summary = MonthlySummary::default();
        summary.add("2024-02", Amount::from_str("7").unwrap()).unwrap();
        summary.add("2024-01", Amount::from_str("10").unwrap()).unwrap();
        summary.add("2024-02", Amount::from_str("1").unwrap()).unwrap();
        let months: Vec<&str> = summary.months().iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2024-02", "2024-01"]);
        assert_eq!(summary.get("2024-02"), Some(Amount::from_str("8").unwrap()));
        assert_eq!(summary.get("2023-12"), None);
    }

    #[test]
    fn test_summary_overflow_is_an_error() {
        let big = Amount::from_str("7e28").unwrap();
        let mut summary = MonthlySummary::default();
        summary.add("2024-03", big).unwrap();
        let err = summary.add("2024-03", big).unwrap_err();
        assert_eq!(err.error_type(), crate::ErrorType::Corrupt);
        assert_eq!(summary.get("2024-03"), Some(big));
    }
}
