//! The expense ledger: a CSV file of expenses addressed by row position.
//!
//! The file starts with the header `Date,Category,Description,Amount` and holds one expense per
//! row. Rows have no stable identifier. `delete` takes a 1-based position into the current listing
//! and every row after it moves up by one, so callers must re-list before deleting again.

use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{Amount, Expense, ExpenseRow, MonthlySummary, EXPENSE_HEADERS};
use crate::{utils, Result};
use anyhow::Context;
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// A handle to the expenses file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file with its header row if it does not exist. Returns `true` if the file was
    /// created.
    pub async fn initialize(&self) -> Result<bool> {
        if utils::exists(&self.path).await.pub_result(ErrorType::Io)? {
            return Ok(false);
        }
        let data = encode(&[], true).pub_result(ErrorType::Io)?;
        utils::write(&self.path, data)
            .await
            .pub_result(ErrorType::Io)?;
        debug!("Created expense file {}", self.path.display());
        Ok(true)
    }

    /// Appends an expense dated today.
    ///
    /// # Errors
    /// - `Validation` if `amount` is not a number. Nothing is written.
    /// - `Io` if the file cannot be appended to.
    pub async fn add(&self, category: &str, description: &str, amount: &str) -> Result<Expense> {
        self.add_on(Local::now().date_naive(), category, description, amount)
            .await
    }

    /// Appends an expense with an explicit date.
    pub(crate) async fn add_on(
        &self,
        date: NaiveDate,
        category: &str,
        description: &str,
        amount: &str,
    ) -> Result<Expense> {
        let amount = Amount::from_str(amount).map_err(|e| Error::validation(e.to_string()))?;
        let expense = Expense::new(date, category, description, amount);
        let mut data = encode(&[ExpenseRow::from(&expense)], false).pub_result(ErrorType::Io)?;
        // A hand-edited file may have lost its trailing newline.
        if !utils::ends_with_newline(&self.path)
            .await
            .pub_result(ErrorType::Io)?
        {
            data.insert(0, b'\n');
        }
        utils::append(&self.path, data)
            .await
            .pub_result(ErrorType::Io)?;
        debug!(
            "Added expense {} {} {}",
            expense.date(),
            expense.category(),
            expense.amount()
        );
        Ok(expense)
    }

    /// Returns all expenses in file order, or `None` if there are none.
    pub async fn list(&self) -> Result<Option<Vec<Expense>>> {
        let rows = self.read_rows().await?;
        if rows.is_empty() {
            return Ok(None);
        }
        let expenses = rows
            .iter()
            .enumerate()
            .map(|(ix, row)| to_expense(ix + 1, row))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(expenses))
    }

    /// Removes the expense at the 1-based `position` and rewrites the file. Returns the removed
    /// expense. Later positions shift down by one.
    ///
    /// # Errors
    /// - `NotFound` if `position` is outside `1..=count`. Nothing is written.
    pub async fn delete(&self, position: usize) -> Result<Expense> {
        let mut rows = self.read_rows().await?;
        if rows.is_empty() {
            return Err(Error::not_found("There are no expenses to delete"));
        }
        if position == 0 || position > rows.len() {
            return Err(Error::not_found(format!(
                "Invalid row number {position}, expected 1 to {}",
                rows.len()
            )));
        }
        let removed = to_expense(position, &rows[position - 1])?;
        rows.remove(position - 1);
        let data = encode(&rows, true).pub_result(ErrorType::Io)?;
        utils::write(&self.path, data)
            .await
            .pub_result(ErrorType::Io)?;
        debug!("Deleted expense at row {position}");
        Ok(removed)
    }

    /// Totals the expenses per `YYYY-MM` month, in first-seen order. Returns `None` if there are
    /// no expenses.
    pub async fn summarize_by_month(&self) -> Result<Option<MonthlySummary>> {
        let rows = self.read_rows().await?;
        let mut summary = MonthlySummary::default();
        for (ix, row) in rows.iter().enumerate() {
            let amount = parse_stored_amount(ix + 1, row)?;
            summary.add(row.month(), amount)?;
        }
        if summary.is_empty() {
            return Ok(None);
        }
        Ok(Some(summary))
    }

    async fn read_rows(&self) -> Result<Vec<ExpenseRow>> {
        let bytes = utils::read_bytes(&self.path)
            .await
            .pub_result(ErrorType::Io)?;
        let mut reader = csv::ReaderBuilder::new().from_reader(bytes.as_slice());
        let mut rows = Vec::new();
        for (ix, result) in reader.deserialize::<ExpenseRow>().enumerate() {
            let row = result
                .with_context(|| {
                    format!(
                        "Unable to read row {} of {}",
                        ix + 1,
                        self.path.display()
                    )
                })
                .pub_result(ErrorType::Corrupt)?;
            rows.push(row);
        }
        Ok(rows)
    }
}

/// Parses a 1-based row position typed by a user.
pub fn parse_position(s: &str) -> Result<usize> {
    s.trim()
        .parse::<usize>()
        .map_err(|_| Error::validation(format!("Invalid row number '{}'", s.trim())))
}

fn to_expense(position: usize, row: &ExpenseRow) -> Result<Expense> {
    let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d").map_err(|_| {
        Error::corrupt(format!(
            "Row {position} has an invalid date '{}'",
            row.date
        ))
    })?;
    let amount = parse_stored_amount(position, row)?;
    Ok(Expense {
        date,
        category: row.category.clone(),
        description: row.description.clone(),
        amount,
    })
}

fn parse_stored_amount(position: usize, row: &ExpenseRow) -> Result<Amount> {
    Amount::from_str(&row.amount)
        .map_err(|e| Error::corrupt(format!("Row {position} has an invalid amount: {e}")))
}

/// Writes `rows` as CSV, optionally preceded by the header row.
fn encode(rows: &[ExpenseRow], header: bool) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if header {
        writer
            .write_record(EXPENSE_HEADERS)
            .context("Unable to write the expense header")?;
    }
    for row in rows {
        writer
            .serialize(row)
            .context("Unable to serialize an expense")?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to flush the expense writer: {e}"))
}
