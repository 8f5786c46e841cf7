//! Expense command handlers.

use crate::args::{ExpenseAddArgs, ExpenseDeleteArgs};
use crate::commands::{plural, table, Out};
use crate::ledger::parse_position;
use crate::model::{Expense, MonthlySummary};
use crate::{Config, Result};
use comfy_table::{Cell, CellAlignment};

const LIST_HEADERS: [&str; 5] = ["#", "Date", "Category", "Description", "Amount"];

/// Records an expense dated today. An amount that is not a number is rejected before anything is
/// written.
pub async fn expense_add(config: &Config, args: &ExpenseAddArgs) -> Result<Out<Expense>> {
    let expense = config
        .ledger()
        .add(args.category(), args.description(), args.amount())
        .await?;
    let message = format!(
        "Added {} expense of {} on {}",
        expense.category(),
        expense.amount().grouped(),
        expense.date()
    );
    Ok(Out::new(message, expense))
}

/// Lists every expense with its 1-based position.
pub async fn expense_list(config: &Config) -> Result<Out<Vec<Expense>>> {
    let Some(expenses) = config.ledger().list().await? else {
        return Ok(Out::new("No expenses recorded yet", Vec::new()));
    };
    let mut rendered = table(&LIST_HEADERS);
    for (ix, e) in expenses.iter().enumerate() {
        rendered.add_row(vec![
            Cell::new(ix + 1),
            Cell::new(e.date()),
            Cell::new(e.category()),
            Cell::new(e.description()),
            Cell::new(e.amount().grouped()).set_alignment(CellAlignment::Right),
        ]);
    }
    let message = format!(
        "{} expense{}\n{rendered}",
        expenses.len(),
        plural(expenses.len()),
    );
    Ok(Out::new(message, expenses))
}

/// Deletes the expense at the given position. Every later expense moves up one position.
pub async fn expense_delete(config: &Config, args: &ExpenseDeleteArgs) -> Result<Out<Expense>> {
    let position = parse_position(args.position())?;
    let removed = config.ledger().delete(position).await?;
    let message = format!(
        "Deleted expense {position}: {} {} {}",
        removed.date(),
        removed.category(),
        removed.amount().grouped()
    );
    Ok(Out::new(message, removed))
}

/// Totals expenses by month in the order each month first appears.
pub async fn expense_summary(config: &Config) -> Result<Out<MonthlySummary>> {
    let Some(summary) = config.ledger().summarize_by_month().await? else {
        return Ok(Out::new(
            "No expenses recorded yet",
            MonthlySummary::default(),
        ));
    };
    let mut rendered = table(&["Month", "Total"]);
    for m in summary.months() {
        rendered.add_row(vec![
            Cell::new(&m.month),
            Cell::new(m.total.grouped()).set_alignment(CellAlignment::Right),
        ]);
    }
    let message = format!("Monthly totals\n{rendered}");
    Ok(Out::new(message, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use crate::test::TestEnv;
    use crate::ErrorType;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_expense_add_and_list() {
        let env = TestEnv::new().await;
        let config = env.config();

        let out = expense_add(&config, &ExpenseAddArgs::new("food", "Lunch", "1234.5"))
            .await
            .unwrap();
        assert!(out.message().contains("Food"));
        assert!(out.message().contains("1,234.50"));

        expense_add(&config, &ExpenseAddArgs::new("travel", "Bus", "2"))
            .await
            .unwrap();

        let out = expense_list(&config).await.unwrap();
        let expenses = out.structure().unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].description(), "Lunch");
        assert!(out.message().starts_with("2 expenses\n"));
        assert!(out.message().contains("Travel"));
    }

    #[tokio::test]
    async fn test_expense_add_invalid_amount() {
        let env = TestEnv::new().await;
        let config = env.config();
        let err = expense_add(&config, &ExpenseAddArgs::new("food", "Lunch", "abc"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        let out = expense_list(&config).await.unwrap();
        assert!(out.structure().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expense_delete_by_position() {
        let env = TestEnv::new().await;
        let config = env.config();
        for (category, amount) in [("a", "1"), ("b", "2"), ("c", "3")] {
            expense_add(&config, &ExpenseAddArgs::new(category, "", amount))
                .await
                .unwrap();
        }

        let out = expense_delete(&config, &ExpenseDeleteArgs::new("2"))
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().category(), "B");

        let remaining = expense_list(&config).await.unwrap();
        let categories: Vec<&str> = remaining
            .structure()
            .unwrap()
            .iter()
            .map(|e| e.category())
            .collect();
        assert_eq!(categories, vec!["A", "C"]);

        let err = expense_delete(&config, &ExpenseDeleteArgs::new("abc"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        let err = expense_delete(&config, &ExpenseDeleteArgs::new("3"))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotFound);
    }

    #[tokio::test]
    async fn test_expense_summary() {
        let env = TestEnv::new().await;
        let config = env.config();
        let empty = expense_summary(&config).await.unwrap();
        assert!(empty.structure().unwrap().is_empty());

        expense_add(&config, &ExpenseAddArgs::new("food", "", "10"))
            .await
            .unwrap();
        expense_add(&config, &ExpenseAddArgs::new("food", "", "5.25"))
            .await
            .unwrap();
        let out = expense_summary(&config).await.unwrap();
        let summary = out.structure().unwrap();
        assert_eq!(summary.months().len(), 1);
        assert_eq!(summary.months()[0].total, Amount::from_str("15.25").unwrap());
        assert!(out.message().contains("15.25"));
    }
}
