use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::models::{Transaction, TransactionType};

/// Aggregate figures for one user over one calendar month, fed to the
/// insight generator and the report email.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonthlyStats {
    pub total_income: BigDecimal,
    pub total_expenses: BigDecimal,
    pub by_category: BTreeMap<String, BigDecimal>,
    pub transaction_count: usize,
}

impl MonthlyStats {
    /// Fold a month's transactions into totals. Expenses are additionally
    /// broken down per category; income is not.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut stats = MonthlyStats {
            transaction_count: transactions.len(),
            ..Default::default()
        };

        for txn in transactions {
            match txn.transaction_type {
                TransactionType::Income => {
                    stats.total_income += &txn.amount;
                }
                TransactionType::Expense => {
                    stats.total_expenses += &txn.amount;
                    *stats
                        .by_category
                        .entry(txn.category.clone())
                        .or_insert_with(BigDecimal::default) += &txn.amount;
                }
            }
        }

        stats
    }

    pub fn net(&self) -> BigDecimal {
        &self.total_income - &self.total_expenses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionStatus;
    use chrono::{TimeZone, Utc};

    fn txn(transaction_type: TransactionType, amount: i64, category: &str) -> Transaction {
        Transaction {
            id: uuid::Uuid::new_v4(),
            user_id: uuid::Uuid::new_v4(),
            account_id: uuid::Uuid::new_v4(),
            transaction_type,
            amount: BigDecimal::from(amount),
            description: None,
            date: Utc.with_ymd_and_hms(2025, 4, 15, 0, 0, 0).unwrap(),
            category: category.to_string(),
            is_recurring: false,
            recurring_interval: None,
            last_processed: None,
            next_recurring_date: None,
            status: TransactionStatus::Completed,
            created_at: Utc.with_ymd_and_hms(2025, 4, 15, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn folds_income_and_expenses_separately() {
        let transactions = vec![
            txn(TransactionType::Income, 3000, "salary"),
            txn(TransactionType::Expense, 800, "rent"),
            txn(TransactionType::Expense, 200, "groceries"),
            txn(TransactionType::Expense, 100, "groceries"),
        ];

        let stats = MonthlyStats::from_transactions(&transactions);

        assert_eq!(stats.total_income, BigDecimal::from(3000));
        assert_eq!(stats.total_expenses, BigDecimal::from(1100));
        assert_eq!(stats.by_category.len(), 2);
        assert_eq!(stats.by_category["groceries"], BigDecimal::from(300));
        assert_eq!(stats.by_category["rent"], BigDecimal::from(800));
        assert_eq!(stats.transaction_count, 4);
        assert_eq!(stats.net(), BigDecimal::from(1900));
    }

    #[test]
    fn empty_month_produces_zero_stats() {
        let stats = MonthlyStats::from_transactions(&[]);

        assert_eq!(stats.total_income, BigDecimal::default());
        assert_eq!(stats.total_expenses, BigDecimal::default());
        assert!(stats.by_category.is_empty());
        assert_eq!(stats.transaction_count, 0);
    }

    #[test]
    fn income_is_not_broken_down_by_category() {
        let stats = MonthlyStats::from_transactions(&[txn(TransactionType::Income, 500, "salary")]);
        assert!(stats.by_category.is_empty());
    }
}
