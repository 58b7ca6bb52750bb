use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Income,
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// How often a recurring transaction repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "recurring_interval", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurringInterval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// A ledger entry. Recurring rows are templates: the recurring-transaction
/// processor turns each due template into a realized (non-recurring) row
/// and advances `last_processed` / `next_recurring_date` on the template.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub account_id: uuid::Uuid,
    pub transaction_type: TransactionType,
    pub amount: BigDecimal,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub category: String,
    pub is_recurring: bool,
    pub recurring_interval: Option<RecurringInterval>,
    pub last_processed: Option<DateTime<Utc>>,
    pub next_recurring_date: Option<DateTime<Utc>>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTransaction {
    pub account_id: uuid::Uuid,
    pub transaction_type: TransactionType,
    pub amount: BigDecimal,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub category: String,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurring_interval: Option<RecurringInterval>,
}

impl Transaction {
    /// Balance delta this entry contributes: income positive, expense negative.
    pub fn signed_amount(&self) -> BigDecimal {
        match self.transaction_type {
            TransactionType::Income => self.amount.clone(),
            TransactionType::Expense => -self.amount.clone(),
        }
    }

    /// Whether a recurring template is due for processing at `now`.
    ///
    /// A template that has never been processed is due immediately;
    /// otherwise it is due once `next_recurring_date` has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.is_recurring || self.status != TransactionStatus::Completed {
            return false;
        }
        match self.last_processed {
            None => true,
            Some(_) => self.next_recurring_date.is_some_and(|next| next <= now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn template(
        last_processed: Option<DateTime<Utc>>,
        next: Option<DateTime<Utc>>,
    ) -> Transaction {
        Transaction {
            id: uuid::Uuid::new_v4(),
            user_id: uuid::Uuid::new_v4(),
            account_id: uuid::Uuid::new_v4(),
            transaction_type: TransactionType::Expense,
            amount: BigDecimal::from(50),
            description: Some("Gym membership".to_string()),
            date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            category: "health".to_string(),
            is_recurring: true,
            recurring_interval: Some(RecurringInterval::Monthly),
            last_processed,
            next_recurring_date: next,
            status: TransactionStatus::Completed,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn never_processed_template_is_due() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert!(template(None, None).is_due(now));
    }

    #[test]
    fn template_with_past_next_date_is_due() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let past = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        assert!(template(Some(past), Some(past)).is_due(now));
    }

    #[test]
    fn template_with_future_next_date_is_not_due() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let future = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        assert!(!template(Some(now), Some(future)).is_due(now));
    }

    #[test]
    fn non_recurring_entry_is_never_due() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut txn = template(None, None);
        txn.is_recurring = false;
        assert!(!txn.is_due(now));
    }

    #[test]
    fn pending_template_is_not_due() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut txn = template(None, None);
        txn.status = TransactionStatus::Pending;
        assert!(!txn.is_due(now));
    }

    #[test]
    fn signed_amount_is_negative_for_expenses() {
        let txn = template(None, None);
        assert_eq!(txn.signed_amount(), BigDecimal::from(-50));
    }
}
