use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A ledger account. The balance is maintained by the transaction write
/// paths: every insert or delete of a realized transaction adjusts it in
/// the same database transaction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub name: String,
    pub balance: BigDecimal,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccount {
    pub name: String,
    #[serde(default)]
    pub balance: Option<BigDecimal>,
    #[serde(default)]
    pub is_default: bool,
}
