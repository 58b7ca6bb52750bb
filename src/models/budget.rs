use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Monthly spending cap for a user, checked against the default account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Budget {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub amount: BigDecimal,
    pub last_alert_sent: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpsertBudget {
    pub amount: BigDecimal,
}
