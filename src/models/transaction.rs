use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Payout,
}

/// `Pending` is reserved for asynchronous settlement; every transaction
/// written by this crate is `Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Success,
}

/// Append-only ledger entry. Never mutated after insert; financial history
/// is reconstructed by reading these rows back.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Transaction {
    pub id: i32,
    pub amount: BigDecimal,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub user_id: i32,
    pub milestone_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}
