//! # Payment Model
//!
//! One row per payment id, enforced by the primary key. That uniqueness is
//! the core idempotency anchor for the charge step: a retried charge finds
//! the committed row and short-circuits instead of charging again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};

/// Payment row status values.
pub mod status {
    pub const PENDING: &str = "pending";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
}

/// Persisted payment row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub amount: f64,
    pub status: String,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New payment for creation.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub id: String,
    pub order_id: String,
    pub amount: f64,
    pub status: String,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
}

const SELECT_COLUMNS: &str =
    "id, order_id, amount, status, payment_method, transaction_id, created_at, updated_at";

impl Payment {
    /// Look up a payment by id (the idempotency check for the charge step).
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {SELECT_COLUMNS} FROM payments WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Insert a new payment row inside an open transaction. Fails with a
    /// unique-constraint violation if the payment id already exists.
    pub async fn create_with_transaction(
        tx: &mut Transaction<'_, Sqlite>,
        new_payment: NewPayment,
    ) -> Result<Payment, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Payment>(&format!(
            "INSERT INTO payments (id, order_id, amount, status, payment_method, \
             transaction_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(&new_payment.id)
        .bind(&new_payment.order_id)
        .bind(new_payment.amount)
        .bind(&new_payment.status)
        .bind(&new_payment.payment_method)
        .bind(&new_payment.transaction_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
    }

    /// Count payment rows for an order; used by tests asserting that a
    /// cancelled run never created a charge.
    pub async fn count_for_order(pool: &SqlitePool, order_id: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM payments WHERE order_id = ?")
                .bind(order_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
