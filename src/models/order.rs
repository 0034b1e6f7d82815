//! # Order Model
//!
//! Current-state projection of an order: one row per order id, updated
//! transactionally alongside event-log inserts.
//!
//! The order id is caller-supplied and globally unique; it doubles as the
//! idempotency key for the receive step. Rows are never deleted; terminal
//! orders stay queryable for audit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};

/// Aggregate-row status values. These are the persisted lifecycle marks and
/// intentionally narrower than the state machine's in-memory states: only
/// steps that commit a side effect move this column.
pub mod status {
    pub const PENDING: &str = "pending";
    pub const RECEIVED: &str = "received";
    pub const VALIDATED: &str = "validated";
    pub const PAID: &str = "paid";
    pub const SHIPPING: &str = "shipping";
}

/// A single order line: sku, quantity, unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub sku: String,
    pub quantity: i64,
    pub price: f64,
}

/// Shipping destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
}

/// Inbound order content supplied by the caller when a run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<LineItem>,
    pub shipping_address: Address,
}

/// Persisted order row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: String,
    pub status: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub total_amount: f64,
    pub items: Json<Vec<LineItem>>,
    pub shipping_address: Json<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New order for creation (without generated timestamps).
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: String,
    pub status: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub total_amount: f64,
    pub items: Vec<LineItem>,
    pub shipping_address: Address,
}

const SELECT_COLUMNS: &str = "id, status, customer_name, customer_email, total_amount, \
                              items, shipping_address, created_at, updated_at";

impl Order {
    /// Look up an order by id.
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Insert a new order row inside an open transaction.
    pub async fn create_with_transaction(
        tx: &mut Transaction<'_, Sqlite>,
        new_order: NewOrder,
    ) -> Result<Order, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (id, status, customer_name, customer_email, total_amount, \
             items, shipping_address, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(&new_order.id)
        .bind(&new_order.status)
        .bind(&new_order.customer_name)
        .bind(&new_order.customer_email)
        .bind(new_order.total_amount)
        .bind(Json(&new_order.items))
        .bind(Json(&new_order.shipping_address))
        .bind(now)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
    }

    /// Update an order's status inside an open transaction.
    pub async fn update_status_with_transaction(
        tx: &mut Transaction<'_, Sqlite>,
        id: &str,
        status: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

impl OrderRequest {
    /// Monetary total across all line items.
    pub fn total_amount(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.price * item.quantity as f64)
            .sum()
    }

    /// Total quantity across all line items, used as the package weight in
    /// shipment units.
    pub fn total_units(items: &[LineItem]) -> i64 {
        items.iter().map(|item| item.quantity).sum()
    }
}
