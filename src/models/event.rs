//! # Event Log
//!
//! Append-only, per-order ordered record of domain events: the source of
//! truth for "has this already happened". Rows are never updated or deleted;
//! within an order, the autoincrement id preserves insertion order for
//! replay and audit.
//!
//! The log is deliberately queryable independent of the aggregate rows:
//! [`DomainEvent::step_recorded`] answers "has step X already run for order
//! Y" even if a partial failure left the projection behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};

/// Event type names appended by the action layer. The column is an open
/// string enum; these are the types this crate emits.
pub mod event_types {
    pub const ORDER_RECEIVED: &str = "order_received";
    pub const ORDER_VALIDATED: &str = "order_validated";
    pub const PAYMENT_CHARGED: &str = "payment_charged";
    pub const SHIPPING_STARTED: &str = "shipping_started";
    pub const ITEMS_PICKED: &str = "items_picked";
    pub const ITEMS_PACKAGED: &str = "items_packaged";
    pub const CARRIER_SELECTED: &str = "carrier_selected";
    pub const TRACKING_GENERATED: &str = "tracking_generated";
    pub const DELIVERY_CONFIRMED: &str = "delivery_confirmed";
}

/// Persisted event row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DomainEvent {
    pub id: i64,
    pub order_id: String,
    pub event_type: String,
    pub event_data: Json<serde_json::Value>,
    pub workflow_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// New event for appending.
#[derive(Debug, Clone)]
pub struct NewDomainEvent {
    pub order_id: String,
    pub event_type: String,
    pub event_data: serde_json::Value,
    pub workflow_id: Option<String>,
}

const SELECT_COLUMNS: &str = "id, order_id, event_type, event_data, workflow_id, timestamp";

impl DomainEvent {
    /// Append an event inside an open transaction, committing together with
    /// the aggregate update for the same logical step.
    pub async fn append_with_transaction(
        tx: &mut Transaction<'_, Sqlite>,
        new_event: NewDomainEvent,
    ) -> Result<DomainEvent, sqlx::Error> {
        sqlx::query_as::<_, DomainEvent>(&format!(
            "INSERT INTO events (order_id, event_type, event_data, workflow_id, timestamp) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(&new_event.order_id)
        .bind(&new_event.event_type)
        .bind(Json(&new_event.event_data))
        .bind(&new_event.workflow_id)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await
    }

    /// Append an event as its own single-statement transaction.
    pub async fn append(
        pool: &SqlitePool,
        new_event: NewDomainEvent,
    ) -> Result<DomainEvent, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let event = Self::append_with_transaction(&mut tx, new_event).await?;
        tx.commit().await?;
        Ok(event)
    }

    /// All events for an order in insertion order.
    pub async fn list_for_order(
        pool: &SqlitePool,
        order_id: &str,
    ) -> Result<Vec<DomainEvent>, sqlx::Error> {
        sqlx::query_as::<_, DomainEvent>(&format!(
            "SELECT {SELECT_COLUMNS} FROM events WHERE order_id = ? ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(pool)
        .await
    }

    /// Whether an event of the given type has already been recorded for the
    /// order, the durable "has step X already run" check.
    pub async fn step_recorded(
        pool: &SqlitePool,
        order_id: &str,
        event_type: &str,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM events WHERE order_id = ? AND event_type = ?)",
        )
        .bind(order_id)
        .bind(event_type)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }
}
