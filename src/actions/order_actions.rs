//! Order-lifecycle actions: receive, validate, charge, start shipping.
//!
//! Each action follows the same shape: consult the fault injector, run the
//! idempotency check, then commit the aggregate update and its event-log
//! append in one transaction. A dropped transaction rolls back, so a failed
//! attempt leaves no partial rows behind.

use crate::execution::FaultInjector;
use crate::models::event::event_types;
use crate::models::order::status as order_status;
use crate::models::payment::status as payment_status;
use crate::models::{
    DomainEvent, NewDomainEvent, NewOrder, NewPayment, Order, OrderRequest, Payment,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::ActionError;

/// Result of the receive step.
#[derive(Debug, Clone)]
pub struct ReceiveOutcome {
    pub order: Order,
    pub already_processed: bool,
}

/// Result of the validate step. An empty item list is a business outcome,
/// not an error; the caller decides to terminate the run.
#[derive(Debug, Clone)]
pub enum Validation {
    Valid(Order),
    NoItems,
}

/// Result of the charge step.
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    pub payment: Payment,
    pub already_processed: bool,
}

/// Result of the start-shipping step; returned to the caller as the order
/// run's shipping handoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingStarted {
    pub order_id: String,
    pub status: String,
    pub message: String,
    pub already_processed: bool,
}

/// The idempotent action set for the order lifecycle.
#[derive(Clone)]
pub struct OrderActions {
    pool: SqlitePool,
    injector: Arc<dyn FaultInjector>,
    workflow_id: Option<String>,
}

impl OrderActions {
    pub fn new(pool: SqlitePool, injector: Arc<dyn FaultInjector>) -> Self {
        Self {
            pool,
            injector,
            workflow_id: None,
        }
    }

    /// Tag events appended by this instance with an owning workflow id.
    pub fn for_workflow(&self, workflow_id: impl Into<String>) -> Self {
        Self {
            pool: self.pool.clone(),
            injector: self.injector.clone(),
            workflow_id: Some(workflow_id.into()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the order row, or return the recorded state if the order id
    /// already exists. Keyed by `order_id`.
    #[instrument(skip(self, request))]
    pub async fn receive_order(
        &self,
        order_id: &str,
        request: &OrderRequest,
    ) -> Result<ReceiveOutcome, ActionError> {
        self.injector.inject("receive_order").await?;

        if let Some(existing) = Order::find_by_id(&self.pool, order_id).await? {
            info!(order_id, "order already exists, returning recorded state");
            return Ok(ReceiveOutcome {
                order: existing,
                already_processed: true,
            });
        }

        let mut tx = self.pool.begin().await?;
        let order = Order::create_with_transaction(
            &mut tx,
            NewOrder {
                id: order_id.to_string(),
                status: order_status::RECEIVED.to_string(),
                customer_name: Some(request.customer_name.clone()),
                customer_email: Some(request.customer_email.clone()),
                total_amount: request.total_amount(),
                items: request.items.clone(),
                shipping_address: request.shipping_address.clone(),
            },
        )
        .await?;
        DomainEvent::append_with_transaction(
            &mut tx,
            NewDomainEvent {
                order_id: order_id.to_string(),
                event_type: event_types::ORDER_RECEIVED.to_string(),
                event_data: json!({ "status": "created" }),
                workflow_id: self.workflow_id.clone(),
            },
        )
        .await?;
        tx.commit().await?;

        info!(order_id, "order received");
        Ok(ReceiveOutcome {
            order,
            already_processed: false,
        })
    }

    /// Check the order's item list. Non-empty: status moves to `validated`.
    /// Empty: the check is still recorded in the event log, and the caller
    /// gets a typed invalid result. A missing order is a business-rule
    /// violation; it means steps ran out of order.
    #[instrument(skip(self))]
    pub async fn validate_order(&self, order_id: &str) -> Result<Validation, ActionError> {
        self.injector.inject("validate_order").await?;

        let mut order = Order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| ActionError::BusinessRule(format!("order {order_id} not found")))?;

        let valid = !order.items.0.is_empty();

        let mut tx = self.pool.begin().await?;
        if valid {
            Order::update_status_with_transaction(&mut tx, order_id, order_status::VALIDATED)
                .await?;
        }
        DomainEvent::append_with_transaction(
            &mut tx,
            NewDomainEvent {
                order_id: order_id.to_string(),
                event_type: event_types::ORDER_VALIDATED.to_string(),
                event_data: json!({
                    "status": if valid { "validated" } else { "no_items" },
                }),
                workflow_id: self.workflow_id.clone(),
            },
        )
        .await?;
        tx.commit().await?;

        if valid {
            order.status = order_status::VALIDATED.to_string();
            info!(order_id, "order validated");
            Ok(Validation::Valid(order))
        } else {
            warn!(order_id, "order has no line items");
            Ok(Validation::NoItems)
        }
    }

    /// Charge the payment, keyed by `payment_id`. A committed payment row
    /// short-circuits with the original transaction id, the guard against
    /// double-charging on retry. The order must be in `validated` status.
    #[instrument(skip(self))]
    pub async fn charge_payment(
        &self,
        payment_id: &str,
        order_id: &str,
    ) -> Result<ChargeOutcome, ActionError> {
        self.injector.inject("charge_payment").await?;

        if let Some(existing) = Payment::find_by_id(&self.pool, payment_id).await? {
            info!(payment_id, order_id, "payment already processed");
            return Ok(ChargeOutcome {
                payment: existing,
                already_processed: true,
            });
        }

        let order = Order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| ActionError::BusinessRule(format!("order {order_id} not found")))?;
        if order.status != order_status::VALIDATED {
            return Err(ActionError::BusinessRule(format!(
                "order {order_id} is in {} state, cannot process payment",
                order.status
            )));
        }

        let transaction_id = format!("txn-{}", Uuid::new_v4());

        let mut tx = self.pool.begin().await?;
        let payment = Payment::create_with_transaction(
            &mut tx,
            NewPayment {
                id: payment_id.to_string(),
                order_id: order_id.to_string(),
                amount: order.total_amount,
                status: payment_status::COMPLETED.to_string(),
                payment_method: Some("credit_card".to_string()),
                transaction_id: Some(transaction_id.clone()),
            },
        )
        .await?;
        Order::update_status_with_transaction(&mut tx, order_id, order_status::PAID).await?;
        DomainEvent::append_with_transaction(
            &mut tx,
            NewDomainEvent {
                order_id: order_id.to_string(),
                event_type: event_types::PAYMENT_CHARGED.to_string(),
                event_data: json!({
                    "payment_id": payment_id,
                    "status": payment_status::COMPLETED,
                    "transaction_id": transaction_id,
                }),
                workflow_id: self.workflow_id.clone(),
            },
        )
        .await?;
        tx.commit().await?;

        info!(payment_id, order_id, %transaction_id, "payment charged");
        Ok(ChargeOutcome {
            payment,
            already_processed: false,
        })
    }

    /// Move the order into `shipping`. Idempotent via the event log: a
    /// recorded `shipping_started` event short-circuits the re-attempt.
    #[instrument(skip(self))]
    pub async fn start_shipping(&self, order_id: &str) -> Result<ShippingStarted, ActionError> {
        self.injector.inject("start_shipping").await?;

        if DomainEvent::step_recorded(&self.pool, order_id, event_types::SHIPPING_STARTED).await? {
            info!(order_id, "shipping already initiated");
            return Ok(ShippingStarted {
                order_id: order_id.to_string(),
                status: order_status::SHIPPING.to_string(),
                message: "shipping already initiated".to_string(),
                already_processed: true,
            });
        }

        let mut tx = self.pool.begin().await?;
        Order::update_status_with_transaction(&mut tx, order_id, order_status::SHIPPING).await?;
        DomainEvent::append_with_transaction(
            &mut tx,
            NewDomainEvent {
                order_id: order_id.to_string(),
                event_type: event_types::SHIPPING_STARTED.to_string(),
                event_data: json!({ "status": "shipping_initiated" }),
                workflow_id: self.workflow_id.clone(),
            },
        )
        .await?;
        tx.commit().await?;

        info!(order_id, "shipping started");
        Ok(ShippingStarted {
            order_id: order_id.to_string(),
            status: order_status::SHIPPING.to_string(),
            message: "shipping process initiated".to_string(),
            already_processed: false,
        })
    }
}
