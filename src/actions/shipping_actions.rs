//! Shipping-lifecycle actions: pick, package, select carrier, generate
//! tracking, confirm delivery.
//!
//! Each step appends its event to the order's log and returns a typed
//! result. Carrier selection is a pure decision rule on package weight.
//! Tracking numbers are minted fresh on every invocation: a retried
//! generate-tracking step may legitimately produce a new number (see
//! DESIGN.md for why this is deliberately left non-idempotent).

use crate::execution::FaultInjector;
use crate::models::event::event_types;
use crate::models::{DomainEvent, LineItem, NewDomainEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::ActionError;

/// Packages at or above this weight (in shipment units) route to the
/// standard tier; lighter packages route to the light tier.
pub const CARRIER_WEIGHT_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickResult {
    pub picked_items: Vec<LineItem>,
    pub warehouse_location: String,
    pub picked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageResult {
    /// Package weight in shipment units (total item quantity).
    pub weight: f64,
    pub dimensions: String,
    pub packaged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierSelection {
    pub carrier: String,
    pub service: String,
    pub estimated_days: i64,
    pub selected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingAssignment {
    pub tracking_number: String,
    pub carrier: String,
    pub service: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfirmation {
    pub delivery_date: DateTime<Utc>,
    pub delivery_status: String,
}

/// Pure carrier decision rule, exposed for direct testing.
pub fn carrier_for_weight(weight: f64) -> (&'static str, &'static str, i64) {
    if weight < CARRIER_WEIGHT_THRESHOLD {
        ("USPS", "Priority Mail", 3)
    } else {
        ("FedEx", "Ground", 5)
    }
}

/// The action set for the shipping sub-process.
#[derive(Clone)]
pub struct ShippingActions {
    pool: SqlitePool,
    injector: Arc<dyn FaultInjector>,
    workflow_id: Option<String>,
}

impl ShippingActions {
    pub fn new(pool: SqlitePool, injector: Arc<dyn FaultInjector>) -> Self {
        Self {
            pool,
            injector,
            workflow_id: None,
        }
    }

    pub fn for_workflow(&self, workflow_id: impl Into<String>) -> Self {
        Self {
            pool: self.pool.clone(),
            injector: self.injector.clone(),
            workflow_id: Some(workflow_id.into()),
        }
    }

    async fn append_event(
        &self,
        order_id: &str,
        event_type: &str,
        event_data: serde_json::Value,
    ) -> Result<(), ActionError> {
        DomainEvent::append(
            &self.pool,
            NewDomainEvent {
                order_id: order_id.to_string(),
                event_type: event_type.to_string(),
                event_data,
                workflow_id: self.workflow_id.clone(),
            },
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, items))]
    pub async fn pick_items(
        &self,
        order_id: &str,
        items: &[LineItem],
    ) -> Result<PickResult, ActionError> {
        self.injector.inject("pick_items").await?;

        let result = PickResult {
            picked_items: items.to_vec(),
            warehouse_location: "A1-B3-C2".to_string(),
            picked_at: Utc::now(),
        };
        self.append_event(
            order_id,
            event_types::ITEMS_PICKED,
            json!({ "item_count": items.len(), "warehouse_location": result.warehouse_location }),
        )
        .await?;

        info!(order_id, item_count = items.len(), "items picked");
        Ok(result)
    }

    #[instrument(skip(self, pick))]
    pub async fn package_items(
        &self,
        order_id: &str,
        pick: &PickResult,
    ) -> Result<PackageResult, ActionError> {
        self.injector.inject("package_items").await?;

        let weight = crate::models::OrderRequest::total_units(&pick.picked_items);
        let result = PackageResult {
            weight: weight as f64,
            dimensions: "12x8x6 inches".to_string(),
            packaged_at: Utc::now(),
        };
        self.append_event(
            order_id,
            event_types::ITEMS_PACKAGED,
            json!({ "weight": result.weight, "dimensions": result.dimensions }),
        )
        .await?;

        info!(order_id, weight = result.weight, "items packaged");
        Ok(result)
    }

    #[instrument(skip(self, package))]
    pub async fn select_carrier(
        &self,
        order_id: &str,
        package: &PackageResult,
    ) -> Result<CarrierSelection, ActionError> {
        self.injector.inject("select_carrier").await?;

        let (carrier, service, estimated_days) = carrier_for_weight(package.weight);
        let result = CarrierSelection {
            carrier: carrier.to_string(),
            service: service.to_string(),
            estimated_days,
            selected_at: Utc::now(),
        };
        self.append_event(
            order_id,
            event_types::CARRIER_SELECTED,
            json!({
                "carrier": result.carrier,
                "service": result.service,
                "estimated_days": result.estimated_days,
            }),
        )
        .await?;

        info!(order_id, carrier, service, "carrier selected");
        Ok(result)
    }

    #[instrument(skip(self, carrier))]
    pub async fn generate_tracking(
        &self,
        order_id: &str,
        carrier: &CarrierSelection,
    ) -> Result<TrackingAssignment, ActionError> {
        self.injector.inject("generate_tracking").await?;

        let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
        let tracking_number = format!("{}-{}", carrier.carrier, suffix);
        let result = TrackingAssignment {
            tracking_number: tracking_number.clone(),
            carrier: carrier.carrier.clone(),
            service: carrier.service.clone(),
            generated_at: Utc::now(),
        };
        self.append_event(
            order_id,
            event_types::TRACKING_GENERATED,
            json!({ "tracking_number": tracking_number, "carrier": result.carrier }),
        )
        .await?;

        info!(order_id, %tracking_number, "tracking generated");
        Ok(result)
    }

    #[instrument(skip(self, tracking))]
    pub async fn confirm_delivery(
        &self,
        order_id: &str,
        tracking: &TrackingAssignment,
    ) -> Result<DeliveryConfirmation, ActionError> {
        self.injector.inject("confirm_delivery").await?;

        let result = DeliveryConfirmation {
            delivery_date: Utc::now(),
            delivery_status: "delivered".to_string(),
        };
        self.append_event(
            order_id,
            event_types::DELIVERY_CONFIRMED,
            json!({
                "tracking_number": tracking.tracking_number,
                "delivery_status": result.delivery_status,
            }),
        )
        .await?;

        info!(order_id, tracking_number = %tracking.tracking_number, "delivery confirmed");
        Ok(result)
    }
}
