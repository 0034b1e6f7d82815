//! Shipping sub-process runs: delivery through all five steps, carrier
//! selection by weight, and cancellation at the per-step checkpoints.

mod common;

use orderflow_core::actions::ShippingActions;
use orderflow_core::events::EventPublisher;
use orderflow_core::execution::NoopInjector;
use orderflow_core::models::event::event_types;
use orderflow_core::models::DomainEvent;
use orderflow_core::state_machine::{
    ShippingLifecycle, ShippingOutcome, ShippingState, SignalInbox, SignalKind,
};
use serde_json::json;
use std::sync::Arc;

fn lifecycle_for(
    order_id: &str,
    db: &orderflow_core::Database,
    inbox: SignalInbox,
) -> ShippingLifecycle {
    let config = common::fast_config();
    ShippingLifecycle::new(
        order_id,
        ShippingActions::new(db.pool().clone(), Arc::new(NoopInjector)),
        inbox,
        EventPublisher::default(),
        config.execution,
    )
}

#[tokio::test]
async fn test_light_package_ships_via_light_tier() {
    let (db, _dir) = common::test_database().await;
    let mut lifecycle = lifecycle_for("order-1", &db, SignalInbox::new());

    let outcome = lifecycle
        .run("order-1", &common::sample_request().items)
        .await;

    let ShippingOutcome::Delivered {
        carrier,
        service,
        tracking_number,
        ..
    } = outcome
    else {
        panic!("expected delivered outcome, got {outcome:?}");
    };
    // Three units total, below the weight threshold.
    assert_eq!(carrier, "USPS");
    assert_eq!(service, "Priority Mail");
    assert!(tracking_number.starts_with("USPS-"));
    let suffix = tracking_number.strip_prefix("USPS-").unwrap();
    assert_eq!(suffix.len(), 8);
    assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(lifecycle.state(), ShippingState::Delivered);

    let events = DomainEvent::list_for_order(db.pool(), "order-1")
        .await
        .unwrap();
    let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(
        types,
        [
            event_types::ITEMS_PICKED,
            event_types::ITEMS_PACKAGED,
            event_types::CARRIER_SELECTED,
            event_types::TRACKING_GENERATED,
            event_types::DELIVERY_CONFIRMED,
        ]
    );
    assert!(events
        .iter()
        .all(|e| e.workflow_id.as_deref() == Some("shipping-order-1")));
}

#[tokio::test]
async fn test_heavy_package_ships_via_standard_tier() {
    let (db, _dir) = common::test_database().await;
    let mut lifecycle = lifecycle_for("order-2", &db, SignalInbox::new());

    let outcome = lifecycle
        .run("order-2", &common::heavy_request().items)
        .await;

    let ShippingOutcome::Delivered {
        carrier,
        service,
        tracking_number,
        ..
    } = outcome
    else {
        panic!("expected delivered outcome, got {outcome:?}");
    };
    assert_eq!(carrier, "FedEx");
    assert_eq!(service, "Ground");
    assert!(tracking_number.starts_with("FedEx-"));
}

#[tokio::test]
async fn test_cancel_before_start_does_nothing() {
    let (db, _dir) = common::test_database().await;
    let inbox = SignalInbox::new();
    inbox.deliver(SignalKind::CancelShipping, json!({}));
    let mut lifecycle = lifecycle_for("order-3", &db, inbox);

    let outcome = lifecycle
        .run("order-3", &common::sample_request().items)
        .await;

    assert!(matches!(outcome, ShippingOutcome::Cancelled { .. }));
    assert_eq!(lifecycle.state(), ShippingState::Cancelled);
    // No step ran, so nothing was logged.
    assert!(DomainEvent::list_for_order(db.pool(), "order-3")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_order_cancel_signal_does_not_cancel_shipping() {
    let (db, _dir) = common::test_database().await;
    let inbox = SignalInbox::new();
    // Only `cancel_shipping` reaches the shipping checkpoints.
    inbox.deliver(SignalKind::CancelOrder, json!({}));
    let mut lifecycle = lifecycle_for("order-4", &db, inbox);

    let outcome = lifecycle
        .run("order-4", &common::sample_request().items)
        .await;
    assert!(matches!(outcome, ShippingOutcome::Delivered { .. }));
}
