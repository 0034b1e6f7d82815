//! Transition triggers and the explicit transition tables.
//!
//! The lifecycles drive a fixed forward sequence, but every move still goes
//! through these tables so an out-of-order step is rejected instead of
//! silently corrupting state.

use super::errors::StateMachineError;
use super::states::{OrderState, ShippingState};
use serde::{Deserialize, Serialize};

/// Events that drive the order lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderLifecycleEvent {
    Receive,
    Validate,
    BeginReview,
    Charge,
    Ship,
    Complete,
    Cancel,
    Fail,
}

/// Events that drive the shipping lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingLifecycleEvent {
    Pick,
    Package,
    SelectCarrier,
    GenerateTracking,
    ConfirmDelivery,
    Cancel,
    Fail,
}

/// Determine the target order state for an event, rejecting illegal moves.
pub fn next_order_state(
    current: OrderState,
    event: &OrderLifecycleEvent,
) -> Result<OrderState, StateMachineError> {
    let target = match (current, event) {
        (OrderState::Pending, OrderLifecycleEvent::Receive) => OrderState::Received,
        (OrderState::Received, OrderLifecycleEvent::Validate) => OrderState::Validated,
        (OrderState::Validated, OrderLifecycleEvent::BeginReview) => OrderState::UnderReview,
        (OrderState::UnderReview, OrderLifecycleEvent::Charge) => OrderState::PaymentCharged,
        (OrderState::PaymentCharged, OrderLifecycleEvent::Ship) => OrderState::ShippingStarted,
        (OrderState::ShippingStarted, OrderLifecycleEvent::Complete) => OrderState::Completed,

        // Escape branches from any non-terminal state
        (from, OrderLifecycleEvent::Cancel) if !from.is_terminal() => OrderState::Cancelled,
        (from, OrderLifecycleEvent::Fail) if !from.is_terminal() => OrderState::Failed,

        (from, event) => {
            return Err(StateMachineError::InvalidTransition {
                from: from.to_string(),
                event: format!("{event:?}"),
            })
        }
    };

    Ok(target)
}

/// Determine the target shipping state for an event, rejecting illegal moves.
pub fn next_shipping_state(
    current: ShippingState,
    event: &ShippingLifecycleEvent,
) -> Result<ShippingState, StateMachineError> {
    let target = match (current, event) {
        (ShippingState::Pending, ShippingLifecycleEvent::Pick) => ShippingState::Picked,
        (ShippingState::Picked, ShippingLifecycleEvent::Package) => ShippingState::Packaged,
        (ShippingState::Packaged, ShippingLifecycleEvent::SelectCarrier) => {
            ShippingState::CarrierSelected
        }
        (ShippingState::CarrierSelected, ShippingLifecycleEvent::GenerateTracking) => {
            ShippingState::TrackingGenerated
        }
        (ShippingState::TrackingGenerated, ShippingLifecycleEvent::ConfirmDelivery) => {
            ShippingState::Delivered
        }

        (from, ShippingLifecycleEvent::Cancel) if !from.is_terminal() => ShippingState::Cancelled,
        (from, ShippingLifecycleEvent::Fail) if !from.is_terminal() => ShippingState::Failed,

        (from, event) => {
            return Err(StateMachineError::InvalidTransition {
                from: from.to_string(),
                event: format!("{event:?}"),
            })
        }
    };

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_forward_sequence() {
        let mut state = OrderState::Pending;
        for event in [
            OrderLifecycleEvent::Receive,
            OrderLifecycleEvent::Validate,
            OrderLifecycleEvent::BeginReview,
            OrderLifecycleEvent::Charge,
            OrderLifecycleEvent::Ship,
            OrderLifecycleEvent::Complete,
        ] {
            state = next_order_state(state, &event).unwrap();
        }
        assert_eq!(state, OrderState::Completed);
    }

    #[test]
    fn test_order_rejects_out_of_order_steps() {
        // Cannot charge before validation and review
        assert!(next_order_state(OrderState::Pending, &OrderLifecycleEvent::Charge).is_err());
        // Cannot re-receive once past receipt
        assert!(next_order_state(OrderState::Validated, &OrderLifecycleEvent::Receive).is_err());
        // Cannot complete from the middle of the sequence
        assert!(next_order_state(OrderState::Received, &OrderLifecycleEvent::Complete).is_err());
    }

    #[test]
    fn test_cancel_reachable_from_any_non_terminal_state() {
        for state in [
            OrderState::Pending,
            OrderState::Received,
            OrderState::Validated,
            OrderState::UnderReview,
            OrderState::PaymentCharged,
            OrderState::ShippingStarted,
        ] {
            assert_eq!(
                next_order_state(state, &OrderLifecycleEvent::Cancel).unwrap(),
                OrderState::Cancelled
            );
            assert_eq!(
                next_order_state(state, &OrderLifecycleEvent::Fail).unwrap(),
                OrderState::Failed
            );
        }
    }

    #[test]
    fn test_terminal_states_accept_no_events() {
        for state in [
            OrderState::Completed,
            OrderState::Cancelled,
            OrderState::Failed,
        ] {
            assert!(next_order_state(state, &OrderLifecycleEvent::Cancel).is_err());
            assert!(next_order_state(state, &OrderLifecycleEvent::Receive).is_err());
        }
    }

    #[test]
    fn test_shipping_forward_sequence() {
        let mut state = ShippingState::Pending;
        for event in [
            ShippingLifecycleEvent::Pick,
            ShippingLifecycleEvent::Package,
            ShippingLifecycleEvent::SelectCarrier,
            ShippingLifecycleEvent::GenerateTracking,
            ShippingLifecycleEvent::ConfirmDelivery,
        ] {
            state = next_shipping_state(state, &event).unwrap();
        }
        assert_eq!(state, ShippingState::Delivered);
    }

    #[test]
    fn test_shipping_cancel_from_mid_sequence() {
        assert_eq!(
            next_shipping_state(ShippingState::Packaged, &ShippingLifecycleEvent::Cancel).unwrap(),
            ShippingState::Cancelled
        );
        assert!(
            next_shipping_state(ShippingState::Delivered, &ShippingLifecycleEvent::Cancel).is_err()
        );
    }
}
