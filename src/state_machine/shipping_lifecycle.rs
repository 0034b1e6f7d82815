//! # Shipping Lifecycle State Machine
//!
//! Runs the shipping sub-process for an order: pick → package → select
//! carrier → generate tracking → confirm delivery. Each step is preceded by
//! a cancellation checkpoint, so a shipping-cancel signal takes effect
//! before the next side effect rather than mid-step.

use super::errors::StateMachineResult;
use super::events::{next_shipping_state, ShippingLifecycleEvent};
use super::outcome::ShippingOutcome;
use super::signals::SignalInbox;
use super::states::ShippingState;
use crate::actions::ShippingActions;
use crate::config::ExecutionConfig;
use crate::events::{topics, EventPublisher};
use crate::execution::ActionInvoker;
use crate::models::LineItem;
use tracing::{debug, error, info, instrument};

pub struct ShippingLifecycle {
    actions: ShippingActions,
    inbox: SignalInbox,
    publisher: EventPublisher,
    execution: ExecutionConfig,
    workflow_id: String,
    state: ShippingState,
}

impl ShippingLifecycle {
    pub fn new(
        order_id: &str,
        actions: ShippingActions,
        inbox: SignalInbox,
        publisher: EventPublisher,
        execution: ExecutionConfig,
    ) -> Self {
        let workflow_id = format!("shipping-{order_id}");
        Self {
            actions: actions.for_workflow(&workflow_id),
            inbox,
            publisher,
            execution,
            workflow_id,
            state: ShippingState::Pending,
        }
    }

    pub fn state(&self) -> ShippingState {
        self.state
    }

    /// Run the shipping sub-process to a terminal outcome.
    #[instrument(skip_all, fields(workflow_id = %self.workflow_id, order_id))]
    pub async fn run(&mut self, order_id: &str, items: &[LineItem]) -> ShippingOutcome {
        info!(order_id, item_count = items.len(), "starting shipping run");
        match self.execute(order_id, items).await {
            Ok(outcome) => {
                info!(order_id, status = outcome.status_label(), "shipping run finished");
                outcome
            }
            Err(error) => {
                error!(order_id, %error, "shipping run failed");
                let _ = self.advance(ShippingLifecycleEvent::Fail).await;
                ShippingOutcome::Failed {
                    detail: error.to_string(),
                }
            }
        }
    }

    async fn execute(
        &mut self,
        order_id: &str,
        items: &[LineItem],
    ) -> StateMachineResult<ShippingOutcome> {
        let invoker = ActionInvoker::new(self.execution.shipping_policy());

        if let Some(outcome) = self.checkpoint().await? {
            return Ok(outcome);
        }
        let pick = invoker
            .invoke("pick_items", || self.actions.pick_items(order_id, items))
            .await?;
        self.advance(ShippingLifecycleEvent::Pick).await?;

        if let Some(outcome) = self.checkpoint().await? {
            return Ok(outcome);
        }
        let package = invoker
            .invoke("package_items", || {
                self.actions.package_items(order_id, &pick)
            })
            .await?;
        self.advance(ShippingLifecycleEvent::Package).await?;

        if let Some(outcome) = self.checkpoint().await? {
            return Ok(outcome);
        }
        let carrier = invoker
            .invoke("select_carrier", || {
                self.actions.select_carrier(order_id, &package)
            })
            .await?;
        self.advance(ShippingLifecycleEvent::SelectCarrier).await?;

        if let Some(outcome) = self.checkpoint().await? {
            return Ok(outcome);
        }
        let tracking = invoker
            .invoke("generate_tracking", || {
                self.actions.generate_tracking(order_id, &carrier)
            })
            .await?;
        self.advance(ShippingLifecycleEvent::GenerateTracking)
            .await?;

        if let Some(outcome) = self.checkpoint().await? {
            return Ok(outcome);
        }
        let delivery = invoker
            .invoke("confirm_delivery", || {
                self.actions.confirm_delivery(order_id, &tracking)
            })
            .await?;
        self.advance(ShippingLifecycleEvent::ConfirmDelivery)
            .await?;

        Ok(ShippingOutcome::Delivered {
            carrier: tracking.carrier,
            service: tracking.service,
            tracking_number: tracking.tracking_number,
            delivery_date: delivery.delivery_date,
        })
    }

    async fn checkpoint(&mut self) -> StateMachineResult<Option<ShippingOutcome>> {
        if self.inbox.shipping_cancel_requested() {
            info!("shipping cancelled at checkpoint");
            self.advance(ShippingLifecycleEvent::Cancel).await?;
            return Ok(Some(ShippingOutcome::Cancelled {
                reason: "shipping cancelled by customer".to_string(),
            }));
        }
        Ok(None)
    }

    async fn advance(&mut self, event: ShippingLifecycleEvent) -> StateMachineResult<()> {
        let from = self.state;
        let to = next_shipping_state(from, &event)?;
        self.state = to;
        self.publisher
            .publish_transition(topics::SHIPPING_STATE_CHANGED, &self.workflow_id, from, to);
        debug!(from = %from, to = %to, "shipping state transition");
        Ok(())
    }
}
