//! # Order Lifecycle State Machine
//!
//! Drives an order through receive → validate → manual review → charge →
//! start shipping, delegating every side effect to the idempotent action
//! layer and consulting the signal inbox at a checkpoint after each step.
//!
//! The run boundary is absolute: whether a retry budget is exhausted, a
//! business rule fails, or a transition is illegal, the caller gets back a
//! structured [`RunOutcome`], never an error.

use super::errors::StateMachineResult;
use super::events::{next_order_state, OrderLifecycleEvent};
use super::outcome::{FailureReason, RunOutcome};
use super::signals::{SignalInbox, SignalKind};
use super::states::OrderState;
use crate::actions::{OrderActions, Validation};
use crate::config::{ExecutionConfig, TimerConfig};
use crate::events::{topics, EventPublisher};
use crate::execution::ActionInvoker;
use crate::models::OrderRequest;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

pub struct OrderLifecycle {
    actions: OrderActions,
    inbox: SignalInbox,
    publisher: EventPublisher,
    execution: ExecutionConfig,
    timers: TimerConfig,
    workflow_id: String,
    state: OrderState,
}

impl OrderLifecycle {
    pub fn new(
        order_id: &str,
        actions: OrderActions,
        inbox: SignalInbox,
        publisher: EventPublisher,
        execution: ExecutionConfig,
        timers: TimerConfig,
    ) -> Self {
        let workflow_id = format!("workflow-{order_id}");
        Self {
            actions: actions.for_workflow(&workflow_id),
            inbox,
            publisher,
            execution,
            timers,
            workflow_id,
            state: OrderState::Pending,
        }
    }

    pub fn state(&self) -> OrderState {
        self.state
    }

    pub fn inbox(&self) -> &SignalInbox {
        &self.inbox
    }

    /// Run the lifecycle to a terminal outcome.
    #[instrument(skip_all, fields(workflow_id = %self.workflow_id, order_id, payment_id))]
    pub async fn run(
        &mut self,
        order_id: &str,
        payment_id: &str,
        request: &OrderRequest,
    ) -> RunOutcome {
        info!(order_id, payment_id, "starting order lifecycle run");
        match self.execute(order_id, payment_id, request).await {
            Ok(outcome) => {
                info!(order_id, status = outcome.status_label(), "order lifecycle run finished");
                outcome
            }
            Err(error) => {
                error!(order_id, %error, "order lifecycle run failed");
                let _ = self.advance(OrderLifecycleEvent::Fail).await;
                RunOutcome::Failed {
                    reason: FailureReason::WorkflowError,
                    detail: Some(error.to_string()),
                }
            }
        }
    }

    async fn execute(
        &mut self,
        order_id: &str,
        payment_id: &str,
        request: &OrderRequest,
    ) -> StateMachineResult<RunOutcome> {
        // Step 1: receive order, keyed by order id.
        let invoker = ActionInvoker::new(self.execution.receive_policy());
        let received = invoker
            .invoke("receive_order", || {
                self.actions.receive_order(order_id, request)
            })
            .await?;
        if received.already_processed {
            debug!(order_id, "receive step was an idempotent short-circuit");
        }
        self.advance(OrderLifecycleEvent::Receive).await?;

        if let Some(outcome) = self.checkpoint().await? {
            return Ok(outcome);
        }

        // Step 2: validate. An empty item list is a business failure, not a
        // retryable error; it terminates the run immediately.
        let invoker = ActionInvoker::new(self.execution.validate_policy());
        let validation = invoker
            .invoke("validate_order", || self.actions.validate_order(order_id))
            .await?;
        match validation {
            Validation::Valid(order) => {
                debug!(order_id, total_amount = order.total_amount, "order validated");
            }
            Validation::NoItems => {
                warn!(order_id, "validation failed: no line items");
                self.advance(OrderLifecycleEvent::Fail).await?;
                return Ok(RunOutcome::Failed {
                    reason: FailureReason::ValidationFailed,
                    detail: Some("order has no line items".to_string()),
                });
            }
        }
        self.advance(OrderLifecycleEvent::Validate).await?;

        if let Some(outcome) = self.checkpoint().await? {
            return Ok(outcome);
        }

        // Step 3: bounded manual-review window. The wait is a single timer
        // interrupted event-driven by a cancel signal; either way the
        // following checkpoint decides.
        self.advance(OrderLifecycleEvent::BeginReview).await?;
        info!(
            order_id,
            review_ms = self.timers.manual_review_ms,
            "manual review window open"
        );
        self.wait_interruptible(self.timers.manual_review()).await;

        if let Some(outcome) = self.checkpoint().await? {
            return Ok(outcome);
        }

        // Step 4: charge payment, keyed by payment id and guarded by the
        // payment-cancel flag.
        if self.inbox.payment_cancel_requested() {
            return self.cancel_run("payment cancelled by customer").await;
        }
        self.wait_interruptible(self.timers.payment_processing_delay())
            .await;
        if let Some(outcome) = self.checkpoint().await? {
            return Ok(outcome);
        }
        if self.inbox.payment_cancel_requested() {
            return self.cancel_run("payment cancelled by customer").await;
        }

        let invoker = ActionInvoker::new(self.execution.charge_policy());
        let charge = invoker
            .invoke("charge_payment", || {
                self.actions.charge_payment(payment_id, order_id)
            })
            .await?;
        if charge.already_processed {
            debug!(
                payment_id,
                transaction_id = charge.payment.transaction_id.as_deref().unwrap_or(""),
                "charge step was an idempotent short-circuit"
            );
        }
        self.advance(OrderLifecycleEvent::Charge).await?;

        if let Some(outcome) = self.checkpoint().await? {
            return Ok(outcome);
        }

        // Step 5: start shipping.
        self.wait_interruptible(self.timers.shipping_setup_delay())
            .await;
        if let Some(outcome) = self.checkpoint().await? {
            return Ok(outcome);
        }

        let invoker = ActionInvoker::new(self.execution.shipping_policy());
        let shipping = invoker
            .invoke("start_shipping", || self.actions.start_shipping(order_id))
            .await?;
        self.advance(OrderLifecycleEvent::Ship).await?;

        if let Some(outcome) = self.checkpoint().await? {
            return Ok(outcome);
        }

        self.advance(OrderLifecycleEvent::Complete).await?;
        Ok(RunOutcome::Completed { shipping })
    }

    /// Consult the inbox between steps. A committed side effect is never
    /// rolled back here; cancellation only prevents the next step.
    async fn checkpoint(&mut self) -> StateMachineResult<Option<RunOutcome>> {
        if let Some(address) = self.inbox.proposed_address() {
            // Accepted and stored, deliberately not applied to the persisted
            // order; see DESIGN.md.
            debug!(street = %address.street, "address update noted");
        }
        if self.inbox.cancel_requested() {
            let outcome = self.cancel_run("order cancelled by customer").await?;
            return Ok(Some(outcome));
        }
        Ok(None)
    }

    async fn cancel_run(&mut self, reason: &str) -> StateMachineResult<RunOutcome> {
        info!(reason, "run cancelled at checkpoint");
        self.advance(OrderLifecycleEvent::Cancel).await?;
        Ok(RunOutcome::Cancelled {
            reason: reason.to_string(),
        })
    }

    /// Timed wait that ends early the moment a cancel signal lands.
    async fn wait_interruptible(&self, duration: Duration) {
        tokio::select! {
            _ = sleep(duration) => {}
            _ = self.inbox.observed(SignalKind::CancelOrder) => {
                debug!("timed wait interrupted by cancel signal");
            }
        }
    }

    async fn advance(&mut self, event: OrderLifecycleEvent) -> StateMachineResult<()> {
        let from = self.state;
        let to = next_order_state(from, &event)?;
        self.state = to;
        self.publisher
            .publish_transition(topics::ORDER_STATE_CHANGED, &self.workflow_id, from, to);
        debug!(from = %from, to = %to, "order state transition");
        Ok(())
    }
}
