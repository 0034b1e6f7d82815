//! Retry behavior under injected faults: transient failures consume budget
//! and then succeed without duplicating side effects; persistent failures
//! exhaust the budget and resolve the run as failed.

mod common;

use async_trait::async_trait;
use orderflow_core::actions::{ActionError, OrderActions};
use orderflow_core::events::EventPublisher;
use orderflow_core::execution::{ChaosInjector, FaultInjector};
use orderflow_core::models::event::event_types;
use orderflow_core::models::{DomainEvent, Payment};
use orderflow_core::state_machine::{
    FailureReason, OrderLifecycle, OrderState, RunOutcome, SignalInbox,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Deterministic injector: fails the first `failures` attempts of every
/// action, then passes. Tracks per-action attempt counts.
struct FailFirstAttempts {
    failures: u32,
    attempts: Mutex<HashMap<String, u32>>,
}

impl FailFirstAttempts {
    fn new(failures: u32) -> Self {
        Self {
            failures,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    fn attempts_for(&self, action: &str) -> u32 {
        self.attempts
            .lock()
            .unwrap()
            .get(action)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl FaultInjector for FailFirstAttempts {
    async fn inject(&self, action: &str) -> Result<(), ActionError> {
        let mut attempts = self.attempts.lock().unwrap();
        let count = attempts.entry(action.to_string()).or_insert(0);
        *count += 1;
        if *count <= self.failures {
            return Err(ActionError::Fault {
                action: action.to_string(),
                reason: "forced failure for testing".to_string(),
            });
        }
        Ok(())
    }
}

/// Fails every attempt of one action, passes everything else.
struct FailAction {
    action: &'static str,
    attempts: AtomicU32,
}

#[async_trait]
impl FaultInjector for FailAction {
    async fn inject(&self, action: &str) -> Result<(), ActionError> {
        if action == self.action {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            return Err(ActionError::Fault {
                action: action.to_string(),
                reason: "forced failure for testing".to_string(),
            });
        }
        Ok(())
    }
}

fn lifecycle_with(
    order_id: &str,
    db: &orderflow_core::Database,
    injector: Arc<dyn FaultInjector>,
    config: &orderflow_core::OrderFlowConfig,
) -> OrderLifecycle {
    OrderLifecycle::new(
        order_id,
        OrderActions::new(db.pool().clone(), injector),
        SignalInbox::new(),
        EventPublisher::default(),
        config.execution.clone(),
        config.timers.clone(),
    )
}

#[tokio::test]
async fn test_transient_faults_retried_to_completion_without_duplicates() {
    let (db, _dir) = common::test_database().await;
    let mut config = common::fast_config();
    // Budgets must cover one forced failure plus the real attempt.
    config.execution.receive_max_attempts = 3;
    config.execution.validate_max_attempts = 2;
    config.execution.charge_max_attempts = 3;
    config.execution.shipping_max_attempts = 2;

    let injector = Arc::new(FailFirstAttempts::new(1));
    let mut lifecycle = lifecycle_with("order-1", &db, injector.clone(), &config);

    let outcome = lifecycle
        .run("order-1", "payment-1", &common::sample_request())
        .await;
    assert!(outcome.is_completed(), "got {outcome:?}");

    // Each action failed once and then ran.
    for action in [
        "receive_order",
        "validate_order",
        "charge_payment",
        "start_shipping",
    ] {
        assert_eq!(injector.attempts_for(action), 2, "attempts for {action}");
    }

    // Retries never duplicated a committed side effect.
    let events = DomainEvent::list_for_order(db.pool(), "order-1")
        .await
        .unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(
        Payment::count_for_order(db.pool(), "order-1").await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_exhausted_charge_budget_fails_the_run() {
    let (db, _dir) = common::test_database().await;
    let config = common::fast_config();

    let injector = Arc::new(FailAction {
        action: "charge_payment",
        attempts: AtomicU32::new(0),
    });
    let mut lifecycle = lifecycle_with("order-1", &db, injector.clone(), &config);

    let outcome = lifecycle
        .run("order-1", "payment-1", &common::sample_request())
        .await;

    let RunOutcome::Failed { reason, detail } = outcome else {
        panic!("expected failed outcome, got {outcome:?}");
    };
    assert_eq!(reason, FailureReason::WorkflowError);
    assert!(detail.unwrap().contains("charge_payment"));
    assert_eq!(lifecycle.state(), OrderState::Failed);
    assert_eq!(
        injector.attempts.load(Ordering::SeqCst),
        config.execution.charge_max_attempts
    );

    // Earlier committed steps remain; no payment row exists.
    let events = DomainEvent::list_for_order(db.pool(), "order-1")
        .await
        .unwrap();
    let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(
        types,
        [event_types::ORDER_RECEIVED, event_types::ORDER_VALIDATED]
    );
    assert_eq!(
        Payment::count_for_order(db.pool(), "order-1").await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_stalled_action_cut_off_by_step_timeout() {
    /// Stalls long enough for the per-attempt timeout to fire every time.
    struct AlwaysStall;

    #[async_trait]
    impl FaultInjector for AlwaysStall {
        async fn inject(&self, _action: &str) -> Result<(), ActionError> {
            tokio::time::sleep(Duration::from_secs(300)).await;
            Ok(())
        }
    }

    let (db, _dir) = common::test_database().await;
    let mut config = common::fast_config();
    config.execution.step_timeout_ms = 50;
    config.execution.receive_max_attempts = 2;

    let mut lifecycle = lifecycle_with("order-1", &db, Arc::new(AlwaysStall), &config);
    let outcome = lifecycle
        .run("order-1", "payment-1", &common::sample_request())
        .await;

    let RunOutcome::Failed { reason, detail } = outcome else {
        panic!("expected failed outcome, got {outcome:?}");
    };
    assert_eq!(reason, FailureReason::WorkflowError);
    assert!(detail.unwrap().contains("timed out"));

    // The stalled attempts never reached storage.
    assert!(DomainEvent::list_for_order(db.pool(), "order-1")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_chaos_run_always_resolves_to_a_terminal_shape() {
    let (db, _dir) = common::test_database().await;
    let mut config = common::fast_config();
    config.execution.step_timeout_ms = 50;

    // Realistic chaos mix, scaled down so stalls hit the timeout quickly.
    let injector = Arc::new(ChaosInjector::new(0.33, 0.34, Duration::from_secs(300)));
    for i in 0..5 {
        let order_id = format!("order-{i}");
        let payment_id = format!("payment-{i}");
        let mut lifecycle = lifecycle_with(&order_id, &db, injector.clone(), &config);
        let outcome = lifecycle
            .run(&order_id, &payment_id, &common::sample_request())
            .await;
        // Whatever the dice said, the outcome is one of the three shapes
        // and the payment was charged at most once.
        assert!(matches!(
            outcome,
            RunOutcome::Completed { .. } | RunOutcome::Cancelled { .. } | RunOutcome::Failed { .. }
        ));
        assert!(
            Payment::count_for_order(db.pool(), &order_id)
                .await
                .unwrap()
                <= 1
        );
    }
}
