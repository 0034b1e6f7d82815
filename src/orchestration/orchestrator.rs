//! Run registry and entry points.
//!
//! One `Orchestrator` per process. `start_order` spawns an order lifecycle
//! run on the runtime and registers its signal inbox; `start_shipping`
//! attaches the shipping sub-process to an existing run so both observe the
//! same inbox. Signals delivered through [`Orchestrator::signal`] merge into
//! that inbox and take effect at the run's next checkpoint.

use crate::actions::{OrderActions, ShippingActions};
use crate::config::OrderFlowConfig;
use crate::database::Database;
use crate::error::{OrderFlowError, Result};
use crate::events::EventPublisher;
use crate::execution::{ChaosInjector, FaultInjector, NoopInjector};
use crate::models::{LineItem, OrderRequest};
use crate::state_machine::{
    OrderLifecycle, RunOutcome, ShippingLifecycle, ShippingOutcome, SignalInbox, SignalKind,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument};

/// Coarse run status reported to callers. `outcome` is present once the run
/// has reached a terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct RunStatus {
    pub order_id: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub outcome: Option<RunOutcome>,
}

/// Terminal result of a run together with when it resolved.
#[derive(Debug, Clone)]
struct Resolved {
    outcome: RunOutcome,
    closed_at: DateTime<Utc>,
}

struct RunHandle {
    inbox: SignalInbox,
    started_at: DateTime<Utc>,
    order_rx: watch::Receiver<Option<Resolved>>,
    shipping_rx: Option<watch::Receiver<Option<ShippingOutcome>>>,
}

pub struct Orchestrator {
    database: Database,
    config: Arc<OrderFlowConfig>,
    publisher: EventPublisher,
    injector: Arc<dyn FaultInjector>,
    runs: DashMap<String, RunHandle>,
}

impl Orchestrator {
    /// Build an orchestrator over an initialized database. The fault
    /// injector follows configuration: chaos when enabled, noop otherwise.
    pub fn new(database: Database, config: Arc<OrderFlowConfig>) -> Self {
        let injector: Arc<dyn FaultInjector> = if config.fault_injection.enabled {
            Arc::new(ChaosInjector::from_config(&config.fault_injection))
        } else {
            Arc::new(NoopInjector)
        };
        Self::with_injector(database, config, injector)
    }

    /// Build an orchestrator with an explicit fault injector.
    pub fn with_injector(
        database: Database,
        config: Arc<OrderFlowConfig>,
        injector: Arc<dyn FaultInjector>,
    ) -> Self {
        Self {
            database,
            config,
            publisher: EventPublisher::default(),
            injector,
            runs: DashMap::new(),
        }
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Start an order lifecycle run. The order id keys both the run registry
    /// and the receive step's idempotency check, so at most one run per
    /// order id may be in flight.
    #[instrument(skip(self, request))]
    pub fn start_order(
        &self,
        order_id: &str,
        payment_id: &str,
        request: OrderRequest,
    ) -> Result<()> {
        if self.runs.contains_key(order_id) {
            return Err(OrderFlowError::DuplicateRun(order_id.to_string()));
        }

        let inbox = SignalInbox::new();
        let (tx, rx) = watch::channel(None);

        let mut lifecycle = OrderLifecycle::new(
            order_id,
            OrderActions::new(self.database.pool().clone(), self.injector.clone()),
            inbox.clone(),
            self.publisher.clone(),
            self.config.execution.clone(),
            self.config.timers.clone(),
        );
        let order_id_owned = order_id.to_string();
        let payment_id_owned = payment_id.to_string();
        tokio::spawn(async move {
            let outcome = lifecycle
                .run(&order_id_owned, &payment_id_owned, &request)
                .await;
            let _ = tx.send(Some(Resolved {
                outcome,
                closed_at: Utc::now(),
            }));
        });

        self.runs.insert(
            order_id.to_string(),
            RunHandle {
                inbox,
                started_at: Utc::now(),
                order_rx: rx,
                shipping_rx: None,
            },
        );
        info!(order_id, "order run registered");
        Ok(())
    }

    /// Start the shipping sub-process for a registered run. Shares the run's
    /// inbox so a `cancel_shipping` signal reaches its checkpoints.
    #[instrument(skip(self, items))]
    pub fn start_shipping(&self, order_id: &str, items: Vec<LineItem>) -> Result<()> {
        let mut handle = self
            .runs
            .get_mut(order_id)
            .ok_or_else(|| OrderFlowError::UnknownRun(order_id.to_string()))?;
        if handle.shipping_rx.is_some() {
            return Err(OrderFlowError::Orchestration(format!(
                "shipping already started for order {order_id}"
            )));
        }

        let (tx, rx) = watch::channel(None);
        let mut lifecycle = ShippingLifecycle::new(
            order_id,
            ShippingActions::new(self.database.pool().clone(), self.injector.clone()),
            handle.inbox.clone(),
            self.publisher.clone(),
            self.config.execution.clone(),
        );
        let order_id_owned = order_id.to_string();
        tokio::spawn(async move {
            let outcome = lifecycle.run(&order_id_owned, &items).await;
            let _ = tx.send(Some(outcome));
        });

        handle.shipping_rx = Some(rx);
        info!(order_id, "shipping run registered");
        Ok(())
    }

    /// Deliver a signal to a run's inbox. Last write wins per signal kind;
    /// the run observes it at its next checkpoint.
    pub fn signal(&self, order_id: &str, kind: SignalKind, payload: Value) -> Result<()> {
        let handle = self
            .runs
            .get(order_id)
            .ok_or_else(|| OrderFlowError::UnknownRun(order_id.to_string()))?;
        handle.inbox.deliver(kind, payload);
        Ok(())
    }

    /// Current status of a run: `running` until the lifecycle resolves, then
    /// the outcome's own label.
    pub fn status(&self, order_id: &str) -> Result<RunStatus> {
        let handle = self
            .runs
            .get(order_id)
            .ok_or_else(|| OrderFlowError::UnknownRun(order_id.to_string()))?;
        let resolved = handle.order_rx.borrow().clone();
        let status = resolved
            .as_ref()
            .map(|r| r.outcome.status_label().to_string())
            .unwrap_or_else(|| "running".to_string());
        Ok(RunStatus {
            order_id: order_id.to_string(),
            status,
            started_at: handle.started_at,
            closed_at: resolved.as_ref().map(|r| r.closed_at),
            outcome: resolved.map(|r| r.outcome),
        })
    }

    /// Await a run's terminal outcome.
    pub async fn wait(&self, order_id: &str) -> Result<RunOutcome> {
        let mut rx = {
            let handle = self
                .runs
                .get(order_id)
                .ok_or_else(|| OrderFlowError::UnknownRun(order_id.to_string()))?;
            handle.order_rx.clone()
        };
        let resolved = rx
            .wait_for(|resolved| resolved.is_some())
            .await
            .map_err(|_| {
                OrderFlowError::Orchestration(format!("run for order {order_id} was dropped"))
            })?
            .clone();
        // wait_for only resolves on Some
        resolved.map(|r| r.outcome).ok_or_else(|| {
            OrderFlowError::Orchestration(format!("run for order {order_id} resolved empty"))
        })
    }

    /// Await the shipping sub-process outcome for a run.
    pub async fn wait_for_shipping(&self, order_id: &str) -> Result<ShippingOutcome> {
        let mut rx = {
            let handle = self
                .runs
                .get(order_id)
                .ok_or_else(|| OrderFlowError::UnknownRun(order_id.to_string()))?;
            handle.shipping_rx.clone().ok_or_else(|| {
                OrderFlowError::Orchestration(format!(
                    "shipping not started for order {order_id}"
                ))
            })?
        };
        let outcome = rx
            .wait_for(|outcome| outcome.is_some())
            .await
            .map_err(|_| {
                OrderFlowError::Orchestration(format!(
                    "shipping run for order {order_id} was dropped"
                ))
            })?
            .clone();
        outcome.ok_or_else(|| {
            OrderFlowError::Orchestration(format!(
                "shipping run for order {order_id} resolved empty"
            ))
        })
    }

    /// Drop a finished run from the registry. Storage is untouched; the
    /// order and its event log remain queryable.
    pub fn forget(&self, order_id: &str) -> bool {
        self.runs.remove(order_id).is_some()
    }
}
