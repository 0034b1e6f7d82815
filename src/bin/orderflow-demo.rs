//! End-to-end demo: runs three order lifecycles against a scratch database
//! and prints their outcomes: one completed (with the shipping sub-process
//! run to delivery), one failing validation, and one cancelled mid-review.

use anyhow::Result;
use orderflow_core::config::ConfigManager;
use orderflow_core::models::{Address, DomainEvent, LineItem, OrderRequest};
use orderflow_core::state_machine::RunOutcome;
use orderflow_core::{Database, Orchestrator, SignalKind};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn sample_request(items: Vec<LineItem>) -> OrderRequest {
    OrderRequest {
        customer_name: "John Doe".to_string(),
        customer_email: "john.doe@example.com".to_string(),
        items,
        shipping_address: Address {
            street: "123 Main St".to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    orderflow_core::logging::init_structured_logging();

    let mut config = ConfigManager::load()?.config().clone();
    // Scratch database; rerunning the demo starts clean.
    let db_path = std::env::temp_dir().join("orderflow-demo.db");
    let _ = std::fs::remove_file(&db_path);
    config.database.filename = db_path.display().to_string();
    // Short review window so the demo finishes quickly.
    config.timers.manual_review_ms = 1_000;
    let config = Arc::new(config);

    let database = Database::connect(&config.database).await?;
    database.init_schema().await?;
    let orchestrator = Orchestrator::new(database, config);

    // Scenario 1: a well-formed order runs to completion, then ships.
    let items = vec![
        LineItem {
            sku: "WIDGET-1".to_string(),
            quantity: 2,
            price: 29.99,
        },
        LineItem {
            sku: "GADGET-7".to_string(),
            quantity: 1,
            price: 49.99,
        },
    ];
    orchestrator.start_order("order-1", "payment-1", sample_request(items.clone()))?;
    let outcome = orchestrator.wait("order-1").await?;
    println!("order-1: {}", serde_json::to_string_pretty(&outcome)?);

    if matches!(outcome, RunOutcome::Completed { .. }) {
        orchestrator.start_shipping("order-1", items)?;
        let shipping = orchestrator.wait_for_shipping("order-1").await?;
        println!("order-1 shipping: {}", serde_json::to_string_pretty(&shipping)?);
    }

    let events = DomainEvent::list_for_order(orchestrator.database().pool(), "order-1").await?;
    println!("order-1 event log:");
    for event in &events {
        println!("  {:>3} {}", event.id, event.event_type);
    }

    // Scenario 2: an order with no line items fails validation.
    orchestrator.start_order("order-2", "payment-2", sample_request(vec![]))?;
    let outcome = orchestrator.wait("order-2").await?;
    println!("order-2: {}", serde_json::to_string_pretty(&outcome)?);

    // Scenario 3: a cancel signal lands during the review window.
    orchestrator.start_order(
        "order-3",
        "payment-3",
        sample_request(vec![LineItem {
            sku: "WIDGET-1".to_string(),
            quantity: 1,
            price: 29.99,
        }]),
    )?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    orchestrator.signal(
        "order-3",
        SignalKind::CancelOrder,
        json!({ "requested_by": "customer" }),
    )?;
    let outcome = orchestrator.wait("order-3").await?;
    println!("order-3: {}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
