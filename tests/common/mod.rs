//! Shared helpers for the integration suites: per-test temp-file databases
//! and canned order requests.

#![allow(dead_code)]

use orderflow_core::config::{DatabaseConfig, OrderFlowConfig};
use orderflow_core::models::{Address, LineItem, OrderRequest};
use orderflow_core::Database;
use tempfile::TempDir;

/// Open an initialized database in a fresh temp directory. The directory
/// guard must be kept alive for the duration of the test.
pub async fn test_database() -> (Database, TempDir) {
    let dir = TempDir::new().expect("create temp dir");
    let database = Database::connect_to_path(
        &dir.path().join("orderflow-test.db"),
        &DatabaseConfig::default(),
    )
    .await
    .expect("open test database");
    database.init_schema().await.expect("initialize schema");
    (database, dir)
}

/// Default configuration with timers and backoffs shrunk so a full lifecycle
/// runs in well under a second.
pub fn fast_config() -> OrderFlowConfig {
    let mut config = OrderFlowConfig::default();
    config.execution.step_timeout_ms = 1_000;
    config.execution.initial_backoff_ms = 1;
    config.execution.max_backoff_ms = 5;
    config.timers.manual_review_ms = 50;
    config.timers.payment_processing_delay_ms = 10;
    config.timers.shipping_setup_delay_ms = 10;
    config
}

pub fn sample_address() -> Address {
    Address {
        street: "123 Main St".to_string(),
        city: "San Francisco".to_string(),
        state: "CA".to_string(),
    }
}

pub fn request_with_items(items: Vec<LineItem>) -> OrderRequest {
    OrderRequest {
        customer_name: "John Doe".to_string(),
        customer_email: "john.doe@example.com".to_string(),
        items,
        shipping_address: sample_address(),
    }
}

/// Two line items, three units total; routes to the light carrier tier.
pub fn sample_request() -> OrderRequest {
    request_with_items(vec![
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
    ])
}

/// Six units total; routes to the heavy carrier tier.
pub fn heavy_request() -> OrderRequest {
    request_with_items(vec![LineItem {
        sku: "ANVIL-9".to_string(),
        quantity: 6,
        price: 119.00,
    }])
}

pub fn empty_request() -> OrderRequest {
    request_with_items(vec![])
}
