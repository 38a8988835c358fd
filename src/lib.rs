//! Inventory and sales ledger: products, persons, and sales kept in
//! pluggable record stores, with stock adjusted atomically by each sale.
//!
//! # Examples
//!
//! In-memory usage with [`core::inventory::Inventory`]:
//! ```
//! use std::sync::Arc;
//!
//! use stockbook::{
//!     core::inventory::Inventory,
//!     persist::memory::MemoryStore,
//!     record::{ProductDraft, SaleDraft},
//! };
//!
//! let inventory = Inventory::new(Arc::new(MemoryStore::new()));
//! inventory
//!     .products()
//!     .create(ProductDraft {
//!         name: "Apple".to_string(),
//!         stock: 10,
//!         origin: "Farm A".to_string(),
//!     })
//!     .expect("create product");
//!
//! let sale = inventory
//!     .sales()
//!     .create(SaleDraft {
//!         product: "Apple".to_string(),
//!         quantity: 3,
//!         client: None,
//!     })
//!     .expect("record sale");
//! assert_eq!(sale.client, "Sin nombre");
//! assert_eq!(inventory.products().find("Apple").map(|p| p.stock), Some(7));
//! ```
//!
//! Runtime usage over JSON files:
//! ```no_run
//! use stockbook::{
//!     config::StoreConfig,
//!     record::ProductDraft,
//!     runtime::handle::{RuntimeConfig, spawn_inventory},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let inventory = StoreConfig::from_env()
//!     .expect("config")
//!     .open_inventory()
//!     .expect("open store");
//! let handle = spawn_inventory(inventory, RuntimeConfig::default());
//! handle
//!     .create_product(ProductDraft {
//!         name: "Apple".to_string(),
//!         stock: 10,
//!         origin: "Farm A".to_string(),
//!     })
//!     .await
//!     .expect("create");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Request routing and outcome classification.
pub mod api;
/// Store selection and environment overrides.
pub mod config;
/// Product, person, and sales ledgers.
pub mod core;
/// Error taxonomy and status classes.
pub mod error;
/// Record store abstraction and backends.
pub mod persist;
/// Domain records and boundary payloads.
pub mod record;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Sales statistics.
pub mod stats;
/// Tracing subscriber setup.
pub mod telemetry;
/// Shared primitive types and date helpers.
pub mod types;
