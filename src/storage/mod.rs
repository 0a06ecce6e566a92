//! Health state storage
//!
//! ## Design
//!
//! - **Trait-based**: `StateStore` lets the in-memory store be swapped for a persistent one
//! - **Partitioned**: state is keyed by endpoint; writers of different endpoints never contend
//! - **Pure core**: the transition rules live in [`state::EndpointState`], free of locking
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use endpoint_monitor::clock::SystemClock;
//! use endpoint_monitor::storage::{MemoryStore, StateStore};
//!
//! # async fn example() {
//! let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new(Arc::new(SystemClock)));
//! let snapshot = store.snapshot().await;
//! # }
//! ```

pub mod backend;
pub mod memory;
pub mod state;

pub use backend::StateStore;
pub use memory::MemoryStore;
pub use state::{EndpointState, HISTORY_LIMIT};
