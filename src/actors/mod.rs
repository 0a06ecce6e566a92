//! Actor-based scheduling
//!
//! The scheduler runs as an independent async task and is controlled through a
//! [`SchedulerHandle`](scheduler::SchedulerHandle) over a Tokio mpsc channel.
//!
//! ## Architecture Overview
//!
//! ```text
//!   Handle (binary, API) ──command──▶ SchedulerActor ──sweep──▶ JoinSet of checks
//!                        ◀─oneshot──                               │
//!                                                 Prober → StateStore → AlertManager
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: mpsc command channel for control messages
//! 2. **Request/Response**: oneshot channels carrying the outcome of each command

pub mod messages;
pub mod scheduler;
