//! Engagement and escrow core for a freelance marketplace.
//!
//! Takes a client's project from open through proposal acceptance,
//! milestone-based escrow funding and final payout, keeping an append-only
//! transaction ledger consistent and notifying the affected parties along
//! the way. Transport-agnostic: the service structs are the operation
//! surface, and every operation takes the resolved [`auth::Principal`]
//! explicitly.
//!
//! Milestone and proposal state transitions are compare-and-swap updates at
//! the persistence boundary, so concurrent calls on the same row resolve to
//! exactly one winner. Notifications ride a bounded best-effort queue and
//! can never fail a primary mutation.

pub mod auth;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod service;

pub use auth::{Principal, authorize};
pub use config::Config;
pub use db::Database;
pub use dispatch::{Dispatcher, NotificationDraft};
pub use error::{Error, Result};
pub use service::{EscrowService, NotificationService, ProjectService, ProposalService};
