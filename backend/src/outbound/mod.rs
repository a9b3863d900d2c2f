//! Outbound adapters implementing the domain ports.
//!
//! - **persistence**: PostgreSQL-backed stores using Diesel
//! - **memory**: a process-local store for tests and embedding
//!
//! Adapters translate between domain types and storage representations.
//! They contain no business rules.

pub mod memory;
pub mod persistence;
