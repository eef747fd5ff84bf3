//! Outbound adapters implementing the driven ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel.
//! - **identity**: HS256 JWT bearer verification.
//! - **memory**: transactional in-memory store for local runs and tests.
//!
//! Adapters translate between domain types and infrastructure
//! representations; ledger, ordering and cascade rules stay in the domain.

pub mod identity;
pub mod memory;
pub mod persistence;
