//! Publication ledger.
//!
//! This crate provides:
//! - The `PublicationLedger` trait (membership check + idempotent insert)
//! - A Redis REST backend (Upstash-style HTTP API)
//! - A native Redis backend (`SISMEMBER` / `SADD`)
//! - An in-memory backend for tests and dry runs
//!
//! Membership check and insertion are separate calls with no atomic
//! check-and-set. Exclusivity between runs is provided by the scheduler
//! never running two pipelines against the same set at once.

pub mod config;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod metrics;
pub mod redis_store;
pub mod rest;

pub use config::LedgerConfig;
pub use error::{LedgerError, LedgerResult};
pub use ledger::{connect, PublicationLedger};
pub use memory::MemoryLedger;
pub use redis_store::RedisLedger;
pub use rest::RestLedger;
