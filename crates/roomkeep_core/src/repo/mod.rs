//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define aggregate-oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Multi-statement writes run in one transaction per aggregate operation.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod room_repo;
