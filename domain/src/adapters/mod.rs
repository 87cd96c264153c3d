//! In-process adapters that live inside the domain crate for convenience.
//!
//! These back unit tests and local runs without a database. The SQLite
//! adapter lives in its own crate.

pub mod memory_repo;
