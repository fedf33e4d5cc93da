//! Utilities for exercising the harness against a live Postgres server.
//!
//! The utilities assume a local throwaway server reachable through the
//! `TESTS_DATABASE_*` environment variables. Each test provisions its own
//! uniquely named databases, so suites can run in parallel against the same
//! server.

pub mod database;
pub mod products;
