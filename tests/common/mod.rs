#![allow(dead_code)] // each harness binary uses a different subset
//! Shared test utilities for driftline integration harnesses.
//!
//! Import everything via `mod common; use common::*;` at the top of each
//! harness file. Corpora are deterministic static strings; builders write
//! them into tempdirs with the naming conventions the batch driver infers
//! metadata from.

pub mod assertions;
pub mod builders;
pub mod corpora;

pub use builders::*;
pub use corpora::*;
