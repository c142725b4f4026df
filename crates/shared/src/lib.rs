//! Wire and domain types shared between the moderation panel client and its
//! tooling. Records mirror the backend's JSON shapes.

pub mod domain;
pub mod error;
pub mod protocol;

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod domain_tests;
