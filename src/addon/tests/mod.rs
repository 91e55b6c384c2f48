//! Addon Lifecycle Tests
//!
//! Scenario tests for the registry, resolver and manager over recording mock hooks.




#[cfg(test)]
pub mod manager_tests;
