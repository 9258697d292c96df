//! Command implementations.
//!
//! - [`contract`] - synthesize and print an entrypoint's type contract

pub mod contract;

pub use contract::execute as contract_execute;
