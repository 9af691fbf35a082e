//! Apply engine for kafka-admin
//!
//! 1. Planning - list the broker state and plan it against the definitions
//! 2. Diffing - show the aligned broker state against the definitions
//! 3. Executing - run the plan in check or apply mode

pub mod differ;
pub mod executor;

pub use executor::apply;
