//! Test harness for the provisioning scripts: an in-memory chain and helpers
//! for running plans against it

pub mod utils;
