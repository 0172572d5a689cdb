//! Scripts for deploying and provisioning the Overlay contracts.
//!
//! Deployment is driven by a [`plan::DeploymentPlan`] executed by the
//! [`orchestrator::Orchestrator`], which records every confirmed contract in
//! a [`registry::ContractRegistry`] so that runs are resumable and repeated
//! runs send nothing.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod chain;
pub mod cli;
mod commands;
pub mod config;
pub mod constants;
pub mod errors;
pub mod orchestrator;
pub mod overlay;
pub mod plan;
pub mod registry;
pub mod roles;
pub mod solidity;
pub mod types;
pub mod utils;
