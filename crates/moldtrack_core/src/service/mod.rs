//! Inventory use-case services.
//!
//! # Responsibility
//! - Orchestrate catalog, search and repository calls into front-end APIs.
//! - Keep the CLI decoupled from storage details.

pub mod action_service;
pub mod lookup_service;
