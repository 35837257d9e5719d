//! Telegraf Sidecar Controller Library
//!
//! This library provides the core functionality for the Telegraf Sidecar Controller:
//! the admission webhook that injects a Telegraf sidecar into annotated pods, and the
//! reconciler that renders each pod's Telegraf configuration into a secret.
//! Tests are included in the module files and under `tests/`.
//!
//! ## Quick Start
//!
//! ```rust
//! use telegraf_sidecar_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod advisory;
pub mod classdata;
pub mod config;
pub mod constants;
pub mod controller;
pub mod metadata;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod webhook;
