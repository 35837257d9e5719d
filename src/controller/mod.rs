//! # Controller
//!
//! Core controller modules for the Telegraf sidecar controller.
//!
//! - `assembler`: Telegraf configuration document assembly
//! - `injector`: Sidecar injection policy and container building
//! - `reconciler`: Configuration secret reconciliation
//! - `server`: HTTP server for metrics, health checks and class reloads

pub mod assembler;
pub mod injector;
pub mod reconciler;
pub mod server;
