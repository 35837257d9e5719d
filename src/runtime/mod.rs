//! # Runtime
//!
//! Process wiring for the controller binary: startup, the pod watch loop and the
//! reconciliation error policy.

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
