//! Public API for framediag.
//!
//! [`Diagnostics`](context::Diagnostics) owns all state; [`global`] holds
//! the process-wide instance used by the free functions and macros.

pub mod config;
pub mod context;
pub mod error_code;
pub mod global;
pub mod hooks;
pub mod platform;
pub mod reaction;
pub mod report;
pub mod thread_name;

#[cfg(test)]
pub(crate) mod test_support;
