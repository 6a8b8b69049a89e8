//! Process-lifetime data structures behind the diagnostics context.
//!
//! Nothing here knows about the platform or the application; the context in
//! `api::context` wires these together and supplies the collaborators.

pub(crate) mod activity_log;
pub(crate) mod latch;
pub(crate) mod message;
pub(crate) mod symbols;
pub(crate) mod tag_filter;
