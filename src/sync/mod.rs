//! Locks and counters shared by the diagnostics structures.

pub(crate) mod counter;
pub(crate) mod mutex;
