//! Internal helpers.

pub(crate) mod demangle;
pub(crate) mod size;
pub(crate) mod text;
