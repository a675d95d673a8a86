//! Feature modules: vertical slices of state + rendering logic.

pub mod replay;
pub mod transcript;
