//! Utility modules for the rsx compiler.

pub mod hash;
pub mod log;
