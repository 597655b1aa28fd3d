//! HTTP route handlers.

pub mod gate;
pub mod stats;
pub mod system;
