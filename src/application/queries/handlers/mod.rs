//! Query Handlers 实现

mod version_handlers;

pub use version_handlers::*;
