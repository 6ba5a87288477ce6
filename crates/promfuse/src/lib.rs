//! Top-level facade crate for promfuse.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use promfuse_core::*;
}

pub mod gateway {
    pub use promfuse_gateway::*;
}
