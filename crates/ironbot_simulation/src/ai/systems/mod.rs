//! Bot systems (FixedUpdate pipeline)

pub mod notifications;
pub mod tick;

// Re-export all systems
pub use notifications::*;
pub use tick::*;
