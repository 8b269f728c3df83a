//! Model-level fallback sequencing

mod coordinator;
mod types;


pub use coordinator::FallbackCoordinator;
pub use types::{FallbackRule, FallbackTrigger};
