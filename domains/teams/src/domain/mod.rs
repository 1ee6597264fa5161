//! Domain layer: entities, roles, and the invitation state machine

pub mod entities;
pub mod state;

pub use entities::*;
pub use state::*;
