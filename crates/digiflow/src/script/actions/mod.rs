//! Script action handlers, grouped by the entity they act on.

pub mod export;
pub mod filesystem;
pub mod process;
pub mod steps;
pub mod users;
