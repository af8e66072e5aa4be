//! Instruction handlers

pub mod game;
pub mod records;
pub mod registry;

pub use game::*;
pub use records::*;
pub use registry::*;
